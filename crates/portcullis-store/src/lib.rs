//! # portcullis-store
//!
//! The storage adapter the authentication core depends on.
//!
//! [`Store`] is the contract: single-record atomic operations, with every
//! tenant-owned read or mutation evaluated under an explicit
//! [`TenantScope`](portcullis_core::TenantScope). [`MemoryStore`] is the
//! in-process implementation used by the server and the tests.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::Store;
