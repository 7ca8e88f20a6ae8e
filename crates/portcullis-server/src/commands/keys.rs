//! `portcullis-server keys generate`: create a token signing keypair.

use portcullis_core::config::keys::{DEFAULT_PRIVATE_KEY_ENV, DEFAULT_PUBLIC_KEY_ENV};
use portcullis_token::KeyPair;
use std::fs;
use std::path::PathBuf;

/// Generate a keypair and write it to `output`, or print it.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate()?;

    let Some(output_dir) = output else {
        println!("Private key:");
        println!("{}", keypair.private_key_hex());
        println!();
        println!("Public key:");
        println!("{}", keypair.public_key_hex());
        return Ok(());
    };

    fs::create_dir_all(&output_dir)?;
    let private_path = output_dir.join("private.key");
    let public_path = output_dir.join("public.key");
    keypair.save_to_files(&private_path, &public_path)?;

    println!("Wrote {} and {}", private_path.display(), public_path.display());
    println!("  export {DEFAULT_PRIVATE_KEY_ENV}=$(cat {})", private_path.display());
    println!("  export {DEFAULT_PUBLIC_KEY_ENV}=$(cat {})", public_path.display());
    Ok(())
}
