//! Config file resolution for the server binary.

use portcullis_core::PortcullisConfig;
use portcullis_core::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE};
use std::env;
use std::path::PathBuf;

/// `--config` flag, else `PORTCULLIS_CONFIG`, else `portcullis.toml`.
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config; a missing file yields defaults.
pub fn load_config(flag: Option<PathBuf>) -> anyhow::Result<PortcullisConfig> {
    let path = resolve_config_path(flag);
    let config = PortcullisConfig::load_or_default(&path)?;
    tracing::info!(path = %path.display(), bind = %config.server.bind, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/etc/portcullis/custom.toml")));
        assert_eq!(path, PathBuf::from("/etc/portcullis/custom.toml"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.auth.user_tokens_are_admin);
    }

    #[test]
    fn test_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portcullis.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"127.0.0.1:9000\"\n\n[auth]\nuser_token_lifetime = \"1h\"\n",
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.auth.user_token_lifetime, "1h");
    }
}
