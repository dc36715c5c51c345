// src/config.rs

//! Configuration loading utilities.
//!
//! Resolves the storage directory layout and reads platform credentials
//! from the environment.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::Credentials;

pub const CONFIG_FILE: &str = "config.toml";
pub const CURSOR_DIR: &str = "cursor";

pub const ENV_USERNAME: &str = "REDDIT_USERNAME";
pub const ENV_PASSWORD: &str = "REDDIT_PASSWORD";
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";

/// `<storage_dir>/config.toml`
pub fn config_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(CONFIG_FILE)
}

/// `<storage_dir>/cursor`
pub fn cursor_dir(storage_dir: &Path) -> PathBuf {
    storage_dir.join(CURSOR_DIR)
}

/// Load and validate the configuration, falling back to defaults when the
/// file is missing or unreadable.
pub fn load_config(storage_dir: &Path) -> Result<Config> {
    let config = Config::load_or_default(config_path(storage_dir));
    config.validate()?;
    Ok(config)
}

/// Read credentials from the process environment.
pub fn credentials_from_env() -> Result<Credentials> {
    credentials_from(|key| env::var(key).ok())
}

/// Read credentials through `lookup`, reporting every missing variable.
pub fn credentials_from<F>(lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let mut read = |key: &'static str| match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value,
        None => {
            missing.push(key);
            String::new()
        }
    };

    let credentials = Credentials {
        username: read(ENV_USERNAME),
        password: read(ENV_PASSWORD),
        client_id: read(ENV_CLIENT_ID),
        client_secret: read(ENV_CLIENT_SECRET),
    };

    if !missing.is_empty() {
        return Err(AppError::config(format!(
            "missing credentials: {}",
            missing.join(", ")
        )));
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_storage_layout() {
        let root = Path::new("storage");
        assert_eq!(config_path(root), Path::new("storage/config.toml"));
        assert_eq!(cursor_dir(root), Path::new("storage/cursor"));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_USERNAME, "bot"),
            (ENV_PASSWORD, "pw"),
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
        ]
        .into_iter()
        .collect();

        let credentials = credentials_from(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(credentials.username, "bot");
        assert_eq!(credentials.client_secret, "secret");
    }

    #[test]
    fn test_missing_credentials_are_listed() {
        let err = credentials_from(|key| (key == ENV_USERNAME).then(|| "bot".to_string()))
            .unwrap_err();
        let message = err.to_string();

        assert!(message.contains(ENV_PASSWORD));
        assert!(message.contains(ENV_CLIENT_SECRET));
        assert!(!message.contains(ENV_USERNAME));
    }

    #[test]
    fn test_load_config_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            config_path(temp_dir.path()),
            "[communities]\nsource = \"OldSchoolCool\"\ntarget = \"OldSchoolCoolRevisited\"\n",
        )
        .unwrap();

        let config = load_config(temp_dir.path()).unwrap();
        assert_eq!(config.communities.target, "OldSchoolCoolRevisited");
        assert_eq!(config.harvest.cooldown_secs, 7200);
    }

    #[test]
    fn test_load_config_without_communities_is_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(temp_dir.path()),
            Err(AppError::Validation(_))
        ));
    }
}
