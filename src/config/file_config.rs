//! Reading and writing `scholar-lens.toml`.
//!
//! [`load_config`](super::load_config) is the normal entry point and also
//! applies environment overrides. This module handles the plain file: writing
//! a starter configuration for `scholar-lens init` and reading one back
//! without environment layering.
//!
//! # Configuration File Format
//!
//! ```toml
//! [provider]
//! kind = "gemini"              # or "relay"
//! api_key_env = "GEMINI_API_KEY"
//! model = "gemini-2.5-flash"
//! base_url = "https://generativelanguage.googleapis.com/v1beta"
//! # relay_url = "https://example.netlify.app/.netlify/functions/generate"
//! timeout_secs = 120
//! temperature = 0.2
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 1000
//! # attempt_timeout_secs = 60
//!
//! [analysis]
//! join_policy = "partial"      # or "all-or-nothing"
//!
//! [logging]
//! level = "info"
//! # format = "json"
//! ```

use std::path::Path;

use super::Config;

/// Load a configuration file without environment overrides
pub fn read_config_file(path: &Path) -> Result<Config, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
}

/// Write `config` as TOML, refusing to overwrite an existing file unless `force`
pub fn write_config_file(config: &Config, path: &Path, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{0} already exists (use --force to overwrite)")]
    Exists(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scholar-lens.toml");

        let mut config = Config::default();
        config.provider.model = "gemini-2.5-pro".to_string();
        config.retry.initial_delay_ms = 500;

        write_config_file(&config, &path, false).unwrap();

        let loaded = read_config_file(&path).unwrap();
        assert_eq!(loaded.provider.model, "gemini-2.5-pro");
        assert_eq!(loaded.provider.kind, ProviderKind::Gemini);
        assert_eq!(loaded.retry.initial_delay_ms, 500);
        assert!(loaded.provider.api_key.is_none());
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scholar-lens.toml");
        std::fs::write(&path, "").unwrap();

        let result = write_config_file(&Config::default(), &path, false);
        assert!(matches!(result, Err(ConfigFileError::Exists(_))));

        assert!(write_config_file(&Config::default(), &path, true).is_ok());
    }

    #[test]
    fn test_config_file_nonexistent() {
        let result = read_config_file(Path::new("/nonexistent/scholar-lens.toml"));
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(matches!(read_config_file(&path), Err(ConfigFileError::Parse(_))));
    }
}
