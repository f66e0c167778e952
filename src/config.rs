use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Remote endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the remote store
    pub base_url: String,
    /// Project API key sent with every request
    pub api_key: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
        }
    }
}

impl RemoteConfig {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Read(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::Parse(path.clone(), e))?;
        }

        // Apply environment variable overrides
        if let Ok(base_url) = std::env::var("FORMSYNC_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(api_key) = std::env::var("FORMSYNC_API_KEY") {
            config.api_key = api_key;
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/formsync/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("formsync")
            .join("config.yaml")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config file '{0}': {1}")]
    Parse(PathBuf, serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RemoteConfig::default();
        assert_eq!(config.base_url, "http://localhost:54321");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_load_no_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = RemoteConfig::load(Some(config_path)).unwrap();
        assert_eq!(config.base_url, "http://localhost:54321");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "base_url: https://project.example.co").unwrap();
        writeln!(file, "api_key: service-role-key").unwrap();

        let config = RemoteConfig::load(Some(config_path)).unwrap();
        assert_eq!(config.base_url, "https://project.example.co");
        assert_eq!(config.api_key, "service-role-key");
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_key: fromfile").unwrap();

        // Set env var
        std::env::set_var("FORMSYNC_API_KEY", "fromenv");

        let config = RemoteConfig::load(Some(config_path)).unwrap();
        assert_eq!(config.api_key, "fromenv");

        // Clean up
        std::env::remove_var("FORMSYNC_API_KEY");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = RemoteConfig::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
