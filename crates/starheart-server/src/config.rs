//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use starheart_core::{ProgressionRule, RetentionPolicy};
use starheart_types::policy::PasswordPolicy;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub progression: ProgressionRule,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Replaces the built-in finale phrases when set.
    #[serde(default)]
    pub password_phrases: Option<Vec<String>>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./client/dist")
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("starheart")
        .join("progress.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            db_path: default_db_path(),
            progression: ProgressionRule::default(),
            retention: RetentionPolicy::default(),
            password_phrases: None,
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from config/default.toml or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        match &self.password_phrases {
            Some(phrases) => PasswordPolicy::from_phrases(phrases),
            None => PasswordPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.progression, ProgressionRule::Lenient);
        assert_eq!(config.retention, RetentionPolicy::default());
        assert!(config.password_phrases.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            host = "127.0.0.1"
            port = 9000
            db_path = "/tmp/story.db"
            progression = "strict"
            password_phrases = ["Starlight"]

            [retention]
            max_age_days = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/story.db"));
        assert_eq!(config.progression, ProgressionRule::Strict);
        assert_eq!(config.retention.max_age_days, 0);
        assert_eq!(config.retention.sweep_interval_secs, 3600);
        assert!(config.password_policy().accepts("by starlight"));
        assert!(!config.password_policy().accepts("i love you"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "port = 7070\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.port, 7070);
    }

    #[test]
    fn test_unknown_progression_rule_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(r#"progression = "chaotic""#);
        assert!(result.is_err());
    }
}
