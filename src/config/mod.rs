mod file_config;

pub use file_config::FileConfig;

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CONTENT_CACHE_AGE_SEC: usize = 60;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub bind_address: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            logging_level: RequestsLoggingLevel::default(),
            content_cache_age_sec: DEFAULT_CONTENT_CACHE_AGE_SEC,
            frontend_dir_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        // The file itself is created on first run, its directory must exist.
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        Ok(Self {
            db_path,
            bind_address,
            port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            bind_address: self.bind_address.clone(),
            port: self.port,
            content_cache_age_sec: self.content_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("music_log.db");
        let cli = CliConfig {
            db_path: Some(db_path.clone()),
            port: 5000,
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/frontend".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, db_path);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.port, 5000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.content_cache_age_sec, DEFAULT_CONTENT_CACHE_AGE_SEC);
        assert_eq!(config.frontend_dir_path, Some("/frontend".to_string()));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden.db")),
            ..Default::default()
        };
        let toml_db_path = temp_dir.path().join("from_toml.db");
        let file_config = FileConfig {
            db_path: Some(toml_db_path.to_string_lossy().to_string()),
            bind_address: Some("0.0.0.0".to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();
        assert_eq!(config.db_path, toml_db_path);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.content_cache_age_sec, DEFAULT_CONTENT_CACHE_AGE_SEC);
    }

    #[test]
    fn test_invalid_toml_logging_level_falls_back_to_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("music_log.db")),
            logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let file_config = FileConfig {
            logging_level: Some("verbose".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();
        assert_eq!(config.logging_level, RequestsLoggingLevel::None);
    }

    #[test]
    fn test_resolve_requires_db_path() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_rejects_missing_db_directory() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/nonexistent/dir/music_log.db")),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_load_file_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "db_path = \"/data/music_log.db\"").unwrap();
        writeln!(file, "port = 8080").unwrap();
        writeln!(file, "content_cache_age_sec = 10").unwrap();

        let loaded = FileConfig::load(&config_path).unwrap();
        assert_eq!(loaded.db_path.as_deref(), Some("/data/music_log.db"));
        assert_eq!(loaded.port, Some(8080));
        assert_eq!(loaded.content_cache_age_sec, Some(10));
        assert!(loaded.frontend_dir_path.is_none());

        std::fs::write(&config_path, "port = \"not a number\"").unwrap();
        assert!(FileConfig::load(&config_path).is_err());
    }
}
