//! Configuration loading and validation.
//!
//! Configuration lives in a YAML file (`config/config.yaml` by default).
//! Every field has a default, so a missing section (or an empty file) still
//! yields a usable config. Unknown keys are tolerated. The backend kind is
//! kept as a plain string and validated by the data-source factory, which is
//! the only place that branches on it.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Error type returned when a config file cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for the expected shape.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server settings.
    pub app: ServerConfig,
    /// Data-source settings.
    pub data_source: DataSourceConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
        }
    }
}

/// Settings consumed by the data-source factory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    /// Backend kind: `sqlite` or `excel`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Options for the sqlite backend.
    pub sqlite: SqliteConfig,
    /// Options for the excel backend.
    pub excel: ExcelConfig,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: "sqlite".to_string(),
            sqlite: SqliteConfig::default(),
            excel: ExcelConfig::default(),
        }
    }
}

/// Options for the sqlite backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path of the database file.
    pub db_path: String,
    /// Bootstrap the database from the source workbook when the database
    /// file does not exist yet.
    pub create_tables_from_excel: bool,
    /// Path of the source workbook used for the bootstrap.
    pub excel_file: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: "my_database.db".to_string(),
            create_tables_from_excel: false,
            excel_file: "example.xlsx".to_string(),
        }
    }
}

/// Options for the excel backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExcelConfig {
    /// Path of the workbook to serve from.
    pub file_name: String,
}

impl Default for ExcelConfig {
    fn default() -> Self {
        Self {
            file_name: "example.xlsx".to_string(),
        }
    }
}

/// Load and validate the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config = serde_yaml::from_str(&raw)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.data_source.kind, "sqlite");
        assert_eq!(config.data_source.sqlite.db_path, "my_database.db");
        assert!(!config.data_source.sqlite.create_tables_from_excel);
        assert_eq!(config.data_source.sqlite.excel_file, "example.xlsx");
        assert_eq!(config.data_source.excel.file_name, "example.xlsx");
        assert_eq!(config.app.port, 5000);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "
data_source:
  type: excel
  excel:
    file_name: data/regional.xlsx
";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.data_source.kind, "excel");
        assert_eq!(config.data_source.excel.file_name, "data/regional.xlsx");
        // Untouched sections keep their defaults.
        assert_eq!(config.data_source.sqlite.db_path, "my_database.db");
        assert_eq!(config.app.host, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let yaml = "
app:
  secret_key: not-used-here
  port: 8080
";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.port, 8080);
    }
}
