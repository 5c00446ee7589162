//! Configuration management for the approval workflow

use serde::{Deserialize, Serialize};
use crate::constants;
use crate::error::{WorkflowError, Result};
use std::path::{Path, PathBuf};

/// Environment prefix for layered configuration, e.g. `APPROVALS__STORAGE__DATA_DIR`
pub const ENV_PREFIX: &str = "APPROVALS";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkflowConfig {
    pub storage: StorageConfig,
    pub reference_numbers: ReferenceNumberConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(alias = "data_root")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceNumberConfig {
    pub training_prefix: String,
}

impl Default for ReferenceNumberConfig {
    fn default() -> Self {
        Self {
            training_prefix: constants::DEFAULT_TRAINING_REFERENCE_PREFIX.to_string(),
        }
    }
}

/// Where workflow notifications are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSink {
    #[default]
    Log,
    File,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationConfig {
    pub sink: NotificationSink,
}

impl WorkflowConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WorkflowError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Layer an optional config file (any format the `config` crate understands)
    /// under `APPROVALS__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let config: Self = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WorkflowError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(WorkflowError::Config("Storage data_dir is required".to_string()));
        }

        let prefix = self.reference_numbers.training_prefix.trim();
        if prefix.is_empty() || prefix.contains('/') {
            return Err(WorkflowError::Config(
                "Training reference prefix must be non-empty and contain no '/'".to_string()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = WorkflowConfig::from_json_str("{}").unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from(constants::DEFAULT_DATA_DIR));
        assert_eq!(config.reference_numbers.training_prefix, "TRN");
        assert_eq!(config.notifications.sink, NotificationSink::Log);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "storage": { "data_root": "/srv/approvals" },
            "reference_numbers": { "training_prefix": "LATIHAN" },
            "notifications": { "sink": "file" }
        }"#;

        let config = WorkflowConfig::from_json_str(json).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/approvals"));
        assert_eq!(config.reference_numbers.training_prefix, "LATIHAN");
        assert_eq!(config.notifications.sink, NotificationSink::File);
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let json = r#"{ "reference_numbers": { "training_prefix": "A/B" } }"#;
        let err = WorkflowConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, WorkflowError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("approvals.json");
        std::fs::write(&path, r#"{ "notifications": { "sink": "none" } }"#).unwrap();

        let config = WorkflowConfig::load(Some(&path)).unwrap();
        assert_eq!(config.notifications.sink, NotificationSink::None);
        assert_eq!(config.reference_numbers.training_prefix, "TRN");
    }
}
