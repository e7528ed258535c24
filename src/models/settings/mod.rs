// Settings module
// Application configuration read from config.toml

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Blob key the event collection is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "savedEvents";

/// Configuration problems detected after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("storage key cannot be empty")]
    EmptyStorageKey,
    #[error("widget timeline step must be at least one minute")]
    ZeroTimelineStep,
    #[error("widget timeline must allow at least one entry")]
    ZeroTimelineEntries,
    #[error("refresh interval must be at least one second")]
    ZeroRefreshInterval,
}

/// Where the event blob lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Single SQLite file with a key/value table
    #[default]
    Sqlite,
    /// One JSON file per key inside the data directory
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Overrides the platform data directory when set
    pub data_dir: Option<PathBuf>,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// How often `watch` re-reads the saved events
    pub refresh_interval_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub timeline_step_minutes: u32,
    pub timeline_max_entries: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            timeline_step_minutes: 1,
            timeline_max_entries: 1440,
        }
    }
}

/// Top-level configuration. Every section is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
    pub widget: WidgetConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.widget.timeline_step_minutes == 0 {
            return Err(ConfigError::ZeroTimelineStep);
        }
        if self.widget.timeline_max_entries == 0 {
            return Err(ConfigError::ZeroTimelineEntries);
        }
        if self.notifications.refresh_interval_seconds == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }
}
