use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::settings::AppConfig;

pub const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "EventCountdown", "EventCountdown")
}

/// `config.toml` inside the platform config directory, or the current
/// directory when no home directory can be resolved.
pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        dirs.config_dir().join(CONFIG_FILE_NAME)
    } else {
        log::warn!("Unable to resolve project directory; using current dir for config");
        PathBuf::from(CONFIG_FILE_NAME)
    }
}

/// Directory holding the event blob: the configured override, else the
/// platform data directory, else the current directory.
pub fn resolve_data_dir(config: &AppConfig) -> PathBuf {
    if let Some(dir) = &config.storage.data_dir {
        return dir.clone();
    }
    if let Some(dirs) = project_dirs() {
        dirs.data_dir().to_path_buf()
    } else {
        log::warn!("Unable to resolve project directory; using current dir for data");
        PathBuf::from(".")
    }
}

/// Reads and writes the TOML configuration file.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_default_path() -> Self {
        Self::new(default_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration. A missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            log::info!(
                "No config at {}; using defaults",
                self.path.display()
            );
            return Ok(AppConfig::default());
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config {}", self.path.display()))?;
        let config: AppConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", self.path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow!("Invalid config {}: {}", self.path.display(), e))?;

        log::info!("Loaded config from {}", self.path.display());
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid config: {}", e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write config {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::StorageBackend;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::new(dir.path().join("config.toml"));
        assert_eq!(service.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::new(dir.path().join("nested").join("config.toml"));

        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::File;
        config.storage.data_dir = Some(dir.path().join("data"));
        config.notifications.enabled = false;
        service.save(&config).unwrap();

        assert_eq!(service.load().unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage\nkey = ").unwrap();

        let err = ConfigService::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[widget]\ntimeline_step_minutes = 0\n").unwrap();

        let err = ConfigService::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(PathBuf::from("/tmp/countdown-data"));
        assert_eq!(resolve_data_dir(&config), PathBuf::from("/tmp/countdown-data"));
    }

    #[test]
    fn test_default_config_path_file_name() {
        assert!(default_config_path().ends_with(CONFIG_FILE_NAME));
    }
}
