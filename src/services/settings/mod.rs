// Settings module
// Loading and saving config.toml and resolving the data directory

mod service;

pub use service::{default_config_path, resolve_data_dir, ConfigService, CONFIG_FILE_NAME};
