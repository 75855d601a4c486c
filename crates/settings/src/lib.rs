pub mod config;
pub mod paths;

pub use config::{AssistantConfig, Config, ConfigError, ConfigStore, LoggingConfig, StorageConfig};
pub use paths::{resolve_data_dir, CONFIG_FILE, DATA_DIR_ENV, DEFAULT_DATA_DIR};
