use std::env;
use std::path::PathBuf;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "CODEHUB_HOME";

/// Data directory used when neither a flag nor the environment names one.
pub const DEFAULT_DATA_DIR: &str = ".codehub";

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// 解析資料夾位置：旗標優先，其次環境變數，最後預設值。 / Picks the explicit path, then `CODEHUB_HOME`, then `./.codehub`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            env::var_os(DATA_DIR_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}
