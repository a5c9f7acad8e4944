use std::path::PathBuf;

pub const CONFIG_ENV: &str = "DEPLOYHOOK_CONFIG";

pub fn config_dir() -> PathBuf {
    PathBuf::from("/etc/deployhook")
}

/// Path of the TOML config file, `$DEPLOYHOOK_CONFIG` when set
pub fn global_config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.toml"),
    }
}
