use crate::models::config_model::ReaderConfig;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;

static CONFIG_CACHE: OnceLock<ReaderConfig> = OnceLock::new();
static CONFIG_SOURCE: OnceLock<Option<PathBuf>> = OnceLock::new();

pub const CONFIG_ENV: &str = "OUTB_READER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "outb_reader.json";

/// Loads the config once: `$OUTB_READER_CONFIG`, else `outb_reader.json`
/// when present, else defaults.
pub async fn init_config() -> Result<&'static ReaderConfig, String> {
    let path = config_path();

    let config = match &path {
        Some(path) => load_config(path).await?,
        None => ReaderConfig::default(),
    };

    CONFIG_SOURCE
        .set(path)
        .map_err(|_| "Config source already initialized".to_string())?;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(get_cached_config())
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.is_file().then_some(default)
}

pub async fn load_config(file_path: &Path) -> Result<ReaderConfig, String> {
    let data = fs::read_to_string(file_path)
        .await
        .map_err(|e| format!("File read Error: {e} {}", file_path.display()))?;

    serde_json::from_str(&data).map_err(|e| format!("JSON Parse Error: {e}"))
}

pub fn get_cached_config() -> &'static ReaderConfig {
    CONFIG_CACHE.get().expect("Config not initialized")
}

pub fn get_config_source() -> Option<&'static Path> {
    CONFIG_SOURCE.get().and_then(|path| path.as_deref())
}
