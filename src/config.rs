use anyhow::Result;
use std::path::PathBuf;

/// Runtime configuration, read once from the environment at startup and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Enables diagnostic screenshots at fixed checkpoints.
    pub debug: bool,
    pub screenshots_dir: PathBuf,
    pub database_path: String,
    pub rates_base_url: String,
    /// When set, the whole cycle repeats on this interval instead of
    /// running once.
    pub check_interval_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            screenshots_dir: PathBuf::from("screenshots"),
            database_path: "price_monitor.db".to_string(),
            rates_base_url: "https://dolarapi.com".to_string(),
            check_interval_seconds: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Config::default();

        let debug = std::env::var("DEBUG")
            .map(|value| value.to_lowercase() == "true")
            .unwrap_or(defaults.debug);

        let screenshots_dir = std::env::var("SCREENSHOTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.screenshots_dir);

        let database_path = std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path);

        let rates_base_url = std::env::var("DOLAR_API_URL").unwrap_or(defaults.rates_base_url);

        let check_interval_seconds = std::env::var("CHECK_INTERVAL_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());

        Ok(Config {
            debug,
            screenshots_dir,
            database_path,
            rates_base_url,
            check_interval_seconds,
        })
    }
}
