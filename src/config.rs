// src/config.rs
use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

/// Runtime configuration, read once at startup from the environment
/// (`.env` supported via dotenv) and passed by reference everywhere.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub host: String,
    pub port: u16,
    /// How many top-volume instruments make up the universe.
    pub top_n: usize,
    /// Settlement asset suffix used to filter the ticker list.
    pub quote_asset: String,
    pub series_ttl: Duration,
    pub snapshot_ttl: Duration,
    pub batch_size: usize,
    pub inter_group_delay: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            top_n: 1000,
            quote_asset: "USDT".to_string(),
            series_ttl: Duration::from_secs(5 * 60),
            snapshot_ttl: Duration::from_secs(60),
            batch_size: 10,
            inter_group_delay: Duration::from_millis(500),
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl ScannerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("SCANNER_HOST").unwrap_or(defaults.host),
            port: env_parse("SCANNER_PORT", defaults.port),
            top_n: env_parse("SCANNER_TOP_N", defaults.top_n),
            quote_asset: env::var("SCANNER_QUOTE_ASSET").unwrap_or(defaults.quote_asset),
            series_ttl: Duration::from_secs(env_parse(
                "SCANNER_SERIES_TTL_SECS",
                defaults.series_ttl.as_secs(),
            )),
            snapshot_ttl: Duration::from_secs(env_parse(
                "SCANNER_SNAPSHOT_TTL_SECS",
                defaults.snapshot_ttl.as_secs(),
            )),
            batch_size: env_parse("SCANNER_BATCH_SIZE", defaults.batch_size).max(1),
            inter_group_delay: Duration::from_millis(env_parse(
                "SCANNER_INTER_GROUP_DELAY_MS",
                defaults.inter_group_delay.as_millis() as u64,
            )),
            max_retries: env_parse("SCANNER_MAX_RETRIES", defaults.max_retries),
            base_delay: Duration::from_millis(env_parse(
                "SCANNER_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
        }
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ [CONFIG] {} has unparseable value {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
