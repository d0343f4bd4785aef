use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use skyvestments_market_data::provider::coflnet::DEFAULT_BASE_URL;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_CATALOG_DIR: &str = "./NotEnoughUpdates-REPO/items";
const DEFAULT_PRICE_REFRESH_SECS: u64 = 30 * 60;
const DEFAULT_CATALOG_REFRESH_SECS: u64 = 24 * 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub coflnet_url: String,
    pub price_refresh_interval: Duration,
    pub catalog_refresh_interval: Duration,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("SV_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse()
            .expect("Invalid SV_LISTEN_ADDR");
        let cors_allow = env_or("SV_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let log_format = env_or("SV_LOG_FORMAT", "text")
            .parse()
            .unwrap_or(LogFormat::Text);

        Self {
            listen_addr,
            data_dir: env_or("SV_DATA_DIR", DEFAULT_DATA_DIR).into(),
            catalog_dir: env_or("SV_CATALOG_DIR", DEFAULT_CATALOG_DIR).into(),
            coflnet_url: env_or("SV_COFLNET_URL", DEFAULT_BASE_URL),
            price_refresh_interval: Duration::from_secs(env_u64(
                "SV_PRICE_REFRESH_SECS",
                DEFAULT_PRICE_REFRESH_SECS,
            )),
            catalog_refresh_interval: Duration::from_secs(env_u64(
                "SV_CATALOG_REFRESH_SECS",
                DEFAULT_CATALOG_REFRESH_SECS,
            )),
            cors_allow,
            request_timeout: Duration::from_millis(env_u64(
                "SV_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            log_format,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_dir: DEFAULT_DATA_DIR.into(),
            catalog_dir: DEFAULT_CATALOG_DIR.into(),
            coflnet_url: DEFAULT_BASE_URL.to_string(),
            price_refresh_interval: Duration::from_secs(DEFAULT_PRICE_REFRESH_SECS),
            catalog_refresh_interval: Duration::from_secs(DEFAULT_CATALOG_REFRESH_SECS),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            log_format: LogFormat::Text,
        }
    }
}
