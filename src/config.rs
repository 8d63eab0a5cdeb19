// Market configuration, loaded from the environment (and `.env` when present)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::Identity;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";
pub const DEFAULT_STATE_PATH: &str = "data/state.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Administrator identity, fixed for the lifetime of the market
    pub admin: Identity,
    /// Betting closes this long after the market is created. `None` keeps
    /// betting open until each question resolves.
    pub betting_window: Option<Duration>,
    pub bind_addr: SocketAddr,
    pub state_path: PathBuf,
    pub log_level: String,
}

impl MarketConfig {
    pub fn new(admin: impl Into<Identity>) -> Self {
        Self {
            admin: admin.into(),
            betting_window: None,
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 1234))),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    pub fn with_betting_window(mut self, window: Duration) -> Self {
        self.betting_window = Some(window);
        self
    }

    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let admin = std::env::var("MARKET_ADMIN")
            .map_err(|_| "MARKET_ADMIN not set".to_string())?;
        if admin.trim().is_empty() {
            return Err("MARKET_ADMIN is empty".to_string());
        }

        let mut config = Self::new(admin.trim());

        if let Ok(secs) = std::env::var("MARKET_BETTING_WINDOW_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| format!("Invalid MARKET_BETTING_WINDOW_SECS '{}': {}", secs, e))?;
            config.betting_window = Some(Duration::from_secs(secs));
        }

        if let Ok(addr) = std::env::var("MARKET_BIND_ADDR") {
            config.bind_addr = addr
                .trim()
                .parse()
                .map_err(|e| format!("Invalid MARKET_BIND_ADDR '{}': {}", addr, e))?;
        }

        if let Ok(path) = std::env::var("MARKET_STATE_PATH") {
            config.state_path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("MARKET_LOG_LEVEL") {
            config.log_level = level.trim().to_lowercase();
        }

        Ok(config)
    }

    /// Level for the tracing subscriber, falls back to INFO on unknown input
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
