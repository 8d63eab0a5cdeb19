// Application state management

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::MarketConfig;
use crate::market::{MarketSnapshot, PredictionMarket};

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    pub market: PredictionMarket,
    pub config: MarketConfig,
}

impl AppState {
    /// Fresh market, ignoring anything persisted
    pub fn new(config: MarketConfig) -> Self {
        let market = PredictionMarket::new(&config);
        Self { market, config }
    }

    /// Restore from `config.state_path` when a snapshot exists, otherwise start fresh.
    ///
    /// A snapshot that exists but cannot be read or parsed is an error: the
    /// caller must not start an empty market that would overwrite it on save.
    pub fn load_or_new(config: MarketConfig) -> Result<Self, String> {
        match Self::load_from_disk(&config.state_path)? {
            Some(market) => {
                if market.admin() != &config.admin {
                    warn!(
                        persisted = %market.admin(),
                        configured = %config.admin,
                        "persisted admin differs from MARKET_ADMIN, keeping persisted admin"
                    );
                }
                info!(path = %config.state_path.display(), "loaded persisted market state");
                Ok(Self { market, config })
            }
            None => {
                info!(path = %config.state_path.display(), "no persisted state, starting fresh");
                Ok(Self::new(config))
            }
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn save_to_disk(&self) -> Result<(), String> {
        let path = &self.config.state_path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }

        let json = serde_json::to_string_pretty(&self.market.snapshot())
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        fs::write(path, json)
            .map_err(|e| format!("Failed to write state file {}: {}", path.display(), e))?;

        info!(path = %path.display(), "market state saved");
        Ok(())
    }

    /// `Ok(None)` only when there is no state file at all
    fn load_from_disk(path: &Path) -> Result<Option<PredictionMarket>, String> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("Failed to read {}: {}", path.display(), e)),
        };

        let snapshot: MarketSnapshot = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to deserialize state {}: {}", path.display(), e))?;

        Ok(Some(PredictionMarket::restore(snapshot)))
    }
}
