//! # Client Configuration
//!
//! Configuration management for the stock-take client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKTAKE_API_URL=https://backoffice.example.com/api               │
//! │     STOCKTAKE_API_TOKEN=...                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stocktake-client/client.toml (Linux)                     │
//! │     ~/Library/Application Support/com.stocktake.client/client.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000/api, 300ms settle delay, 8 parallel writes   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! base_url = "https://backoffice.example.com/api"
//! api_token = "secret"
//! timeout_secs = 30
//!
//! [session]
//! settle_delay_ms = 300
//! bulk_concurrency = 8
//! redirect_delay_ms = 1500
//!
//! [context]
//! outlet_id = "outlet-1"
//! shift_id = "shift-9"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Backend Settings
// =============================================================================

/// Where the inventory backend lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL; endpoint paths are appended (`{base}/stock-takes/...`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// Timing and fan-out of the reconciliation flow.
///
/// ## Settle Delay
/// ```text
/// PATCH count ──► wait settle_delay ──► GET items (full reload)
/// ```
/// The backend recomputes derived fields after a write; the short wait
/// keeps the reload from reading them half-updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Wait between a count write and the ledger reload (milliseconds).
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Maximum concurrent requests of a bulk operation.
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,

    /// Delay before a frontend navigates away after completion (milliseconds).
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_ms: u64,
}

fn default_settle_delay() -> u64 {
    300
}

fn default_bulk_concurrency() -> usize {
    8
}

fn default_redirect_delay() -> u64 {
    1500
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            settle_delay_ms: default_settle_delay(),
            bulk_concurrency: default_bulk_concurrency(),
            redirect_delay_ms: default_redirect_delay(),
        }
    }
}

impl SessionSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

// =============================================================================
// Session Context
// =============================================================================

/// Ambient back-office context the flow runs in.
///
/// Read-only once the controller is built; passed in explicitly instead of
/// being read from global state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Outlet the operator is working in.
    #[serde(default)]
    pub outlet_id: Option<String>,

    /// Active cash shift, if any.
    #[serde(default)]
    pub shift_id: Option<String>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub context: SessionContext,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.backend.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.session.bulk_concurrency == 0 {
            return Err(ClientError::InvalidConfig(
                "bulk_concurrency must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("STOCKTAKE_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Ok(token) = std::env::var("STOCKTAKE_API_TOKEN") {
            self.backend.api_token = Some(token);
        }

        if let Ok(secs) = std::env::var("STOCKTAKE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.backend.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid STOCKTAKE_TIMEOUT_SECS"),
            }
        }

        if let Ok(ms) = std::env::var("STOCKTAKE_SETTLE_DELAY_MS") {
            match ms.parse::<u64>() {
                Ok(v) => self.session.settle_delay_ms = v,
                Err(_) => warn!(value = %ms, "Ignoring invalid STOCKTAKE_SETTLE_DELAY_MS"),
            }
        }

        if let Ok(n) = std::env::var("STOCKTAKE_BULK_CONCURRENCY") {
            match n.parse::<usize>() {
                Ok(v) => self.session.bulk_concurrency = v,
                Err(_) => warn!(value = %n, "Ignoring invalid STOCKTAKE_BULK_CONCURRENCY"),
            }
        }

        if let Ok(outlet) = std::env::var("STOCKTAKE_OUTLET_ID") {
            self.context.outlet_id = Some(outlet);
        }

        if let Ok(shift) = std::env::var("STOCKTAKE_SHIFT_ID") {
            self.context.shift_id = Some(shift);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stocktake", "client")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}
