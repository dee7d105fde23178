//! Rate limiting configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Sliding window length in seconds
    /// Env: SD_RATE_WINDOW_SECS
    /// Default: 60
    pub window_secs: u64,

    /// Maximum requests allowed per IP within one window before a
    /// permanent ban
    /// Env: SD_RATE_LIMIT
    /// Default: 100
    pub max_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { window_secs: 60, max_requests: 100 }
    }
}

impl LimitsConfig {
    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(window) = env::var("SD_RATE_WINDOW_SECS") {
            if let Ok(w) = window.parse() {
                self.window_secs = w;
            }
        }

        if let Ok(limit) = env::var("SD_RATE_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.max_requests = l;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            bail!("Invalid window_secs: must be greater than 0");
        }

        if self.max_requests == 0 {
            bail!("Invalid max_requests: must be greater than 0");
        }

        Ok(())
    }
}
