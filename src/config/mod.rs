//! Configuration system for stashd
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Command line flags** - applied by the binary
//! 2. **Environment variables** (`SD_*`) - via [`StashConfig::apply_env_vars`]
//! 3. **Defaults** - lowest priority
//!
//! # Example
//!
//! ```
//! use stashd::config::StashConfig;
//!
//! let mut config = StashConfig::default();
//! config.apply_env_vars();
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod limits;
pub mod server;
pub mod storage;

pub use limits::LimitsConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Complete stashd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StashConfig {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
}

impl StashConfig {
    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.server.apply_env_vars();
        self.limits.apply_env_vars();
        self.storage.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.limits.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}
