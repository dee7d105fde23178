//! Server configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server listening port
    /// Env: SD_PORT
    /// Default: 8080
    pub port: u16,

    /// Server listening address
    /// Env: SD_HOST
    /// Default: "0.0.0.0"
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080, host: "0.0.0.0".to_string() }
    }
}

impl ServerConfig {
    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(port) = env::var("SD_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }

        if let Ok(host) = env::var("SD_HOST") {
            self.host = host;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("Invalid port: port must be between 1 and 65535");
        }

        if self.host.is_empty() {
            bail!("Invalid host: host cannot be empty");
        }

        Ok(())
    }
}
