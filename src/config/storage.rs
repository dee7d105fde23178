//! Storage configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory served and written by the HTTP endpoint
    /// Env: SD_UPLOAD_DIR
    /// Default: "Upload"
    pub upload_dir: PathBuf,

    /// File the visitor registry is loaded from and saved to
    /// Env: SD_VISITORS_FILE
    /// Default: "visitors.json"
    pub visitors_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("Upload"),
            visitors_file: PathBuf::from("visitors.json"),
        }
    }
}

impl StorageConfig {
    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(dir) = env::var("SD_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }

        if let Ok(file) = env::var("SD_VISITORS_FILE") {
            self.visitors_file = PathBuf::from(file);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.upload_dir.as_os_str().is_empty() {
            bail!("Invalid upload_dir: path cannot be empty");
        }

        if self.visitors_file.as_os_str().is_empty() {
            bail!("Invalid visitors_file: path cannot be empty");
        }

        Ok(())
    }
}
