use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NoteError, Result};

/// Default config filename, looked up in the working directory.
pub const CONFIG_FILE: &str = "notedown.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL prepended to relative image/video paths during compilation.
    pub asset_host: String,
}

impl Config {
    /// Load config from a `notedown.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NoteError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents).map_err(|e| NoteError::ConfigInvalid {
            message: e.to_string(),
        })?;
        // Normalize so URL joining always inserts exactly one slash.
        config.asset_host = config.asset_host.trim_end_matches('/').to_string();
        Ok(config)
    }
}
