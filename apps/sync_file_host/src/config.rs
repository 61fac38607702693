use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use sync_file::adapters::JsRuntimeConfig;

/// Host configuration, read from an optional JSON file
///
/// ```json
/// {
///   "log_level": "debug",
///   "runtime": { "script_id": "boot", "base_dir": "./data", "auto_install": true }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JavaScript runtime settings
    #[serde(default)]
    pub runtime: JsRuntimeConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            runtime: JsRuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in '{}': {}", path.display(), e))
    }
}
