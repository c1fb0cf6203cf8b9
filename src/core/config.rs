//! Runtime configuration.
//!
//! Resolution order, lowest to highest: built-in defaults, `rollcall.toml`
//! in the working directory, `ROLLCALL_*` environment variables, then
//! command-line flags (applied by the caller).

use crate::core::error::RollcallError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "rollcall.toml";
pub const ENV_DB: &str = "ROLLCALL_DB";
pub const ENV_ACTOR: &str = "ROLLCALL_ACTOR";
pub const ENV_TRACE: &str = "ROLLCALL_TRACE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the register.
    pub database: PathBuf,
    /// Default file offered by the bulk loader.
    pub mock_data: PathBuf,
    pub delimiter: char,
    /// Append one JSON line per store operation to `broker.events.jsonl`.
    pub audit: bool,
    pub actor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(schemas::STUDENT_DB_NAME),
            mock_data: PathBuf::from("mockdata.csv"),
            delimiter: ',',
            audit: true,
            actor: "rollcall".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, RollcallError> {
        let config: Config =
            toml::from_str(content).map_err(|e| RollcallError::ConfigError(e.to_string()))?;
        if config.delimiter == '"' || config.delimiter == '\n' {
            return Err(RollcallError::ConfigError(format!(
                "unusable delimiter {:?}",
                config.delimiter
            )));
        }
        Ok(config)
    }

    /// Applies `ROLLCALL_DB` / `ROLLCALL_ACTOR` when set and non-empty.
    pub fn apply_env(mut self) -> Self {
        if let Some(db) = env_non_empty(ENV_DB) {
            self.database = PathBuf::from(db);
        }
        if let Some(actor) = env_non_empty(ENV_ACTOR) {
            self.actor = actor;
        }
        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load `rollcall.toml` from `dir`. A missing file is not an error.
pub fn load_config(dir: &Path) -> Result<Config, RollcallError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&config_path).map_err(RollcallError::IoError)?;
    Config::from_toml_str(&content)
}

pub fn trace_enabled() -> bool {
    std::env::var(ENV_TRACE).ok().as_deref() == Some("1")
}
