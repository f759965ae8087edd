use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AppError;

/// File name of the session store inside the per-user config directory.
pub const STORE_FILE_NAME: &str = "cli-config.ini";

/// Runtime settings, layered from defaults and `ALPHADB_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Explicit store location; falls back to [`default_store_path`].
    pub config_path: Option<PathBuf>,
    pub loglevel: String,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: None,
            loglevel: "warn".to_string(),
            debug: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("ALPHADB_"))
            .extract()?;
        Ok(settings)
    }

    pub fn store_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(default_store_path)
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &str {
        if self.debug { "debug" } else { &self.loglevel }
    }
}

/// `~/.config/alphadb/cli-config.ini` on Unix-like systems, `config.ini` elsewhere.
pub fn default_store_path() -> PathBuf {
    if cfg!(unix)
        && let Some(home) = dirs::home_dir()
    {
        return home.join(".config").join("alphadb").join(STORE_FILE_NAME);
    }
    PathBuf::from("config.ini")
}
