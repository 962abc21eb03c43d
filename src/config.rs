use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::http_client::DEFAULT_TIMEOUT_SECS;

pub const APP_DIR: &str = "besiktas_roster";
const FAVORITES_FILE: &str = "favorites.json";
const LOG_FILE: &str = "besiktas_roster.log";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub roster_url: Option<String>,
    pub request_timeout: Duration,
    pub favorites_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Reads `.env.local` and `.env` first, then the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        let roster_url = var("ROSTER_URL").map(|val| val.trim().to_string());
        let timeout_secs = var("ROSTER_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);

        let favorites_path = if let Some(path) = var("FAVORITES_PATH") {
            PathBuf::from(path)
        } else if let Some(base) = var("XDG_DATA_HOME") {
            PathBuf::from(base).join(APP_DIR).join(FAVORITES_FILE)
        } else if let Some(home) = var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(APP_DIR)
                .join(FAVORITES_FILE)
        } else {
            bail!("cannot locate favorites storage: set FAVORITES_PATH or HOME");
        };

        let log_filter = var("ROSTER_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            roster_url,
            request_timeout: Duration::from_secs(timeout_secs),
            favorites_path,
            log_filter,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.favorites_path.with_file_name(LOG_FILE)
    }
}
