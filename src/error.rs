use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a roster fetch did not produce a player list.
///
/// Observers never see this type; the loader collapses it into
/// [`LoadState::Failure`](crate::LoadState::Failure) via [`RosterError::display_message`].
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("no roster source configured")]
    NotConfigured,
    #[error("request timed out")]
    Timeout,
    #[error("http {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid roster json: {0}")]
    Parse(String),
}

impl RosterError {
    pub fn display_message(&self) -> String {
        match self {
            RosterError::NotConfigured => "No roster source is configured.".to_string(),
            RosterError::Timeout => {
                "The roster server took too long to respond. Please try again.".to_string()
            }
            RosterError::Status(code) => {
                format!("The roster server returned an error (HTTP {code}).")
            }
            RosterError::Transport(_) => {
                "Could not reach the roster server. Check your connection and try again."
                    .to_string()
            }
            RosterError::Parse(_) => "The roster data could not be read.".to_string(),
        }
    }
}

impl From<reqwest::Error> for RosterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RosterError::Timeout;
        }
        if let Some(status) = err.status() {
            return RosterError::Status(status.as_u16());
        }
        if err.is_decode() {
            return RosterError::Parse(err.to_string());
        }
        RosterError::Transport(err.to_string())
    }
}

/// A durable write or read of the favorites set failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
