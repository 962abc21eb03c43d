use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::RosterError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("besiktas_roster/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client(timeout: Duration) -> Result<Client, RosterError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| RosterError::Transport(format!("failed to build http client: {err}")))
}
