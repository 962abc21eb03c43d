use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::RosterError;
use crate::http_client::{build_http_client, DEFAULT_TIMEOUT_SECS};
use crate::player::Player;
use crate::roster::RosterSource;

/// Fetches the roster with a single GET against a JSON endpoint.
#[derive(Debug)]
pub struct HttpRosterSource {
    url: Option<String>,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl HttpRosterSource {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.as_deref().and_then(non_empty).map(str::to_string),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: OnceCell::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl RosterSource for HttpRosterSource {
    fn fetch(&self) -> Result<String, RosterError> {
        let Some(url) = self.url.as_deref() else {
            return Err(RosterError::NotConfigured);
        };
        // Built lazily so it lives on the fetch thread, not the UI thread.
        let client = self
            .client
            .get_or_try_init(|| build_http_client(self.timeout))?;

        debug!(%url, "requesting roster");
        let resp = client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RosterError::Status(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

/// Parses a roster payload into players, in feed order.
///
/// Accepts a JSON array or an object keyed by record, both read in document order.
/// Empty and `null` payloads are an empty roster. Records without an id are
/// skipped; unreadable optional fields become `None`. A repeated id replaces
/// the earlier record's data in its original slot.
pub fn parse_roster_json(raw: &str) -> Result<Vec<Player>, RosterError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let root: Value =
        serde_json::from_str(trimmed).map_err(|err| RosterError::Parse(err.to_string()))?;
    let records: Vec<&Value> = match &root {
        Value::Array(items) => items.iter().collect(),
        // Document order; serde_json is built with `preserve_order`.
        Value::Object(map) => map.values().collect(),
        other => {
            return Err(RosterError::Parse(format!(
                "expected a list of players, found {}",
                json_kind(other)
            )));
        }
    };

    let mut players: Vec<Player> = Vec::with_capacity(records.len());
    let mut slots: HashMap<String, usize> = HashMap::new();
    for (index, record) in records.into_iter().enumerate() {
        if record.is_null() {
            continue;
        }
        let Some(player) = record.as_object().and_then(player_from_object) else {
            warn!(index, "skipping roster record without an id");
            continue;
        };
        if let Some(&slot) = slots.get(&player.id) {
            debug!(id = %player.id, "duplicate roster id, keeping latest record");
            players[slot] = player;
        } else {
            slots.insert(player.id.clone(), players.len());
            players.push(player);
        }
    }
    Ok(players)
}

fn player_from_object(obj: &Map<String, Value>) -> Option<Player> {
    let id = pick_string(obj, &["id"])?;
    Some(Player {
        id,
        name: pick_string(obj, &["name"]),
        image: pick_string(obj, &["image", "imageUrl"]),
        position: pick_string(obj, &["position"]),
        nationality: pick_string(obj, &["nationality"]),
        birth_date: pick_string(obj, &["birthDate", "birth_date"]),
        foot: pick_string(obj, &["foot"]),
        body: pick_string(obj, &["body"]),
        market_value: pick_string(obj, &["marketValue", "market_value"]),
    })
}

fn pick_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(as_string)
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
