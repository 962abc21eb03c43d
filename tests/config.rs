use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use besiktas_roster::config::Config;

fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_use_home_data_dir() {
    let config = config_from(&[("HOME", "/home/fan")]).expect("config");
    assert_eq!(config.roster_url, None);
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(
        config.favorites_path,
        PathBuf::from("/home/fan/.local/share/besiktas_roster/favorites.json")
    );
    assert_eq!(config.log_filter, "info");
    assert_eq!(
        config.log_path(),
        PathBuf::from("/home/fan/.local/share/besiktas_roster/besiktas_roster.log")
    );
}

#[test]
fn explicit_values_win() {
    let config = config_from(&[
        ("HOME", "/home/fan"),
        ("XDG_DATA_HOME", "/data"),
        ("ROSTER_URL", "  https://example.com/players.json "),
        ("ROSTER_TIMEOUT_SECS", "30"),
        ("ROSTER_LOG", "besiktas_roster=debug"),
    ])
    .expect("config");
    assert_eq!(
        config.roster_url.as_deref(),
        Some("https://example.com/players.json")
    );
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(
        config.favorites_path,
        PathBuf::from("/data/besiktas_roster/favorites.json")
    );
    assert_eq!(config.log_filter, "besiktas_roster=debug");

    let config = config_from(&[("FAVORITES_PATH", "/tmp/favs.json")]).expect("config");
    assert_eq!(config.favorites_path, PathBuf::from("/tmp/favs.json"));
}

#[test]
fn timeout_is_clamped_and_garbage_ignored() {
    let config = config_from(&[("HOME", "/h"), ("ROSTER_TIMEOUT_SECS", "0")]).expect("config");
    assert_eq!(config.request_timeout, Duration::from_secs(1));
    let config =
        config_from(&[("HOME", "/h"), ("ROSTER_TIMEOUT_SECS", "9999")]).expect("config");
    assert_eq!(config.request_timeout, Duration::from_secs(120));
    let config =
        config_from(&[("HOME", "/h"), ("ROSTER_TIMEOUT_SECS", "soon")]).expect("config");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
}

#[test]
fn blank_values_count_as_unset() {
    let config = config_from(&[("HOME", "/h"), ("ROSTER_URL", "   ")]).expect("config");
    assert!(config.roster_url.is_none());
}

#[test]
fn no_storage_location_is_an_error() {
    assert!(config_from(&[]).is_err());
}
