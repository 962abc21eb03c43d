use std::fs;
use std::path::PathBuf;

use besiktas_roster::RosterError;
use besiktas_roster::roster_fetch::parse_roster_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_roster_fixture_in_feed_order() {
    let raw = read_fixture("roster.json");
    let players = parse_roster_json(&raw).expect("fixture should parse");
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["10", "1", "9"]);

    let gedson = &players[0];
    assert_eq!(gedson.name.as_deref(), Some("Gedson Fernandes"));
    assert_eq!(
        gedson.image.as_deref(),
        Some("https://cdn.example.com/players/10.jpg")
    );
    assert_eq!(gedson.birth_date.as_deref(), Some("09.01.1999"));
    assert_eq!(gedson.body.as_deref(), Some("1,84 m / 74 kg"));
    assert_eq!(gedson.market_value.as_deref(), Some("18,00 mil. €"));

    let ciro = &players[2];
    assert_eq!(ciro.position.as_deref(), Some("Centre-Forward"));
    assert!(ciro.image.is_none());
    assert!(ciro.birth_date.is_none());
    assert!(ciro.foot.is_none());
    assert!(ciro.market_value.is_none());
}

#[test]
fn empty_array_is_empty_roster() {
    assert!(parse_roster_json("[]").expect("empty list").is_empty());
}

#[test]
fn null_and_blank_bodies_are_empty_roster() {
    assert!(parse_roster_json("null").expect("null").is_empty());
    assert!(parse_roster_json("  \n").expect("blank").is_empty());
}

#[test]
fn bad_optional_fields_do_not_abort_parse() {
    let raw = read_fixture("roster_messy.json");
    let players = parse_roster_json(&raw).expect("messy fixture should parse");
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "7", "8"]);

    let four = &players[0];
    assert!(four.name.is_none());
    assert_eq!(four.display_name(), "Unknown Player");
    assert!(four.position.is_none());
    assert!(four.nationality.is_none());
    assert_eq!(four.birth_date.as_deref(), Some("19990101"));
    assert!(four.foot.is_none());
    assert!(four.market_value.is_none());
}

#[test]
fn duplicate_ids_keep_first_slot_with_latest_data() {
    let raw = read_fixture("roster_messy.json");
    let players = parse_roster_json(&raw).expect("messy fixture should parse");
    let seven = &players[1];
    assert_eq!(seven.id, "7");
    assert_eq!(seven.name.as_deref(), Some("New Record"));
    assert!(seven.position.is_none());
}

#[test]
fn keyed_object_payload_keeps_document_order() {
    let raw = r#"{
        "b": { "id": "2", "name": "Second" },
        "a": { "id": "1", "name": "First" }
    }"#;
    let players = parse_roster_json(raw).expect("keyed payload should parse");
    let names: Vec<&str> = players.iter().map(|p| p.display_name()).collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[test]
fn numeric_keyed_payload_is_not_string_sorted() {
    let records: Vec<String> = (0..12)
        .map(|n| format!(r#""{n}": {{ "id": "p{n}" }}"#))
        .collect();
    let raw = format!("{{{}}}", records.join(","));
    let players = parse_roster_json(&raw).expect("keyed payload should parse");
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    let expected: Vec<String> = (0..12).map(|n| format!("p{n}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn malformed_json_is_parse_error() {
    let err = parse_roster_json("[{\"id\": \"1\",").unwrap_err();
    assert!(matches!(err, RosterError::Parse(_)));
    assert!(!err.display_message().is_empty());
}
