use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use besiktas_roster::roster_fetch::HttpRosterSource;
use besiktas_roster::{LoadState, RosterError, RosterLoader, RosterSource};

const WAIT: Duration = Duration::from_secs(10);

fn read_request_head(stream: &TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
}

// Answers every connection with `status` and `body`, then closes it.
fn serve(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else {
                continue;
            };
            read_request_head(&stream);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/players.json")
}

#[test]
fn ok_response_returns_body() {
    let url = serve("200 OK", r#"[{"id":"1","name":"Mert Günok"}]"#);
    let source = HttpRosterSource::new(Some(url));
    let body = source.fetch().expect("fetch should succeed");
    assert!(body.contains("Mert"));
}

#[test]
fn error_status_maps_to_status() {
    let url = serve("503 Service Unavailable", "");
    let source = HttpRosterSource::new(Some(url));
    assert!(matches!(source.fetch(), Err(RosterError::Status(503))));
}

#[test]
fn silent_server_maps_to_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        let held: Vec<TcpStream> = listener.incoming().flatten().take(1).collect();
        thread::sleep(Duration::from_secs(5));
        drop(held);
    });

    let source = HttpRosterSource::new(Some(format!("http://{addr}/players.json")))
        .with_timeout(Duration::from_secs(1));
    assert!(matches!(source.fetch(), Err(RosterError::Timeout)));
}

#[test]
fn closed_port_maps_to_transport() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let source = HttpRosterSource::new(Some(format!("http://{addr}/players.json")))
        .with_timeout(Duration::from_secs(5));
    assert!(matches!(source.fetch(), Err(RosterError::Transport(_))));
}

#[test]
fn loader_reports_http_status_as_failure_message() {
    let url = serve("503 Service Unavailable", "");
    let loader = RosterLoader::new(HttpRosterSource::new(Some(url)));
    let sub = loader.subscribe();
    loader.trigger();

    let mut last = None;
    while let Some(state) = sub.recv_timeout(WAIT) {
        let done = state.is_terminal();
        last = Some(state);
        if done {
            break;
        }
    }
    assert_eq!(
        last,
        Some(LoadState::Failure(
            "The roster server returned an error (HTTP 503).".to_string()
        ))
    );
}

#[test]
fn loader_parses_http_body_into_players() {
    let url = serve("200 OK", r#"[{"id":"10"},{"id":"1"}]"#);
    let loader = RosterLoader::new(HttpRosterSource::new(Some(url)));
    let sub = loader.subscribe();
    loader.trigger();

    let mut last = None;
    while let Some(state) = sub.recv_timeout(WAIT) {
        let done = state.is_terminal();
        last = Some(state);
        if done {
            break;
        }
    }
    let ids: Vec<String> = last
        .map(|state| state.players().iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["10", "1"]);
}
