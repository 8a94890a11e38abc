use std::io::{Read, Write};
use std::time::Duration;

use quakesense_rust::feed::run_feed;
use quakesense_rust::settings::FeedSettings;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SNAPSHOT_ONE: &str = r#"{"-Nx1":{"magnitude":5.8,"timestamp":1704082320}}"#;
const SNAPSHOT_TWO: &str =
    r#"{"-Nx1":{"magnitude":5.8,"timestamp":1704082320},"-Nx2":{"magnitude":6.2,"timestamp":1704082920}}"#;

/// Minimal realtime-database stand-in: answers one-shot GETs with a JSON
/// snapshot (Connection: close so every fetch is a fresh connection) and
/// answers the SSE request with a single `put` event, then holds the
/// stream open.
fn start_mock_feed() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let mut fetches = 0;
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            if request.contains("text/event-stream") {
                std::thread::spawn(move || {
                    let _ = stream.write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n",
                    );
                    let _ = stream
                        .write_all(b"event: put\ndata: {\"path\":\"/-Nx2\",\"data\":{}}\n\n");
                    std::thread::sleep(Duration::from_secs(10));
                });
            } else {
                fetches += 1;
                let body = if fetches == 1 { SNAPSHOT_ONE } else { SNAPSHOT_TWO };
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        }
    });

    port
}

#[tokio::test]
async fn test_feed_delivers_baseline_then_update() {
    let port = start_mock_feed();
    let config = FeedSettings {
        base_url: format!("http://127.0.0.1:{}", port),
        path: "earthquakes".to_string(),
        request_timeout_seconds: 2,
        reconnect_min_seconds: 1,
        reconnect_max_seconds: 2,
    };

    let (tx, mut rx) = mpsc::channel(10);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_feed(config, tx, cancel.clone()));

    // Baseline snapshot from the initial fetch
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for the baseline snapshot")
        .expect("feed channel closed early");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].0, "-Nx1");

    // The SSE put event triggers a re-fetch of the full path
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for the updated snapshot")
        .expect("feed channel closed early");
    assert_eq!(second.len(), 2);
    // Most-recent-first: the new event leads
    assert_eq!(second[0].0, "-Nx2");
    assert_eq!(second[0].1.magnitude, Some(6.2));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("feed task did not stop on cancel")
        .unwrap();
}

#[tokio::test]
async fn test_feed_stops_when_consumer_drops() {
    let port = start_mock_feed();
    let config = FeedSettings {
        base_url: format!("http://127.0.0.1:{}", port),
        path: "earthquakes".to_string(),
        request_timeout_seconds: 2,
        reconnect_min_seconds: 1,
        reconnect_max_seconds: 2,
    };

    let (tx, rx) = mpsc::channel(10);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_feed(config, tx, cancel.clone()));

    // Consumer goes away: the feed task must notice and exit on its own
    drop(rx);
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("feed task did not stop after the consumer dropped")
        .unwrap();
}
