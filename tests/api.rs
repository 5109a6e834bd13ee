use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use nfl_picks_terminal::api::{PicksApi, PicksBackend, error_message};
use nfl_picks_terminal::provider::run_command;
use nfl_picks_terminal::state::{AppState, Delta, ProviderCommand, apply_delta};

/// Serves one canned HTTP response and hands back the request line.
fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (req_tx, req_rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        let request = String::from_utf8_lossy(&buf);
        let first_line = request.lines().next().unwrap_or_default().to_string();
        let _ = req_tx.send(first_line);
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });
    (format!("http://{addr}"), req_rx)
}

fn test_api(base: &str) -> PicksApi {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .expect("client");
    PicksApi::with_client(client, base)
}

#[test]
fn http_500_maps_to_status_message() {
    let (base, _req) = serve_once("500 Internal Server Error", r#"{"detail":"Prediction failed"}"#);
    let err = test_api(&base)
        .predictions(2025, 10)
        .expect_err("500 should fail");
    assert_eq!(error_message(&err), "HTTP 500");
}

#[test]
fn http_500_leaves_rows_untouched_end_to_end() {
    let (base, _req) = serve_once("500 Internal Server Error", "");
    let api = test_api(&base);
    let (tx, rx) = mpsc::channel();

    let mut state = AppState::new();
    state.predictions.begin_fetch();
    run_command(
        &api,
        ProviderCommand::FetchPredictions {
            season: 2025,
            week: 10,
        },
        &tx,
    );
    let delta = rx.recv().expect("delta");
    assert!(matches!(delta, Delta::PredictionsFailed(_)));
    apply_delta(&mut state, delta);

    assert_eq!(state.predictions.error.as_deref(), Some("HTTP 500"));
    assert!(state.predictions.rows.is_empty());
    assert!(!state.predictions.loading);
}

#[test]
fn predictions_request_carries_season_and_week() {
    let body = r#"[{"game_id":"2025_10_KC_DEN","week":10,"away_team":"KC","home_team":"DEN","pick":"KC","pick_prob":0.62}]"#;
    let (base, req) = serve_once("200 OK", body);
    let rows = test_api(&base)
        .predictions(2025, 10)
        .expect("rows should parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pick.as_deref(), Some("KC"));

    let line = req.recv().expect("request line");
    assert!(line.starts_with("GET /predict?"));
    assert!(line.contains("season=2025"));
    assert!(line.contains("week=10"));
}

#[test]
fn history_request_carries_limit() {
    let (base, req) = serve_once("200 OK", "[]");
    let rows = test_api(&base)
        .history(2024, 3, 50)
        .expect("empty history");
    assert!(rows.is_empty());

    let line = req.recv().expect("request line");
    assert!(line.starts_with("GET /history?"));
    assert!(line.contains("limit=50"));
}

#[test]
fn snapshot_posts_and_tolerates_odd_body() {
    let (base, req) = serve_once("200 OK", "saved");
    let receipt = test_api(&base)
        .snapshot(2025, 10)
        .expect("2xx is success");
    assert!(receipt.is_none());
    let line = req.recv().expect("request line");
    assert!(line.starts_with("POST /predict/snapshot?"));
}

#[test]
fn snapshot_failure_reports_status() {
    let (base, _req) = serve_once("503 Service Unavailable", "");
    let err = test_api(&base)
        .snapshot(2025, 10)
        .expect_err("503 should fail");
    assert_eq!(error_message(&err), "HTTP 503");
}

#[test]
fn transport_failure_surfaces_a_message() {
    // Bind then drop so nothing listens on the port.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(2))
        .build()
        .expect("client");
    let api = PicksApi::with_client(client, &format!("http://{addr}/"));
    assert_eq!(api.base(), format!("http://{addr}"));

    let err = api.health().expect_err("nothing is listening");
    let msg = error_message(&err);
    assert!(!msg.is_empty());
    assert!(!msg.starts_with("HTTP "));
}
