use futures_util::{SinkExt, StreamExt};
use netview::cli::Commands;
use netview::cli_handler;
use netview::control::{ConnectionState, WsConnector};
use netview::orchestrator::{Session, SessionSettings};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

/// Loopback capture server double.
///
/// Serves one connection at a time and reports every request as
/// `(connection index, request payload)`. The first connection is closed by
/// the server after `drop_first_after` requests, if set.
async fn spawn_capture_server(drop_first_after: Option<usize>) -> (Url, mpsc::UnboundedReceiver<(usize, Value)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for connection in 0.. {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };

            let mut served = 0;
            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let frame: Value = serde_json::from_str(&text).expect("Client sent invalid JSON");
                let request = frame["request"].clone();
                let _ = seen_tx.send((connection, request.clone()));

                let reply = json!({"tag": frame["tag"], "response": respond(&request)});
                if ws.send(Message::Text(reply.to_string())).await.is_err() {
                    break;
                }

                served += 1;
                if connection == 0 && drop_first_after == Some(served) {
                    let _ = ws.close(None).await;
                    break;
                }
            }
        }
    });

    let url = Url::parse(&format!("ws://{}/rest", addr)).expect("Invalid URL");
    (url, seen_rx)
}

fn respond(request: &Value) -> Value {
    if request == "get_all" {
        json!({
            "eth0": {
                "history": [[1000, {"k": 10}], [2000, {"k": 20}]],
                "closed": false,
                "mac": null
            }
        })
    } else if request == "get_interfaces" {
        json!(["eth0", "lo"])
    } else if request.get("get").is_some() {
        json!({
            "eth0": {
                "history": [null, [2000, {"k": 20}], [3000, {"k": 30}]],
                "closed": false,
                "mac": "aa:bb:cc:dd:ee:ff"
            }
        })
    } else {
        Value::Null
    }
}

fn settings() -> SessionSettings {
    SessionSettings {
        poll_interval: Duration::from_millis(50),
        reconnect_delay: Duration::from_millis(50),
        auto_listen: vec!["eth0".to_string()],
    }
}

async fn next_request(seen: &mut mpsc::UnboundedReceiver<(usize, Value)>) -> (usize, Value) {
    timeout(WAIT, seen.recv())
        .await
        .expect("Timed out waiting for a request")
        .expect("Capture server stopped")
}

#[tokio::test]
async fn test_listen_bootstrap_then_incremental_sync() {
    let (url, mut seen) = spawn_capture_server(None).await;
    let connector = WsConnector::new(url, None).expect("Failed to create connector");

    let (_visibility_tx, visibility_rx) = watch::channel(true);
    let session = Session::start(connector, settings(), visibility_rx);

    assert_eq!(next_request(&mut seen).await, (0, json!({"listen_interfaces": "eth0"})));
    assert_eq!(next_request(&mut seen).await, (0, json!("get_all")));
    assert_eq!(next_request(&mut seen).await, (0, json!({"get": {"eth0": 2000}})));

    let mut data = session.sync().subscribe();
    let synced = timeout(WAIT, data.wait_for(|data| data.get("eth0").is_some_and(|s| s.history.len() == 3)))
        .await
        .expect("Timed out waiting for merged history")
        .expect("Sync supervisor stopped")
        .clone();

    let eth0 = &synced["eth0"];
    let timestamps: Vec<u64> = eth0.history.iter().map(|bucket| bucket.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 2000, 3000]);
    assert_eq!(eth0.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    assert!(!eth0.closed);

    session.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_server_drops() {
    let (url, mut seen) = spawn_capture_server(Some(2)).await;
    let connector = WsConnector::new(url, None).expect("Failed to create connector");

    let (_visibility_tx, visibility_rx) = watch::channel(true);
    let session = Session::start(connector, settings(), visibility_rx);
    let mut state = session.state();

    assert_eq!(next_request(&mut seen).await, (0, json!({"listen_interfaces": "eth0"})));
    assert_eq!(next_request(&mut seen).await, (0, json!("get_all")));

    // The new connection subscribes again and bootstraps from scratch.
    assert_eq!(next_request(&mut seen).await, (1, json!({"listen_interfaces": "eth0"})));
    assert_eq!(next_request(&mut seen).await, (1, json!("get_all")));

    timeout(WAIT, state.wait_for(|state| *state == ConnectionState::Open))
        .await
        .expect("Timed out waiting for reconnect")
        .expect("Reconnect supervisor stopped");

    session.shutdown().await;
}

#[tokio::test]
async fn test_one_shot_interfaces_command() {
    let (url, mut seen) = spawn_capture_server(None).await;
    let connector = WsConnector::new(url, None).expect("Failed to create connector");

    let output = cli_handler::execute(&connector, &Commands::Interfaces)
        .await
        .expect("Command failed");

    assert_eq!(output, "eth0\nlo");
    assert_eq!(next_request(&mut seen).await, (0, json!("get_interfaces")));
}
