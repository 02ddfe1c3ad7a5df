//! Live push-channel tests against an in-process websocket server: deltas
//! flow into the store in arrival order, buffering holds until the snapshot,
//! and closing the session cancels the consumer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use eventhub_client_core::{Config, EventSession};

/// One-connection websocket server that relays whatever the test sends
/// through the channel, then drains the socket until the client goes away.
async fn spawn_ws_server() -> (String, mpsc::UnboundedSender<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket)
            .await
            .expect("ws handshake");
        loop {
            tokio::select! {
                frame = frame_rx.recv() => match frame {
                    Some(frame) => {
                        if ws.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                inbound = ws.next() => match inbound {
                    Some(Ok(_)) => {}
                    _ => break,
                },
            }
        }
    });

    (format!("ws://{}", addr), frame_tx)
}

async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

fn created_frame(id: &str, name: &str) -> String {
    format!(
        r#"{{"type":"event-created","payload":{{"_id":"{}","name":"{}","description":"","date":"2025-06-15T18:00:00Z","owner":"u1"}}}}"#,
        id, name
    )
}

#[tokio::test]
async fn stream_deltas_flow_into_the_store_until_closed() {
    let (ws_url, frames) = spawn_ws_server().await;
    let config = Config::new("http://127.0.0.1:1", ws_url);
    let session = Arc::new(EventSession::new(config, Some(common::token_for("u1"))));

    session.apply_snapshot(Vec::new());
    session.connect_stream().await.expect("stream connect");

    frames.send(created_frame("e1", "Live One")).expect("send");
    wait_until(|| session.store().len() == 1, "first delta applied").await;
    assert_eq!(session.store().get("e1").map(|e| e.name), Some("Live One".to_string()));

    // After close the consumer is gone: further frames change nothing. The
    // server may have noticed the hangup already, so the send is best-effort.
    session.close();
    let _ = frames.send(created_frame("e2", "After Close"));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(session.store().len(), 1, "no deltas applied after close");
}

#[tokio::test]
async fn deltas_received_before_the_snapshot_replay_on_top_of_it() {
    let (ws_url, frames) = spawn_ws_server().await;
    let config = Config::new("http://127.0.0.1:1", ws_url);
    let session = Arc::new(EventSession::new(config, Some(common::token_for("u1"))));

    session.connect_stream().await.expect("stream connect");
    frames
        .send(
            r#"{"type":"event-updated","payload":{"_id":"e1","name":"Renamed Early","description":"","date":"2025-06-15T18:00:00Z","owner":"u1"}}"#
                .to_string(),
        )
        .expect("send");

    // The delta must not touch the store while the snapshot is pending.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(session.store().is_empty(), "delta buffered, not applied");

    session.apply_snapshot(vec![common::event("e1", "Original", "u1")]);
    wait_until(
        || session.store().get("e1").map(|e| e.name) == Some("Renamed Early".to_string()),
        "buffered update replayed over the snapshot",
    )
    .await;

    session.close();
}

#[tokio::test]
async fn guest_session_skips_the_subscription() {
    let config = common::config();
    let session = Arc::new(EventSession::new(config, None));
    // No credential: connect succeeds as a no-op instead of dialing out.
    session.connect_stream().await.expect("guest connect is a no-op");
}

#[tokio::test]
async fn unknown_frames_are_skipped_without_breaking_the_consumer() {
    let (ws_url, frames) = spawn_ws_server().await;
    let config = Config::new("http://127.0.0.1:1", ws_url);
    let session = Arc::new(EventSession::new(config, Some(common::token_for("u1"))));

    session.apply_snapshot(Vec::new());
    session.connect_stream().await.expect("stream connect");

    frames.send("not json at all".to_string()).expect("send");
    frames
        .send(r#"{"type":"presence-ping","payload":{}}"#.to_string())
        .expect("send");
    frames.send(created_frame("e1", "Still Works")).expect("send");

    wait_until(|| session.store().len() == 1, "delta after junk frames").await;
    session.close();
}
