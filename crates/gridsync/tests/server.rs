//! Integration tests for the Gridsync server: full connection flow over
//! real WebSockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridsync::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a two-player server on a random port.
async fn start_server() -> (String, ServerHandle) {
    let server = GridServer::builder()
        .bind("127.0.0.1:0")
        .game_id("game-test")
        .players(["A", "B"])
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let handle = server.handle();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, handle)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Receives the next text frame as JSON, with a timeout.
async fn recv_frame(ws: &mut ClientWs) -> serde_json::Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("websocket error");
    match msg {
        Message::Text(text) => {
            serde_json::from_str(&text).expect("frame should be JSON")
        }
        other => panic!("unexpected message {other:?}"),
    }
}

/// Asserts that no frame arrives within a short window.
async fn assert_silent(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

async fn send_json(ws: &mut ClientWs, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Connects and consumes the `connection` greeting.
async fn connect_ready(addr: &str) -> ClientWs {
    let mut ws = connect(addr).await;
    let greeting = recv_frame(&mut ws).await;
    assert_eq!(greeting["type"], "connection");
    ws
}

fn move_frame(player: &str, x: i64, y: i64, value: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "move",
        "player": player,
        "x": x,
        "y": y,
        "value": value,
    })
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_new_connection_receives_greeting() {
    let (addr, _handle) = start_server().await;

    let mut ws = connect(&addr).await;
    let frame = recv_frame(&mut ws).await;

    assert_eq!(frame["type"], "connection");
    assert_eq!(frame["message"], "Connected to game server");
    assert!(frame["timestamp"].is_u64());
}

#[tokio::test]
async fn test_greeting_goes_only_to_the_new_connection() {
    let (addr, _handle) = start_server().await;
    let mut first = connect_ready(&addr).await;

    let _second = connect_ready(&addr).await;

    assert_silent(&mut first).await;
}

#[tokio::test]
async fn test_disconnect_announced_to_remaining_clients() {
    let (addr, handle) = start_server().await;
    let mut stayer = connect_ready(&addr).await;
    let mut leaver = connect_ready(&addr).await;

    leaver.close(None).await.expect("close should succeed");

    let frame = recv_frame(&mut stayer).await;
    assert_eq!(frame["type"], "disconnect");
    assert_eq!(frame["message"], "A client has disconnected");

    // The registry eventually reflects the departure.
    let mut remaining = handle.client_count().await;
    for _ in 0..50 {
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        remaining = handle.client_count().await;
    }
    assert_eq!(remaining, 1);
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_valid_move_broadcast_to_every_client_including_sender() {
    let (addr, _handle) = start_server().await;
    let mut mover = connect_ready(&addr).await;
    let mut watcher = connect_ready(&addr).await;

    send_json(&mut mover, move_frame("A", 3, 4, 7)).await;

    for ws in [&mut mover, &mut watcher] {
        let frame = recv_frame(ws).await;
        assert_eq!(frame["type"], "gameStateUpdate");
        assert_eq!(frame["data"]["grid"][4][3]["player"], "A");
        assert_eq!(frame["data"]["grid"][4][3]["value"], 7);
        assert_eq!(frame["data"]["currentPlayer"], "B");
        assert_eq!(frame["data"]["status"], "active");
    }
}

#[tokio::test]
async fn test_rejected_move_error_goes_only_to_sender() {
    let (addr, _handle) = start_server().await;
    let mut offender = connect_ready(&addr).await;
    let mut bystander = connect_ready(&addr).await;

    // B moving first is out of turn.
    send_json(&mut offender, move_frame("B", 0, 0, 1)).await;

    let frame = recv_frame(&mut offender).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Not your turn");
    assert_silent(&mut bystander).await;
}

#[tokio::test]
async fn test_occupied_cell_error_message() {
    let (addr, _handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    send_json(&mut ws, move_frame("A", 0, 0, 1)).await;
    assert_eq!(recv_frame(&mut ws).await["type"], "gameStateUpdate");

    send_json(&mut ws, move_frame("B", 0, 0, 2)).await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Cell is already occupied");
}

#[tokio::test]
async fn test_out_of_bounds_move_error_message() {
    let (addr, _handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    send_json(&mut ws, move_frame("A", 10, 0, 1)).await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(
        frame["message"],
        "Invalid coordinates: must be between 0 and 9"
    );
}

// =========================================================================
// Malformed input
// =========================================================================

#[tokio::test]
async fn test_malformed_json_gets_error_frame() {
    let (addr, _handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    ws.send(Message::Text("this is not json".into()))
        .await
        .expect("send");

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert!(
        frame["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON format"),
        "got: {}",
        frame["message"]
    );
}

#[tokio::test]
async fn test_unknown_frame_type_gets_error_frame() {
    let (addr, _handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    send_json(&mut ws, serde_json::json!({ "type": "dance", "bpm": 120 }))
        .await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "unknown message type: dance");
}

#[tokio::test]
async fn test_malformed_frame_does_not_close_the_connection() {
    let (addr, _handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    ws.send(Message::Text("garbage".into())).await.expect("send");
    assert_eq!(recv_frame(&mut ws).await["type"], "error");

    // The same connection still plays.
    send_json(&mut ws, move_frame("A", 1, 1, 1)).await;
    assert_eq!(recv_frame(&mut ws).await["type"], "gameStateUpdate");
}

// =========================================================================
// Ping / pong
// =========================================================================

#[tokio::test]
async fn test_ping_answered_with_pong_unicast() {
    let (addr, _handle) = start_server().await;
    let mut pinger = connect_ready(&addr).await;
    let mut other = connect_ready(&addr).await;

    send_json(&mut pinger, serde_json::json!({ "type": "ping" })).await;

    let frame = recv_frame(&mut pinger).await;
    assert_eq!(frame["type"], "pong");
    assert!(frame["timestamp"].is_u64());
    assert_silent(&mut other).await;
}

// =========================================================================
// Server handle
// =========================================================================

#[tokio::test]
async fn test_handle_snapshot_tracks_played_moves() {
    let (addr, handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    let fresh = handle.snapshot().await.expect("snapshot");
    assert_eq!(fresh.status, GameStatus::Waiting);

    send_json(&mut ws, move_frame("A", 2, 2, 9)).await;
    assert_eq!(recv_frame(&mut ws).await["type"], "gameStateUpdate");

    let after = handle.snapshot().await.expect("snapshot");
    assert_eq!(after.status, GameStatus::Active);
    assert!(after.grid.is_occupied(2, 2));

    let stats = handle.stats().await.expect("stats");
    assert_eq!(stats.filled_cells, 1);
    assert_eq!(stats.player_moves.get(&PlayerId::new("A")), Some(&1));
}

#[tokio::test]
async fn test_handle_broadcast_reaches_connected_clients() {
    let (addr, handle) = start_server().await;
    let mut ws = connect_ready(&addr).await;

    handle
        .broadcast(serde_json::json!({ "announcement": "server restart soon" }))
        .await
        .expect("broadcast");

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["type"], "gameStateUpdate");
    assert_eq!(frame["data"]["announcement"], "server restart soon");
}

#[tokio::test]
async fn test_handle_start_game_activates_without_a_move() {
    let (_addr, handle) = start_server().await;

    let state = handle.start_game().await.expect("start");

    assert_eq!(state.status, GameStatus::Active);
    assert_eq!(state.current_player, Some(PlayerId::new("A")));
}

#[tokio::test]
async fn test_unresponsive_client_dropped_when_write_times_out() {
    let server = GridServer::builder()
        .bind("127.0.0.1:0")
        .players(["A", "B"])
        .config(ServerConfig {
            send_timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        })
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut watcher = connect_ready(&addr).await;
    // This peer sends nothing and reads nothing; its reader task on the
    // server stays parked while its socket buffers fill up.
    let _stalled = connect_ready(&addr).await;
    assert_eq!(handle.client_count().await, 2);

    // Push enough data to overrun the stalled peer's buffers and trip
    // the write timeout. The watcher drains as we go, so only the
    // stalled connection wedges. Its departure announcement may arrive
    // interleaved with the updates.
    let mut saw_disconnect = false;
    let blob = "x".repeat(1 << 20);
    for _ in 0..64 {
        handle
            .broadcast(serde_json::json!({ "fill": blob }))
            .await
            .expect("broadcast");
        let frame = recv_frame(&mut watcher).await;
        match frame["type"].as_str() {
            Some("gameStateUpdate") => {}
            Some("disconnect") => saw_disconnect = true,
            other => panic!("unexpected frame type {other:?}"),
        }
    }

    // The writer unregisters the wedged peer on its own; the reader is
    // still blocked and never gets the chance.
    let mut remaining = handle.client_count().await;
    for _ in 0..100 {
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = handle.client_count().await;
    }
    assert_eq!(remaining, 1, "wedged connection should be unregistered");

    // And the remaining client hears about the departure.
    for _ in 0..100 {
        if saw_disconnect {
            break;
        }
        saw_disconnect =
            recv_frame(&mut watcher).await["type"] == "disconnect";
    }
    assert!(saw_disconnect, "disconnect should be announced");
}

#[tokio::test]
async fn test_idle_timeout_closes_silent_connection() {
    let server = GridServer::builder()
        .bind("127.0.0.1:0")
        .players(["A", "B"])
        .config(ServerConfig {
            idle_timeout: Some(Duration::from_millis(100)),
            ..ServerConfig::default()
        })
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let _ws = connect_ready(&addr).await;
    assert_eq!(handle.client_count().await, 1);

    // Say nothing and the server hangs up.
    let mut emptied = handle.client_count().await;
    for _ in 0..50 {
        if emptied == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        emptied = handle.client_count().await;
    }
    assert_eq!(emptied, 0);
}
