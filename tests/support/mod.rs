// Minimal authoritative match server used to exercise the client net adapter
// end to end: axum serves the same WebSocket surface the real server does,
// bound to an ephemeral port to avoid collisions with local services.

use axum::{
    Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    routing::get,
};
use serde_json::{Value, json};

/// Spawns the mock authority and returns its ws:// URL once it is bound.
pub async fn spawn_mock_authority() -> String {
    let app = Router::new().route("/ws", get(ws_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server failed");
    });
    format!("ws://{addr}/ws")
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl axum::response::IntoResponse {
    ws.on_upgrade(handle_socket)
}

async fn send_json(socket: &mut WebSocket, value: Value) {
    let text = value.to_string();
    socket
        .send(Message::Text(text.into()))
        .await
        .expect("mock send failed");
}

/// Scripted authority: accept the Join, assign identity 7, run the phase flow,
/// publish one snapshot with opponent 9, then answer damage reports and pings.
async fn handle_socket(mut socket: WebSocket) {
    // Join-first handshake, like the real server.
    loop {
        let Some(Ok(message)) = socket.recv().await else {
            return;
        };
        if let Message::Text(text) = message {
            let value: Value = serde_json::from_str(&text).expect("join should be valid json");
            assert_eq!(value["type"], "Join", "first message must be Join");
            assert!(
                !value["data"]["session_token"]
                    .as_str()
                    .unwrap_or_default()
                    .is_empty(),
                "join must carry a session token"
            );
            break;
        }
    }

    send_json(
        &mut socket,
        json!({"type": "Identity", "data": {"player_id": "7"}}),
    )
    .await;
    send_json(
        &mut socket,
        json!({"type": "GameState", "data": {"Countdown": {"seconds": 0.05}}}),
    )
    .await;
    send_json(&mut socket, json!({"type": "GameState", "data": "Running"})).await;
    send_json(
        &mut socket,
        json!({
            "type": "WorldUpdate",
            "data": {
                "tick": 1,
                "server_time_ms": 1000,
                "entities": [
                    {"id": "9", "x": 120.0, "y": 0.0, "vx": 0.0, "vy": 0.0,
                     "hp": 100, "max_hp": 100, "level": 1}
                ],
                "enemies": []
            }
        }),
    )
    .await;

    let mut opponent_hp = 100i64;
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        match value["type"].as_str() {
            Some("Ping") => {
                let nonce = value["data"]["nonce"].as_u64().unwrap_or(0);
                send_json(&mut socket, json!({"type": "Pong", "data": {"nonce": nonce}})).await;
            }
            Some("DamageReport") => {
                let amount = value["data"]["amount"].as_i64().unwrap_or(0);
                let target_id = value["data"]["target_id"].as_str().unwrap_or("");
                assert!(
                    !value["data"]["hit_id"].as_str().unwrap_or_default().is_empty(),
                    "damage reports must carry a hit id"
                );
                opponent_hp = (opponent_hp - amount).max(0);
                send_json(
                    &mut socket,
                    json!({
                        "type": "DamageConfirm",
                        "data": {
                            "target_id": target_id,
                            "new_hp": opponent_hp,
                            "amount": amount,
                            "source_id": "7"
                        }
                    }),
                )
                .await;
            }
            _ => {}
        }
    }
}
