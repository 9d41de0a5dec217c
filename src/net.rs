// ==============================================================================
// net.rs — WEBSOCKET FRONT END
// ------------------------------------------------------------------------------
// One task per connection:
//   1) outgoing mpsc channel + send loop
//   2) spawn a vehicle, send `welcome`
//   3) read loop: input / movement / ping
//   4) on disconnect, remove the vehicle and its body
//
// Client messages (JSON, tagged by `type`):
//   {"type":"input","accelerate":1,"brake":0,"turn":-0.5,"drift":false,"jump":false}
//   {"type":"movement","enabled":false}
//   {"type":"ping"}
// ==============================================================================

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async;
use tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::controller::ControlInput;
use crate::physics::PhysicsWorld;
use crate::state::{ServerMessage, SharedGameState};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Input(ControlInput),
    Movement { enabled: bool },
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

pub async fn start_websocket_server(
    bind: String,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&bind).await?;
    info!("🌐 WebSocket listening on ws://{}", bind);

    loop {
        let (raw, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("⚠️ Accept failed: {}", e);
                continue;
            }
        };
        debug!("TCP connection from {}", addr);

        tokio::spawn(handle_connection(raw, Arc::clone(&state), Arc::clone(&physics)));
    }
}

async fn handle_connection(
    raw: TcpStream,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("⚠️ WebSocket handshake failed: {}", e);
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Create outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // -------------------------------
    // 2) Spawn send-loop task
    // -------------------------------
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 3) Create entity + physics body
    // -------------------------------
    let player_id = {
        // same lock order as the tick loop: physics, then game
        let mut phys = physics.lock().await;
        let mut game = state.lock().await;
        match game.spawn_vehicle(&mut phys) {
            Ok(id) => {
                game.register_client(tx.clone());
                id
            }
            Err(e) => {
                error!("❌ Could not spawn vehicle: {}", e);
                return;
            }
        }
    };

    info!("🟢 Player connected: {}", player_id);

    match (ServerMessage::Welcome { player_id: &player_id }).to_json() {
        Ok(welcome) => {
            let _ = tx.send(welcome);
        }
        Err(e) => error!("❌ Could not encode welcome: {}", e),
    }

    // -------------------------------
    // 4) Main receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        if msg.is_close() {
            break;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        let Some(parsed) = ClientMessage::from_json(text) else {
            warn!("⚠️ Ignoring malformed message from {}: {}", player_id, text);
            continue;
        };

        match parsed {
            ClientMessage::Ping => {
                if let Ok(pong) = ServerMessage::Pong.to_json() {
                    let _ = tx.send(pong);
                }
            }
            ClientMessage::Input(input) => {
                state.lock().await.queue_input(&player_id, input);
            }
            ClientMessage::Movement { enabled } => {
                state.lock().await.queue_movement(&player_id, enabled);
            }
        }
    }

    info!("🔴 Player disconnected: {}", player_id);
    let mut phys = physics.lock().await;
    let mut game = state.lock().await;
    game.remove_entity(&player_id, &mut phys);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_client_messages() {
        let msg = ClientMessage::from_json(r#"{"type":"input","accelerate":1.0,"turn":-0.5,"jump":true}"#);
        match msg {
            Some(ClientMessage::Input(input)) => {
                assert_eq!(input.accelerate, 1.0);
                assert_eq!(input.turn, -0.5);
                assert_eq!(input.brake, 0.0);
                assert!(input.jump);
                assert!(!input.drift);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            ClientMessage::from_json(r#"{"type":"movement","enabled":false}"#),
            Some(ClientMessage::Movement { enabled: false })
        ));
        assert!(matches!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping)));
        assert!(ClientMessage::from_json(r#"{"type":"fly"}"#).is_none());
        assert!(ClientMessage::from_json("not json").is_none());
    }

    #[test]
    fn server_messages_carry_their_type() {
        let welcome = ServerMessage::Welcome { player_id: "abc" }.to_json().unwrap();
        assert_eq!(welcome, r#"{"type":"welcome","player_id":"abc"}"#);
        assert_eq!(ServerMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
    }
}
