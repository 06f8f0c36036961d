//! Quillboard WebSocket Relay Server
//!
//! A minimal relay that rebroadcasts drawing and text events between
//! connected clients. The relay holds no document state: it classifies
//! each frame's `type` tag and fans the original text out to every other
//! peer, verbatim. No ordering across peers, no persistence, no
//! acknowledgements.
//!
//! ## Protocol
//!
//! Frames are JSON with the following format:
//! ```json
//! { "type": "draw-line", "from": {"x": 1, "y": 2}, "to": {"x": 3, "y": 4}, "color": "#000000", "width": 5 }
//! { "type": "text-update", "text": "shared notes" }
//! { "type": "clear-canvas" }
//! { "type": "object-erase", "x": 10, "y": 20 }
//! ```

mod broker;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use broker::Broker;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, OnceLock},
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "quillboard-server", about = "WebSocket relay server for Quillboard")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    /// Port to listen on.
    #[arg(long, default_value_t = 3030)]
    port: u16,
}

/// The classified part of an incoming frame: only the event kind is
/// inspected, payload fields are relayed untouched.
#[derive(Debug, Deserialize)]
struct TaggedFrame {
    #[serde(rename = "type")]
    kind: String,
}

/// Reply sent to a client whose frame could not be classified.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ServerReply {
    Error { message: String },
}

/// Event kinds the relay rebroadcasts.
fn is_board_event(kind: &str) -> bool {
    matches!(
        kind,
        "draw-line" | "text-update" | "clear-canvas" | "object-erase"
    )
}

/// Shared application state.
///
/// The broker is lazily constructed on first use; later initialization
/// attempts detect the existing instance and return it unchanged.
struct AppState {
    broker: OnceLock<Arc<Broker>>,
}

impl AppState {
    fn new() -> Self {
        Self {
            broker: OnceLock::new(),
        }
    }

    /// Get the process-wide broker, constructing it on first use.
    fn broker(&self) -> Arc<Broker> {
        self.broker
            .get_or_init(|| {
                info!("broker initialized");
                Arc::new(Broker::new())
            })
            .clone()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quillboard_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from((args.host, args.port));
    info!("Quillboard relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Index page
async fn index() -> &'static str {
    "Quillboard Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "peers": state.broker().peer_count(),
    }))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    let broker = state.broker();
    let mut subscription = broker.register(&peer_id);
    info!(peer = %peer_id, peers = broker.peer_count(), "client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Frames emitted by this client.
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<TaggedFrame>(&text) {
                            Ok(frame) if is_board_event(&frame.kind) => {
                                // Payload fields are never validated or
                                // normalized; the frame is relayed as-is
                                // and clients render defensively.
                                broker.publish(&peer_id, text.to_string());
                            }
                            _ => {
                                warn!(peer = %peer_id, "dropping unclassifiable frame");
                                let reply = ServerReply::Error {
                                    message: "unrecognized event".to_string(),
                                };
                                let json = serde_json::to_string(&reply).unwrap();
                                let _ = sender.send(Message::Text(json.into())).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore binary, ping/pong
                    Some(Err(e)) => {
                        warn!(peer = %peer_id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Frames published by the other peers.
            frame = subscription.recv() => {
                match frame {
                    Some(payload) => {
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    broker.unregister(&peer_id);
    info!(peer = %peer_id, peers = broker.peer_count(), "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_initialization_is_idempotent() {
        let state = AppState::new();
        let first = state.broker();
        let second = state.broker();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_board_event_kinds() {
        assert!(is_board_event("draw-line"));
        assert!(is_board_event("text-update"));
        assert!(is_board_event("clear-canvas"));
        assert!(is_board_event("object-erase"));
        assert!(!is_board_event("join"));
        assert!(!is_board_event(""));
    }

    #[test]
    fn test_classification_ignores_payload_shape() {
        // Bogus payload fields still classify; the relay never inspects
        // them.
        let frame: TaggedFrame =
            serde_json::from_str(r#"{"type":"draw-line","width":"not-a-number"}"#).unwrap();
        assert!(is_board_event(&frame.kind));
    }

    #[test]
    fn test_error_reply_shape() {
        let reply = ServerReply::Error {
            message: "unrecognized event".to_string(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"unrecognized event"}"#);
    }
}
