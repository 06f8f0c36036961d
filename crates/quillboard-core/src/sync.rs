//! Relay wire protocol and WebSocket client.
//!
//! Events are JSON, internally tagged with `type`, and identical in both
//! directions: the relay rebroadcasts what a client emits without
//! rewriting it.

use crate::surface::StrokeSegment;
use serde::{Deserialize, Serialize};

/// Events replicated through the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoardEvent {
    /// One segment of a freehand stroke.
    DrawLine(StrokeSegment),
    /// Full replacement of the shared text. Last arrival wins.
    TextUpdate { text: String },
    /// Content-free signal to clear the whole canvas.
    ClearCanvas,
    /// Origin point of a flood-fill erase.
    ObjectErase { x: f64, y: f64 },
}

/// The relay's only reply of its own: sent to the emitting client when a
/// frame cannot be classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireError {
    Error { message: String },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the WebSocket client.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Connected to the relay.
    Connected,
    /// Disconnected from the relay.
    Disconnected,
    /// Received a replicated event from another client.
    Event(BoardEvent),
    /// Error occurred.
    Error { message: String },
}

mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for the relay.
    ///
    /// Uses a background thread for non-blocking operation; events are
    /// drained with `poll_events()`.
    pub struct NativeWebSocket {
        state: ConnectionState,
        events: Vec<SyncEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a relay server.
        pub fn connect(&mut self, url: &str) -> Result<(), String> {
            if self.cmd_tx.is_some() {
                return Err("Already connected".to_string());
            }

            let parsed_url = Url::parse(url).map_err(|e| format!("Invalid URL: {}", e))?;
            if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
                return Err(format!(
                    "Invalid WebSocket URL scheme: {}",
                    parsed_url.scheme()
                ));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();

            let url = url.to_string();

            let handle = thread::spawn(move || {
                log::info!("WebSocket thread: connecting to {}", url);

                match connect(url.as_str()) {
                    Ok((mut socket, response)) => {
                        log::info!("WebSocket connected, status: {}", response.status());
                        let _ = event_tx.send(SyncEvent::Connected);

                        // A short read timeout keeps the loop responsive
                        // to outgoing commands without busy-waiting.
                        {
                            let stream = socket.get_mut();
                            match stream {
                                tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                                    let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                                    let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                                }
                                #[allow(unreachable_patterns)]
                                _ => {
                                    log::debug!("TLS stream - relying on WouldBlock errors");
                                }
                            }
                        }

                        loop {
                            match cmd_rx.try_recv() {
                                Ok(WsCommand::Send(msg)) => {
                                    if let Err(e) = socket.send(Message::Text(msg)) {
                                        log::error!("WebSocket send error: {}", e);
                                        break;
                                    }
                                }
                                Ok(WsCommand::Close) => {
                                    let _ = socket.close(None);
                                    break;
                                }
                                Err(TryRecvError::Disconnected) => {
                                    break;
                                }
                                Err(TryRecvError::Empty) => {}
                            }

                            match socket.read() {
                                Ok(Message::Text(txt)) => {
                                    match serde_json::from_str::<BoardEvent>(&txt) {
                                        Ok(event) => {
                                            let _ = event_tx.send(SyncEvent::Event(event));
                                        }
                                        Err(_) => {
                                            // The relay's error reply, or a
                                            // frame this client cannot use.
                                            if let Ok(WireError::Error { message }) =
                                                serde_json::from_str::<WireError>(&txt)
                                            {
                                                let _ = event_tx.send(SyncEvent::Error { message });
                                            } else {
                                                log::warn!("Unhandled relay frame: {}", txt);
                                            }
                                        }
                                    }
                                }
                                Ok(Message::Ping(data)) => {
                                    let _ = socket.send(Message::Pong(data));
                                }
                                Ok(Message::Close(_)) => {
                                    break;
                                }
                                Ok(_) => {} // Ignore binary, pong
                                Err(tungstenite::Error::Io(ref e))
                                    if e.kind() == std::io::ErrorKind::WouldBlock
                                        || e.kind() == std::io::ErrorKind::TimedOut =>
                                {
                                    continue;
                                }
                                Err(e) => {
                                    log::error!("WebSocket read error: {}", e);
                                    break;
                                }
                            }
                        }

                        log::info!("WebSocket thread exiting");
                        let _ = event_tx.send(SyncEvent::Disconnected);
                    }
                    Err(e) => {
                        log::error!("WebSocket connection failed: {}", e);
                        let _ = event_tx.send(SyncEvent::Error {
                            message: format!("Connection failed: {}", e),
                        });
                    }
                }
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        /// Disconnect from the relay.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        /// Send a board event. Fire-and-forget: delivery is not
        /// acknowledged and failures surface only as a later disconnect.
        pub fn send(&self, event: &BoardEvent) -> Result<(), String> {
            let json = serde_json::to_string(event).map_err(|e| format!("Encode failed: {}", e))?;
            if let Some(ref tx) = self.cmd_tx {
                tx.send(WsCommand::Send(json))
                    .map_err(|e| format!("Send failed: {}", e))
            } else {
                Err("Not connected".to_string())
            }
        }

        /// Poll for pending events (non-blocking).
        pub fn poll_events(&mut self) -> Vec<SyncEvent> {
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        SyncEvent::Connected => self.state = ConnectionState::Connected,
                        SyncEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        SyncEvent::Error { .. } => self.state = ConnectionState::Error,
                        _ => {}
                    }
                    self.events.push(event);
                }
            }

            std::mem::take(&mut self.events)
        }

        /// Get current connection state.
        pub fn state(&self) -> ConnectionState {
            self.state
        }

        /// Check if connected.
        pub fn is_connected(&self) -> bool {
            self.state == ConnectionState::Connected
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

pub use native_client::NativeWebSocket;

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_draw_line_wire_format() {
        let event = BoardEvent::DrawLine(StrokeSegment {
            from: Point::new(1.0, 2.0),
            to: Point::new(3.0, 4.0),
            color: "#112233".to_string(),
            width: 5.0,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "draw-line");
        assert_eq!(json["from"]["x"], 1.0);
        assert_eq!(json["to"]["y"], 4.0);
        assert_eq!(json["color"], "#112233");
        assert_eq!(json["width"], 5.0);
    }

    #[test]
    fn test_clear_canvas_wire_format() {
        let json = serde_json::to_string(&BoardEvent::ClearCanvas).unwrap();
        assert_eq!(json, r#"{"type":"clear-canvas"}"#);
    }

    #[test]
    fn test_text_update_roundtrip() {
        let event = BoardEvent::TextUpdate {
            text: "shared notes".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("text-update"));
        let back: BoardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_object_erase_deserialize() {
        let json = r#"{"type":"object-erase","x":12.5,"y":40.0}"#;
        let event: BoardEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, BoardEvent::ObjectErase { x: 12.5, y: 40.0 });
    }

    #[test]
    fn test_unknown_event_kind_rejected() {
        let json = r#"{"type":"join","room":"main"}"#;
        assert!(serde_json::from_str::<BoardEvent>(json).is_err());
    }

    #[test]
    fn test_connect_rejects_non_ws_url() {
        let mut ws = NativeWebSocket::new();
        assert!(ws.connect("http://localhost:3030").is_err());
        assert!(ws.connect("not a url").is_err());
    }
}
