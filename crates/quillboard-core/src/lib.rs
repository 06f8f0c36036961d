//! Quillboard Core Library
//!
//! Client-side state and replication logic for the Quillboard shared
//! notepad/whiteboard: the drawing surface, undo/redo history, flood-fill
//! erase, the relay wire protocol and WebSocket client, and the durable
//! multi-page store.

pub mod color;
pub mod erase;
pub mod export;
pub mod history;
pub mod pages;
pub mod session;
pub mod storage;
pub mod surface;
pub mod sync;
pub mod tools;

pub use color::Rgba;
pub use history::History;
pub use pages::{Page, PageStore};
pub use session::Session;
pub use surface::{Snapshot, StrokeSegment, Surface};
pub use sync::{BoardEvent, ConnectionState, NativeWebSocket, SyncEvent};
pub use tools::{ToolKind, ToolSettings};
