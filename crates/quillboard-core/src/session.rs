//! The client session: local state plus replication.
//!
//! Every local action applies immediately (local echo) and, when the
//! connection readiness flag is set, enqueues a fire-and-forget event for
//! the transport to drain. Remote events received from the relay are
//! applied back into local state. Edits made while disconnected are never
//! replicated retroactively.

use crate::erase::erase_region;
use crate::history::History;
use crate::surface::{StrokeSegment, Surface};
use crate::sync::{BoardEvent, NativeWebSocket, SyncEvent};
use crate::tools::ToolSettings;
use kurbo::Point;

/// An in-progress stroke's rolling last point.
#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    last: Point,
}

/// A client session over one drawing surface and one shared text.
#[derive(Debug)]
pub struct Session {
    surface: Surface,
    history: History,
    tools: ToolSettings,
    shared_text: String,
    stroke: Option<ActiveStroke>,
    /// Readiness flag: emits are skipped until the transport reports a
    /// connection.
    connected: bool,
    /// Pending outgoing events, drained by the transport.
    outgoing: Vec<BoardEvent>,
}

impl Session {
    /// Create a session with a white surface of the given logical size
    /// and device pixel ratio. History starts with the blank snapshot.
    pub fn new(logical_width: u32, logical_height: u32, scale: f64) -> Self {
        let surface = Surface::new(logical_width, logical_height, scale);
        let history = History::new(surface.snapshot());
        Self {
            surface,
            history,
            tools: ToolSettings::new(),
            shared_text: String::new(),
            stroke: None,
            connected: false,
            outgoing: Vec::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn tools(&mut self) -> &mut ToolSettings {
        &mut self.tools
    }

    pub fn shared_text(&self) -> &str {
        &self.shared_text
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // --- Pointer input ---

    /// Begin a stroke at the given point.
    pub fn pointer_down(&mut self, point: Point) {
        self.stroke = Some(ActiveStroke { last: point });
    }

    /// Extend the active stroke to the given point.
    ///
    /// Renders the segment immediately, emits it if connected, and rolls
    /// the last point forward. No-op when no stroke is active.
    pub fn pointer_move(&mut self, point: Point) {
        let Some(stroke) = self.stroke else {
            return;
        };
        let segment = StrokeSegment {
            from: stroke.last,
            to: point,
            color: self.tools.stroke_color().to_string(),
            width: self.tools.width(),
        };
        if let Err(e) = self.surface.draw_segment(&segment) {
            log::warn!("dropping local segment: {}", e);
        }
        self.emit(BoardEvent::DrawLine(segment));
        self.stroke = Some(ActiveStroke { last: point });
    }

    /// Finish the active stroke and push a snapshot.
    ///
    /// Also called when the pointer leaves the surface.
    pub fn pointer_up(&mut self) {
        if self.stroke.take().is_some() {
            self.history.push(self.surface.snapshot());
        }
    }

    /// Whether a stroke is currently active.
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    // --- Canvas operations ---

    /// Clear the canvas and replicate the clear.
    pub fn clear(&mut self) {
        self.apply_clear();
        self.emit(BoardEvent::ClearCanvas);
    }

    /// Flood-fill erase the mark at `point` and replicate the erase.
    pub fn erase_at(&mut self, point: Point) {
        erase_region(&mut self.surface, point);
        self.emit(BoardEvent::ObjectErase {
            x: point.x,
            y: point.y,
        });
    }

    /// Step back one snapshot. Returns false at the start of history.
    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.history.undo() {
            let snapshot = snapshot.clone();
            self.surface.restore(&snapshot);
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. Returns false at the end of history.
    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.history.redo() {
            let snapshot = snapshot.clone();
            self.surface.restore(&snapshot);
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Shared text ---

    /// Replace the shared text from local input and replicate it.
    pub fn text_changed(&mut self, text: impl Into<String>) {
        self.shared_text = text.into();
        self.emit(BoardEvent::TextUpdate {
            text: self.shared_text.clone(),
        });
    }

    // --- Replication ---

    /// Apply an event received from the relay.
    ///
    /// Remote segments render under this surface's own scale factor;
    /// malformed payloads are dropped with a warning.
    pub fn apply_remote(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::DrawLine(segment) => {
                if let Err(e) = self.surface.draw_segment(&segment) {
                    log::warn!("ignoring remote segment: {}", e);
                }
            }
            BoardEvent::TextUpdate { text } => {
                // Last arrival wins.
                self.shared_text = text;
            }
            BoardEvent::ClearCanvas => {
                self.apply_clear();
            }
            BoardEvent::ObjectErase { x, y } => {
                erase_region(&mut self.surface, Point::new(x, y));
            }
        }
    }

    /// Feed a transport event into the session: tracks the readiness
    /// flag and applies replicated board events.
    pub fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Connected => self.connected = true,
            SyncEvent::Disconnected => self.connected = false,
            SyncEvent::Event(board_event) => self.apply_remote(board_event),
            SyncEvent::Error { message } => {
                log::warn!("relay error: {}", message);
            }
        }
    }

    /// Pump the transport once: apply everything received, then flush
    /// pending local events onto the wire. Intended to be called from
    /// the application's frame loop.
    pub fn pump(&mut self, ws: &mut NativeWebSocket) {
        for event in ws.poll_events() {
            self.handle_sync_event(event);
        }
        for event in self.take_outgoing() {
            if let Err(e) = ws.send(&event) {
                log::warn!("dropping outgoing event: {}", e);
            }
        }
    }

    /// Take all pending outgoing events for the transport to send.
    pub fn take_outgoing(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.outgoing)
    }

    /// Check if there are pending outgoing events.
    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    fn emit(&mut self, event: BoardEvent) {
        if self.connected {
            self.outgoing.push(event);
        }
    }

    /// Clear locally and record the snapshot; shared by the local and
    /// remote clear paths.
    fn apply_clear(&mut self) {
        self.surface.clear();
        self.history.push(self.surface.snapshot());
    }
}
