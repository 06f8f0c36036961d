//! Drawing tool selection and stroke style.

use serde::{Deserialize, Serialize};

/// Default brush color.
pub const DEFAULT_COLOR: &str = "#000000";
/// Default stroke width.
pub const DEFAULT_WIDTH: f64 = 5.0;
/// Stroke width bounds.
pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 50.0;

/// The color the eraser paints with.
const ERASER_COLOR: &str = "#ffffff";

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
}

/// The active tool and its stroke style.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Currently selected tool.
    pub tool: ToolKind,
    /// Active brush color (hex string, as carried on the wire).
    color: String,
    /// Active stroke width.
    width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            color: DEFAULT_COLOR.to_string(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl ToolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    /// Set the brush color.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Set the stroke width, clamped to the allowed range.
    pub fn set_width(&mut self, width: f64) {
        if width.is_finite() {
            self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        }
    }

    /// The configured brush color, regardless of tool.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// The color strokes are emitted with: the eraser substitutes opaque
    /// white for the active color.
    pub fn stroke_color(&self) -> &str {
        match self.tool {
            ToolKind::Brush => &self.color,
            ToolKind::Eraser => ERASER_COLOR,
        }
    }
}
