//! The drawing surface: an RGBA pixel buffer strokes are rendered into.

use crate::color::Rgba;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single emitted draw event: one segment of a freehand stroke.
///
/// Wire shape: `{from:{x,y}, to:{x,y}, color, width}`. Coordinates are in
/// the sender's logical units; the receiver applies its own scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeSegment {
    #[serde(with = "point_xy")]
    pub from: Point,
    #[serde(with = "point_xy")]
    pub to: Point,
    pub color: String,
    pub width: f64,
}

/// Points cross the wire as `{x, y}` objects, independent of how the
/// geometry crate chooses to serialize itself.
mod point_xy {
    use kurbo::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f64,
        y: f64,
    }

    pub fn serialize<S: Serializer>(point: &Point, serializer: S) -> Result<S::Ok, S::Error> {
        Xy {
            x: point.x,
            y: point.y,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Point, D::Error> {
        let xy = Xy::deserialize(deserializer)?;
        Ok(Point::new(xy.x, xy.y))
    }
}

/// An opaque captured bitmap of the whole surface at one instant.
///
/// Only used for local undo/redo; never transmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pixels: Vec<u8>,
}

/// Rendering faults raised by malformed input.
///
/// These are recoverable: the caller drops the offending frame and keeps
/// going.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unparseable stroke color: {0:?}")]
    BadColor(String),
    #[error("stroke width must be positive and finite, got {0}")]
    BadWidth(f64),
}

/// An RGBA8 pixel buffer sized `logical size x scale factor`.
///
/// `scale` is the device pixel ratio. All drawing input arrives in
/// logical units and is scaled here. Remote segments are scaled by the
/// *receiving* surface's factor, not the sender's, so peers with
/// different device pixel ratios see strokes at different physical
/// positions. Known fidelity gap, kept as-is.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    scale: f64,
    pixels: Vec<u8>,
}

impl Surface {
    /// Create a white surface of the given logical size and scale factor.
    pub fn new(logical_width: u32, logical_height: u32, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let width = ((logical_width as f64) * scale).round().max(1.0) as u32;
        let height = ((logical_height as f64) * scale).round().max(1.0) as u32;
        let mut surface = Self {
            width,
            height,
            scale,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        surface.clear();
        surface
    }

    /// Device pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Device pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device pixel ratio applied to incoming coordinates.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Raw RGBA buffer, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill the whole surface with opaque white.
    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[255, 255, 255, 255]);
        }
    }

    /// Read the pixel at device coordinates, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Write the pixel at device coordinates. Out-of-bounds writes are
    /// ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i] = color.r;
        self.pixels[i + 1] = color.g;
        self.pixels[i + 2] = color.b;
        self.pixels[i + 3] = color.a;
    }

    /// Render a stroke segment with round caps.
    ///
    /// Coordinates and width are scaled by this surface's device pixel
    /// ratio. A malformed color or width is a recoverable fault: nothing
    /// is drawn and the caller decides whether to drop the frame.
    pub fn draw_segment(&mut self, segment: &StrokeSegment) -> Result<(), RenderError> {
        let color = Rgba::parse(&segment.color)
            .ok_or_else(|| RenderError::BadColor(segment.color.clone()))?;
        if !segment.width.is_finite() || segment.width <= 0.0 {
            return Err(RenderError::BadWidth(segment.width));
        }

        let ax = segment.from.x * self.scale;
        let ay = segment.from.y * self.scale;
        let bx = segment.to.x * self.scale;
        let by = segment.to.y * self.scale;
        if !(ax.is_finite() && ay.is_finite() && bx.is_finite() && by.is_finite()) {
            // Treat non-finite coordinates like any other malformed frame.
            return Ok(());
        }

        // Round caps fall out of a capsule coverage test: a pixel is part
        // of the stroke when its center lies within half a width of the
        // segment. Thin strokes still need at least a one-pixel core.
        let radius = ((segment.width * self.scale) / 2.0).max(0.5);

        let min_x = (ax.min(bx) - radius).floor().max(0.0) as u32;
        let min_y = (ay.min(by) - radius).floor().max(0.0) as u32;
        let max_x = (ax.max(bx) + radius).ceil().min(self.width as f64 - 1.0);
        let max_y = (ay.max(by) + radius).ceil().min(self.height as f64 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return Ok(());
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        let r2 = radius * radius;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                if dist_sq_to_segment(px, py, ax, ay, bx, by) <= r2 {
                    self.set_pixel(x, y, color);
                }
            }
        }
        Ok(())
    }

    /// Capture the current pixel buffer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pixels: self.pixels.clone(),
        }
    }

    /// Restore a previously captured snapshot.
    ///
    /// Snapshots are only valid for the surface they were captured from;
    /// a size mismatch is ignored.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if snapshot.pixels.len() == self.pixels.len() {
            self.pixels.copy_from_slice(&snapshot.pixels);
        } else {
            log::warn!(
                "snapshot size {} does not match surface buffer {}",
                snapshot.pixels.len(),
                self.pixels.len()
            );
        }
    }
}

/// Squared distance from `(px, py)` to the segment `(ax, ay)..(bx, by)`.
fn dist_sq_to_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}
