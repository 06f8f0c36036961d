//! Flood-fill object erase.

use crate::color::Rgba;
use crate::surface::Surface;
use kurbo::Point;
use std::collections::HashSet;

/// Per-channel absolute difference under which a pixel counts as similar
/// to the start pixel.
const CHANNEL_TOLERANCE: i16 = 100;

/// Erase the connected region of non-background pixels around `start`.
///
/// `start` is in logical units and is scaled by the surface's device
/// pixel ratio. Traversal is an iterative 4-directional flood fill with
/// an explicit stack and a visited set, so cost is bounded by the erased
/// region size. Matched pixels are set to opaque white. Returns the
/// number of pixels erased.
///
/// Clicking empty background does nothing: the operation is a no-op when
/// the start pixel is already pure opaque white.
pub fn erase_region(surface: &mut Surface, start: Point) -> usize {
    let sx = start.x * surface.scale();
    let sy = start.y * surface.scale();
    if !sx.is_finite() || !sy.is_finite() || sx < 0.0 || sy < 0.0 {
        return 0;
    }
    let (sx, sy) = (sx.round() as u32, sy.round() as u32);

    let Some(start_pixel) = surface.pixel(sx, sy) else {
        return 0;
    };
    if start_pixel.is_opaque_white() {
        return 0;
    }

    let mut erased = 0;
    let mut stack = vec![(sx, sy)];
    let mut visited: HashSet<(u32, u32)> = HashSet::new();

    while let Some((x, y)) = stack.pop() {
        if !visited.insert((x, y)) {
            continue;
        }
        let Some(pixel) = surface.pixel(x, y) else {
            continue;
        };
        if !matches_start(pixel, start_pixel) {
            continue;
        }

        surface.set_pixel(x, y, Rgba::WHITE);
        erased += 1;

        if x > 0 {
            stack.push((x - 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        stack.push((x + 1, y));
        stack.push((x, y + 1));
    }

    erased
}

/// The erase match rule.
///
/// A pixel already at pure opaque white never matches. Otherwise it
/// matches when every channel is within tolerance of the start pixel, or
/// it is semi-transparent, or it is non-white at all. The last arm makes
/// the rule deliberately permissive: any connected mark touching the
/// start point is erased, color-similar or not.
fn matches_start(pixel: Rgba, start: Rgba) -> bool {
    if pixel.is_opaque_white() {
        return false;
    }
    channels_close(pixel, start) || pixel.a < 255 || !pixel.is_opaque_white()
}

fn channels_close(a: Rgba, b: Rgba) -> bool {
    (a.r as i16 - b.r as i16).abs() <= CHANNEL_TOLERANCE
        && (a.g as i16 - b.g as i16).abs() <= CHANNEL_TOLERANCE
        && (a.b as i16 - b.b as i16).abs() <= CHANNEL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::StrokeSegment;

    fn dot(surface: &mut Surface, x: f64, y: f64, color: &str, width: f64) {
        surface
            .draw_segment(&StrokeSegment {
                from: Point::new(x, y),
                to: Point::new(x, y),
                color: color.to_string(),
                width,
            })
            .unwrap();
    }

    #[test]
    fn test_erase_on_blank_canvas_is_noop() {
        let mut surface = Surface::new(20, 20, 1.0);
        let before = surface.snapshot();
        assert_eq!(erase_region(&mut surface, Point::new(10.0, 10.0)), 0);
        assert_eq!(surface.snapshot(), before);
    }

    #[test]
    fn test_erase_removes_isolated_region_only() {
        let mut surface = Surface::new(40, 20, 1.0);
        // Two well-separated dots.
        dot(&mut surface, 10.0, 10.0, "#000000", 6.0);
        dot(&mut surface, 30.0, 10.0, "#000000", 6.0);

        let erased = erase_region(&mut surface, Point::new(10.0, 10.0));
        assert!(erased > 0);

        // Left dot gone, right dot intact.
        assert_eq!(surface.pixel(10, 10), Some(Rgba::WHITE));
        assert_eq!(surface.pixel(30, 10), Some(Rgba::new(0, 0, 0, 255)));
    }

    #[test]
    fn test_erase_is_permissive_across_colors() {
        let mut surface = Surface::new(20, 20, 1.0);
        // Overlapping dots far apart in color space still form one
        // connected region.
        dot(&mut surface, 9.0, 10.0, "#000000", 6.0);
        dot(&mut surface, 12.0, 10.0, "#ff0000", 6.0);

        erase_region(&mut surface, Point::new(9.0, 10.0));

        assert_eq!(surface.pixel(9, 10), Some(Rgba::WHITE));
        assert_eq!(surface.pixel(12, 10), Some(Rgba::WHITE));
    }

    #[test]
    fn test_erase_scales_start_point() {
        let mut surface = Surface::new(20, 20, 2.0);
        dot(&mut surface, 10.0, 10.0, "#0000ff", 4.0);
        assert_ne!(surface.pixel(20, 20), Some(Rgba::WHITE));

        erase_region(&mut surface, Point::new(10.0, 10.0));
        assert_eq!(surface.pixel(20, 20), Some(Rgba::WHITE));
    }

    #[test]
    fn test_erase_outside_surface_is_noop() {
        let mut surface = Surface::new(10, 10, 1.0);
        dot(&mut surface, 5.0, 5.0, "#000000", 4.0);
        let before = surface.snapshot();
        assert_eq!(erase_region(&mut surface, Point::new(-3.0, 50.0)), 0);
        assert_eq!(surface.snapshot(), before);
    }
}
