//! Linear undo/redo history over surface snapshots.

use crate::surface::Snapshot;

/// A linear history of rendering snapshots with a current index.
///
/// Every completed stroke or clear pushes the resulting snapshot; a push
/// after an undo discards the forward branch first. History is unbounded
/// and there is no snapshot compaction.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    index: usize,
}

impl History {
    /// Create a history seeded with the initial surface state.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
        }
    }

    /// Append a snapshot, discarding any redo branch.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one snapshot. Returns the snapshot to restore, or `None`
    /// at the start of history.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.snapshots[self.index])
    }

    /// Step forward one snapshot. Returns the snapshot to restore, or
    /// `None` at the end of history.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        Some(&self.snapshots[self.index])
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Number of snapshots currently held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// A history always holds at least the initial snapshot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The snapshot at the current index.
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{StrokeSegment, Surface};
    use kurbo::Point;

    fn snap(seed: u8) -> Snapshot {
        // Distinct snapshots via distinct single-pixel surfaces.
        let mut surface = Surface::new(2, 2, 1.0);
        let seg = StrokeSegment {
            from: Point::new(0.0, 0.0),
            to: Point::new(0.0, 0.0),
            color: format!("#{seed:02x}0000"),
            width: 1.0,
        };
        surface.draw_segment(&seg).unwrap();
        surface.snapshot()
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::new(snap(0));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut history = History::new(snap(0));
        history.push(snap(1));
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = History::new(snap(0));
        let s1 = snap(1);
        let s2 = snap(2);
        history.push(s1.clone());
        history.push(s2.clone());

        // Undo then redo N times lands back on the pre-undo snapshot.
        for _ in 0..3 {
            assert_eq!(history.undo(), Some(&s1));
            assert_eq!(history.redo(), Some(&s2));
        }
        assert_eq!(history.current(), &s2);
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = History::new(snap(0));
        history.push(snap(1));
        history.push(snap(2));

        history.undo();
        assert!(history.can_redo());

        let s3 = snap(3);
        history.push(s3.clone());
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), &s3);
    }
}
