use crate::geometry::Point;
use crate::node::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A pressed row that has not moved far enough to count as a drag yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PendingPress {
    pub(crate) id: NodeId,
    pub(crate) origin: Point,
}

impl PendingPress {
    /// A press becomes a drag once either axis travels `threshold` pixels.
    pub(crate) fn exceeds(&self, position: Point, threshold: f32) -> bool {
        let dx = (position.x - self.origin.x).abs();
        let dy = (position.y - self.origin.y).abs();
        dx >= threshold || dy >= threshold
    }
}
