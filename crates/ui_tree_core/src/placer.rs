use std::time::Duration;

use crate::geometry::{Point, RowRect, Viewport};
use crate::gesture::{PendingPress, PointerButton};
use crate::index::IndexEntry;
use crate::mover::Placement;
use crate::node::{NodeId, TreeNode};
use crate::tree::UiTree;

/// Geometry captured when a drag starts, plus the live virtual position.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DragSession {
    id: NodeId,
    rect: RowRect,
    pointer_origin: Point,
    scroll_origin: f32,
    content_height: f32,
    position: Point,
    last_pointer: Point,
}

impl DragSession {
    /// Where the dragged row would sit in content coordinates, scroll included.
    /// Never lets the subtree hang past the end of the content.
    fn virtual_position(&self, pointer: Point, viewport: &dyn Viewport) -> Point {
        let x = self.rect.x + pointer.x - self.pointer_origin.x;
        let y = self.rect.y + pointer.y + viewport.scroll_top()
            - self.pointer_origin.y
            - self.scroll_origin;
        let max_y = (self.content_height - self.rect.extent).max(0.0);
        Point::new(x, y.min(max_y))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalEdit {
    Outdent,
    Indent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalEdit {
    Up,
    Down,
}

/// Result of one pointer or clock update during a drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragUpdate {
    /// Id of the dragged node in the current index.
    pub id: NodeId,
    pub position: Point,
    pub horizontal: Option<HorizontalEdit>,
    pub vertical: Option<VerticalEdit>,
    pub scroll_velocity: f32,
}

impl DragUpdate {
    pub fn moved(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }
}

/// Where the dragged node ended up once the drag finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragOutcome {
    pub node: NodeId,
    pub parent: Option<NodeId>,
}

/// Floating copy of the dragged row, in content coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGhost {
    pub id: NodeId,
    pub position: Point,
    pub width: f32,
    pub height: f32,
}

fn horizontal_intent(x: f32, left: usize, indent: f32) -> Option<HorizontalEdit> {
    let dx = x - left.saturating_sub(1) as f32 * indent;
    if dx < -indent / 2.0 {
        Some(HorizontalEdit::Outdent)
    } else if dx > indent / 2.0 {
        Some(HorizontalEdit::Indent)
    } else {
        None
    }
}

fn vertical_intent(y: f32, top: usize, row_height: f32) -> Option<VerticalEdit> {
    let dy = y - top as f32 * row_height;
    if dy < -row_height / 2.0 {
        Some(VerticalEdit::Up)
    } else if dy > row_height / 2.0 {
        Some(VerticalEdit::Down)
    } else {
        None
    }
}

impl<N: TreeNode> UiTree<N> {
    /// Record a pointer press on a row. Only the primary button can start a drag.
    pub fn press(&mut self, id: NodeId, button: PointerButton, position: Point) {
        self.press = (self.config.draggable
            && button == PointerButton::Primary
            && !id.is_root()
            && !self.is_dragging())
        .then_some(PendingPress {
            id,
            origin: position,
        });
    }

    /// Returns the pressed node once the pointer travelled past the drag threshold.
    /// The press is consumed; follow up with [`UiTree::drag_start`].
    pub fn recognize_drag(&mut self, position: Point) -> Option<NodeId> {
        let press = self.press?;
        if !press.exceeds(position, self.config.drag_threshold) {
            return None;
        }
        self.press = None;
        Some(press.id)
    }

    /// Forget a press that never became a drag.
    pub fn release(&mut self) {
        self.press = None;
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging(_))
    }

    pub fn dragging_id(&self) -> Option<NodeId> {
        match &self.drag {
            DragState::Dragging(session) => Some(session.id),
            DragState::Idle => None,
        }
    }

    pub fn drag_ghost(&self) -> Option<DragGhost> {
        let DragState::Dragging(session) = &self.drag else {
            return None;
        };
        Some(DragGhost {
            id: session.id,
            position: session.position,
            width: session.rect.width,
            height: session.rect.height,
        })
    }

    /// Current autoscroll speed in pixels per second.
    pub fn scroll_velocity(&self) -> f32 {
        self.scroller.velocity()
    }

    /// Begin dragging `id`, whose row currently occupies `rect`.
    ///
    /// Refused for the root, hidden or unknown nodes, while another drag runs, and
    /// when dragging is disabled.
    pub fn drag_start(
        &mut self,
        id: NodeId,
        rect: RowRect,
        pointer: Point,
        viewport: &dyn Viewport,
    ) -> bool {
        if !self.config.draggable || id.is_root() || self.is_dragging() {
            return false;
        }
        if !self.entry(id).is_some_and(|entry| entry.is_visible()) {
            return false;
        }

        let height = if rect.height.is_finite() && rect.height > 0.0 {
            rect.height
        } else {
            self.config.row_height
        };
        let rect = RowRect {
            height,
            extent: rect.extent.max(height),
            ..rect
        };

        self.press = None;
        self.drag = DragState::Dragging(DragSession {
            id,
            rect,
            pointer_origin: pointer,
            scroll_origin: viewport.scroll_top(),
            content_height: viewport.scroll_height(),
            position: Point::new(rect.x, rect.y),
            last_pointer: pointer,
        });
        self.scroller.start();

        tracing::debug!(message = "ui_tree.drag.start", node = %id, x = rect.x, y = rect.y);
        true
    }

    /// Feed a pointer position while dragging.
    pub fn drag_move(&mut self, pointer: Point, viewport: &dyn Viewport) -> Option<DragUpdate> {
        self.apply_position(Some(pointer), viewport)
    }

    /// Advance autoscroll. When the viewport scrolled, the last pointer position is
    /// re-applied so the drag keeps tracking the content under it.
    pub fn tick(&mut self, now: Duration, viewport: &mut dyn Viewport) -> Option<DragUpdate> {
        if !self.is_dragging() {
            return None;
        }
        self.scroller.tick(now, viewport)?;
        self.apply_position(None, &*viewport)
    }

    /// Finish the drag and notify the listener once with the node's final place.
    pub fn drag_end(&mut self) -> Option<DragOutcome> {
        let DragState::Dragging(session) = std::mem::take(&mut self.drag) else {
            return None;
        };
        self.scroller.stop();
        self.press = None;

        let Some(entry) = self.entry(session.id) else {
            tracing::warn!(message = "ui_tree.drag.lost", node = %session.id);
            return None;
        };
        let outcome = DragOutcome {
            node: entry.id,
            parent: entry.parent,
        };

        tracing::debug!(message = "ui_tree.drag.end", node = %outcome.node, parent = ?outcome.parent);
        self.notify(outcome.parent, Some(outcome.node));
        Some(outcome)
    }

    fn apply_position(
        &mut self,
        pointer: Option<Point>,
        viewport: &dyn Viewport,
    ) -> Option<DragUpdate> {
        let DragState::Dragging(session) = &self.drag else {
            return None;
        };
        let mut session = session.clone();
        if let Some(pointer) = pointer {
            session.last_pointer = pointer;
        }
        session.position = session.virtual_position(session.last_pointer, viewport);

        let collapsed = self.is_collapsed(session.id)?;
        let mut update = DragUpdate {
            id: session.id,
            position: session.position,
            horizontal: None,
            vertical: None,
            scroll_velocity: 0.0,
        };

        let entry = self.entry(session.id)?.clone();
        match horizontal_intent(session.position.x, entry.left, self.config.indent_width) {
            Some(HorizontalEdit::Outdent) => {
                if let (Some(parent), None) = (entry.parent, entry.next)
                    && let Some(id) = self.relocate_dragged(session.id, parent, Placement::After, collapsed)
                {
                    session.id = id;
                    update.horizontal = Some(HorizontalEdit::Outdent);
                }
            }
            Some(HorizontalEdit::Indent) => {
                if let Some(prev) = entry.prev
                    && self.accepts_children(prev)
                    && let Some(id) = self.relocate_dragged(session.id, prev, Placement::Prepend, collapsed)
                {
                    session.id = id;
                    update.horizontal = Some(HorizontalEdit::Indent);
                }
            }
            None => {}
        }

        let entry = self.entry(session.id)?.clone();
        let intent = entry
            .top
            .and_then(|top| vertical_intent(session.position.y, top, session.rect.height));
        match intent {
            Some(VerticalEdit::Up) => {
                let above = self.index().rendered_above(session.id).map(|above| above.id);
                if let Some(above) = above
                    && let Some(id) = self.relocate_dragged(session.id, above, Placement::Before, collapsed)
                {
                    session.id = id;
                    update.vertical = Some(VerticalEdit::Up);
                }
            }
            Some(VerticalEdit::Down) => {
                if let Some((target, placement)) = self.drop_below(&entry)
                    && let Some(id) = self.relocate_dragged(session.id, target, placement, collapsed)
                {
                    session.id = id;
                    update.vertical = Some(VerticalEdit::Down);
                }
            }
            None => {}
        }
        update.id = session.id;

        let viewport_top = viewport.scroll_top();
        let margin = self.config.scroll_margin;
        let speed = self.config.scroll_speed;
        let velocity = if session.position.y + session.rect.extent
            > viewport_top + viewport.client_height() - margin
        {
            speed
        } else if session.position.y < viewport_top + margin {
            -speed
        } else {
            0.0
        };
        self.scroller.set_velocity(velocity);
        update.scroll_velocity = velocity;

        if update.moved() {
            tracing::debug!(
                message = "ui_tree.drag.place",
                node = %update.id,
                horizontal = ?update.horizontal,
                vertical = ?update.vertical
            );
        }
        self.drag = DragState::Dragging(session);
        Some(update)
    }

    /// Target for a downward step: the next sibling when there is one, otherwise the
    /// row drawn below the dragged subtree unless that is the node's own parent.
    /// Expanded containers are entered as first child.
    fn drop_below(&self, entry: &IndexEntry) -> Option<(NodeId, Placement)> {
        let index = self.index();
        let target = match entry.next {
            Some(next) => next,
            None => index
                .rendered_below(entry.id)
                .map(|below| below.id)
                .filter(|below| Some(*below) != entry.parent)?,
        };
        let placement = if index.entry(target)?.has_children() && self.accepts_children(target) {
            Placement::Prepend
        } else {
            Placement::After
        };
        Some((target, placement))
    }

    fn accepts_children(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|node| !node.is_leaf() && !self.node_collapsed(node))
    }

    /// Move the dragged node and restore its collapse flag, which a host-side hook
    /// may have keyed on the old position. Returns the node's new id.
    fn relocate_dragged(
        &mut self,
        id: NodeId,
        anchor: NodeId,
        placement: Placement,
        collapsed: bool,
    ) -> Option<NodeId> {
        let entry = match self.move_node(id, anchor, placement) {
            Ok(entry) => entry?,
            Err(err) => {
                tracing::debug!(message = "ui_tree.drag.skip", node = %id, anchor = %anchor, %err);
                return None;
            }
        };
        if self.is_collapsed(entry.id) != Some(collapsed)
            && let Err(err) = self.set_collapsed(entry.id, collapsed)
        {
            tracing::warn!(message = "ui_tree.drag.collapse", node = %entry.id, %err);
        }
        Some(entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_thresholds_are_half_an_indent() {
        assert_eq!(horizontal_intent(20.0, 2, 20.0), None);
        assert_eq!(horizontal_intent(9.0, 2, 20.0), Some(HorizontalEdit::Outdent));
        assert_eq!(horizontal_intent(31.0, 2, 20.0), Some(HorizontalEdit::Indent));
        assert_eq!(horizontal_intent(10.0, 2, 20.0), None);
    }

    #[test]
    fn vertical_thresholds_are_half_a_row() {
        assert_eq!(vertical_intent(56.0, 2, 28.0), None);
        assert_eq!(vertical_intent(41.0, 2, 28.0), Some(VerticalEdit::Up));
        assert_eq!(vertical_intent(71.0, 2, 28.0), Some(VerticalEdit::Down));
    }

    #[test]
    fn virtual_position_follows_scroll_and_clamps() {
        let session = DragSession {
            id: NodeId::ROOT,
            rect: RowRect {
                x: 20.0,
                y: 56.0,
                width: 200.0,
                height: 28.0,
                extent: 84.0,
            },
            pointer_origin: Point::new(40.0, 60.0),
            scroll_origin: 0.0,
            content_height: 280.0,
            position: Point::default(),
            last_pointer: Point::new(40.0, 60.0),
        };
        let viewport = crate::geometry::ViewportMetrics::new(30.0, 280.0, 100.0);
        let position = session.virtual_position(Point::new(35.0, 70.0), &viewport);
        assert_eq!(position, Point::new(15.0, 96.0));

        let position = session.virtual_position(Point::new(40.0, 500.0), &viewport);
        assert_eq!(position.y, 196.0);
    }
}
