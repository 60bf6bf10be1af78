use std::{cell::RefCell, rc::Rc, time::Instant};

use gpui::{
    App, Bounds, Context, Div, ElementId, Entity, EventEmitter, FocusHandle,
    InteractiveElement as _, IntoElement, MouseButton, MouseDownEvent, MouseMoveEvent,
    MouseUpEvent, ParentElement as _, Pixels, Render, RenderOnce, ScrollHandle, Stateful,
    StatefulInteractiveElement as _, StyleRefinement, Styled, Window, canvas, div,
    prelude::FluentBuilder as _, point, px,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use ui_tree_core::{
    IndexEntry, Node, NodeId, Point, PointerButton, Result, RowRect, UiTree, UiTreeConfig,
    Viewport,
};

const CONTEXT: &str = "UiTree";
const CARET_WIDTH: Pixels = px(16.);

type RenderItem = Rc<dyn Fn(usize, &IndexEntry, &Node, UiTreeRowState, &mut Window, &mut App) -> ListItem>;

/// Create a [`UiTreeView`].
pub fn ui_tree<R>(state: &Entity<UiTreeState>, render_item: R) -> UiTreeView
where
    R: Fn(usize, &IndexEntry, &Node, UiTreeRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    UiTreeView::new(state, render_item)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UiTreeRowState {
    pub selected: bool,
    /// The row is the drag placeholder left behind by the floating ghost.
    pub placeholder: bool,
    /// The row is the floating ghost itself.
    pub ghost: bool,
    pub collapsed: bool,
}

/// Emitted after a completed drag (`parent` and `node` set) or a collapse toggle
/// (both `None`). Read the new tree through [`UiTreeState::root`].
#[derive(Clone, Debug)]
pub enum UiTreeEvent {
    Changed {
        parent: Option<Node>,
        node: Option<Node>,
    },
}

/// [`Viewport`] over a gpui scroll container. gpui offsets grow negative as the
/// content scrolls up.
struct ScrollViewport {
    handle: ScrollHandle,
    content_height: f32,
    client_height: f32,
}

impl Viewport for ScrollViewport {
    fn scroll_top(&self) -> f32 {
        -f32::from(self.handle.offset().y)
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        let scroll_top = scroll_top.clamp(0.0, self.max_scroll_top());
        let offset = self.handle.offset();
        self.handle.set_offset(point(offset.x, px(-scroll_top)));
    }

    fn scroll_height(&self) -> f32 {
        self.content_height
    }

    fn client_height(&self) -> f32 {
        self.client_height
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => PointerButton::Middle,
    }
}

fn to_point(position: gpui::Point<Pixels>) -> Point {
    Point::new(position.x.into(), position.y.into())
}

/// State for an indented, draggable tree with collapsible rows.
pub struct UiTreeState {
    focus_handle: FocusHandle,
    tree: UiTree<Node>,
    scroll_handle: ScrollHandle,
    scrollbar_state: ScrollbarState,
    viewport_bounds: Bounds<Pixels>,
    clock: Instant,
    selected: Option<NodeId>,
    changes: Rc<RefCell<Vec<UiTreeEvent>>>,
    render_item: RenderItem,
}

impl EventEmitter<UiTreeEvent> for UiTreeState {}

impl UiTreeState {
    pub fn new(root: Node, cx: &mut App) -> Self {
        let changes: Rc<RefCell<Vec<UiTreeEvent>>> = Rc::default();
        let mut tree = UiTree::new(root);
        tree.on_change({
            let changes = Rc::clone(&changes);
            move |change| {
                changes.borrow_mut().push(UiTreeEvent::Changed {
                    parent: change.parent.cloned(),
                    node: change.node.cloned(),
                })
            }
        });

        Self {
            focus_handle: cx.focus_handle(),
            tree,
            scroll_handle: ScrollHandle::new(),
            scrollbar_state: ScrollbarState::default(),
            viewport_bounds: Bounds::default(),
            clock: Instant::now(),
            selected: None,
            changes,
            render_item: Rc::new(|ix, _, _, _, _, _| ListItem::new(ix)),
        }
    }

    /// Indentation per depth level, row height, drag threshold and autoscroll tuning.
    ///
    /// `indent_width` must match the indentation used by your row renderer.
    pub fn config(mut self, config: UiTreeConfig) -> Self {
        self.tree = self.tree.with_config(config);
        self
    }

    pub fn root(&self) -> &Node {
        self.tree.root()
    }

    pub fn tree(&self) -> &UiTree<Node> {
        &self.tree
    }

    /// Replace the whole tree. Refused while a drag is in progress.
    pub fn set_root(&mut self, root: Node, cx: &mut Context<Self>) -> Result<()> {
        self.tree.replace_root(root)?;
        self.selected = None;
        cx.notify();
        Ok(())
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.tree.get(self.selected?)
    }

    pub fn toggle_collapse(&mut self, id: NodeId, cx: &mut Context<Self>) {
        if let Err(err) = self.tree.toggle_collapse(id) {
            tracing::warn!(message = "ui_tree.view.toggle", node = %id, %err);
            return;
        }
        self.flush_changes(cx);
        cx.notify();
    }

    fn flush_changes(&mut self, cx: &mut Context<Self>) {
        let changes = std::mem::take(&mut *self.changes.borrow_mut());
        for change in changes {
            cx.emit(change);
        }
    }

    fn row_height(&self) -> f32 {
        self.tree.config().row_height
    }

    fn viewport(&self) -> ScrollViewport {
        ScrollViewport {
            handle: self.scroll_handle.clone(),
            content_height: self.tree.index().visible_len() as f32 * self.row_height(),
            client_height: self.viewport_bounds.size.height.into(),
        }
    }

    fn row_rect(&self, id: NodeId) -> Option<RowRect> {
        let entry = self.tree.entry(id)?;
        let row_height = self.row_height();
        Some(RowRect {
            x: entry.left.saturating_sub(1) as f32 * self.tree.config().indent_width,
            y: entry.top? as f32 * row_height,
            width: self.viewport_bounds.size.width.into(),
            height: row_height,
            extent: entry.height as f32 * row_height,
        })
    }

    fn on_row_mouse_down(&mut self, id: NodeId, event: &MouseDownEvent, cx: &mut Context<Self>) {
        self.tree
            .press(id, pointer_button(event.button), to_point(event.position));
        if event.button == MouseButton::Left {
            self.selected = Some(id);
            cx.notify();
        }
    }

    fn on_mouse_move(&mut self, event: &MouseMoveEvent, window: &mut Window, cx: &mut Context<Self>) {
        let pointer = to_point(event.position);
        if self.tree.is_dragging() {
            if event.pressed_button != Some(MouseButton::Left) {
                self.finish_drag(cx);
                return;
            }
            let viewport = self.viewport();
            if self.tree.drag_move(pointer, &viewport).is_some() {
                self.selected = self.tree.dragging_id();
                cx.notify();
            }
            return;
        }

        let Some(id) = self.tree.recognize_drag(pointer) else {
            return;
        };
        let Some(rect) = self.row_rect(id) else {
            return;
        };
        let viewport = self.viewport();
        if self.tree.drag_start(id, rect, pointer, &viewport) {
            self.clock = Instant::now();
            window.request_animation_frame();
            cx.notify();
        }
    }

    fn on_mouse_up(&mut self, event: &MouseUpEvent, cx: &mut Context<Self>) {
        if event.button != MouseButton::Left {
            return;
        }
        self.tree.release();
        if self.tree.is_dragging() {
            self.finish_drag(cx);
        }
    }

    fn finish_drag(&mut self, cx: &mut Context<Self>) {
        if let Some(outcome) = self.tree.drag_end() {
            self.selected = Some(outcome.node);
        }
        self.flush_changes(cx);
        cx.notify();
    }

    /// Drive autoscroll for the current frame.
    fn on_frame(&mut self, window: &mut Window) {
        if !self.tree.is_dragging() {
            return;
        }
        let mut viewport = self.viewport();
        if let Some(update) = self.tree.tick(self.clock.elapsed(), &mut viewport) {
            self.selected = Some(update.id);
        }
        window.request_animation_frame();
    }

    fn render_row(
        &self,
        entry: &IndexEntry,
        node: &Node,
        row_state: UiTreeRowState,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Stateful<Div> {
        let id = entry.id;
        let top = entry.top.unwrap_or_default();
        let indent = px(entry.left.saturating_sub(1) as f32 * self.tree.config().indent_width);
        let item = (self.render_item)(top, entry, node, row_state, window, cx);
        let placeholder_bg = cx.theme().drop_target;

        // Rows without children get no caret, only its width as padding.
        let caret = entry.has_children().then(|| {
            div()
                .id(("ui-tree-caret", top))
                .w(CARET_WIDTH)
                .flex_none()
                .text_xs()
                .child(if row_state.collapsed { "▸" } else { "▾" })
                .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                .on_click(cx.listener(move |this, _, _, cx| this.toggle_collapse(id, cx)))
        });
        let padding = if caret.is_some() {
            indent
        } else {
            indent + CARET_WIDTH
        };

        div()
            .id(("ui-tree-row", top))
            .h(px(self.row_height()))
            .pl(padding)
            .h_flex()
            .items_center()
            .when(row_state.placeholder, |this| this.bg(placeholder_bg).opacity(0.4))
            .when_some(caret, |this, caret| this.child(caret))
            .child(div().flex_1().min_w(px(0.)).child(item.selected(row_state.selected)))
            .on_any_mouse_down(cx.listener(move |this, event: &MouseDownEvent, _, cx| {
                this.on_row_mouse_down(id, event, cx);
            }))
    }
}

impl Render for UiTreeState {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.on_frame(window);

        let index = self.tree.index();
        let dragging = self.tree.dragging_id();
        let mut rows = Vec::with_capacity(index.visible_len());
        for entry in index.rows() {
            let Some(node) = self.tree.get(entry.id) else {
                continue;
            };
            let row_state = UiTreeRowState {
                selected: self.selected == Some(entry.id),
                placeholder: dragging == Some(entry.id),
                ghost: false,
                collapsed: self.tree.is_collapsed(entry.id).unwrap_or_default(),
            };
            rows.push(self.render_row(entry, node, row_state, window, cx));
        }

        let ghost = self.tree.drag_ghost().and_then(|ghost| {
            let entry = index.entry(ghost.id)?;
            let node = self.tree.get(ghost.id)?;
            let row_state = UiTreeRowState {
                selected: true,
                placeholder: false,
                ghost: true,
                collapsed: self.tree.is_collapsed(ghost.id).unwrap_or_default(),
            };
            let item = (self.render_item)(entry.top.unwrap_or_default(), entry, node, row_state, window, cx);
            let theme = cx.theme();
            Some(
                div()
                    .absolute()
                    .left(px(ghost.position.x))
                    .top(px(ghost.position.y))
                    .w(px(ghost.width))
                    .h(px(ghost.height))
                    .rounded(px(6.))
                    .bg(theme.popover)
                    .border_1()
                    .border_color(theme.border)
                    .shadow_md()
                    .child(item),
            )
        });

        let state = cx.entity();
        let content_height = px(index.visible_len() as f32 * self.row_height());

        div()
            .id("ui-tree-state")
            .size_full()
            .relative()
            .child(
                div()
                    .id("ui-tree-scroll")
                    .size_full()
                    .overflow_y_scroll()
                    .track_scroll(&self.scroll_handle)
                    .child(
                        div()
                            .relative()
                            .min_h(content_height)
                            .children(rows)
                            .when_some(ghost, |this, ghost| this.child(ghost)),
                    ),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::vertical(&self.scrollbar_state, &self.scroll_handle)),
            )
            .child(
                canvas(
                    |bounds, _, _| bounds,
                    move |_, bounds, window, cx| {
                        state.update(cx, |this, _| this.viewport_bounds = bounds);

                        window.on_mouse_event({
                            let state = state.clone();
                            move |event: &MouseMoveEvent, phase, window, cx| {
                                if !phase.bubble() {
                                    return;
                                }
                                state.update(cx, |this, cx| this.on_mouse_move(event, window, cx));
                            }
                        });
                        window.on_mouse_event({
                            let state = state.clone();
                            move |event: &MouseUpEvent, phase, _, cx| {
                                if !phase.bubble() {
                                    return;
                                }
                                state.update(cx, |this, cx| this.on_mouse_up(event, cx));
                            }
                        });
                    },
                )
                .absolute()
                .size_full(),
            )
    }
}

/// A draggable tree view element.
#[derive(IntoElement)]
pub struct UiTreeView {
    id: ElementId,
    state: Entity<UiTreeState>,
    style: StyleRefinement,
    render_item: RenderItem,
}

impl UiTreeView {
    pub fn new<R>(state: &Entity<UiTreeState>, render_item: R) -> Self
    where
        R: Fn(usize, &IndexEntry, &Node, UiTreeRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("ui-tree-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(render_item),
        }
    }
}

impl Styled for UiTreeView {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for UiTreeView {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_to_pointer_buttons() {
        assert_eq!(pointer_button(MouseButton::Left), PointerButton::Primary);
        assert_eq!(pointer_button(MouseButton::Right), PointerButton::Secondary);
        assert_eq!(pointer_button(MouseButton::Middle), PointerButton::Middle);
    }

    #[test]
    fn scroll_viewport_inverts_gpui_offsets() {
        let handle = ScrollHandle::new();
        handle.set_offset(point(px(0.), px(-40.)));
        let mut viewport = ScrollViewport {
            handle: handle.clone(),
            content_height: 280.0,
            client_height: 100.0,
        };
        assert_eq!(viewport.scroll_top(), 40.0);

        viewport.set_scroll_top(500.0);
        assert_eq!(handle.offset().y, px(-180.));
        viewport.set_scroll_top(-10.0);
        assert_eq!(handle.offset().y, px(0.));
    }
}
