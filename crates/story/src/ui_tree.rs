use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::list::ListItem;
use gpui_component::{h_flex, v_flex};
use gpui_ui_tree::{UiTreeEvent, UiTreeRowState, UiTreeState, ui_tree};
use ui_tree_core::{IndexEntry, Node, UiTreeConfig};

const INDENT: f32 = 20.;

pub struct UiTreeExample {
    tree: Entity<UiTreeState>,
    last_change: Option<String>,
    changes: usize,
}

impl UiTreeExample {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        let tree = cx.new(|cx| {
            UiTreeState::new(demo_tree(), cx).config(
                UiTreeConfig::default()
                    .indent_width(INDENT)
                    .row_height(28.),
            )
        });

        cx.new(|cx| {
            cx.subscribe(&tree, |this: &mut Self, _, event: &UiTreeEvent, cx| {
                let UiTreeEvent::Changed { parent, node } = event;
                this.changes += 1;
                this.last_change = Some(match (parent, node) {
                    (Some(parent), Some(node)) => format!("moved {} into {}", node.name, parent.name),
                    (None, Some(node)) => format!("moved {}", node.name),
                    _ => "collapse toggled".to_string(),
                });
                cx.notify();
            })
            .detach();

            Self {
                tree,
                last_change: None,
                changes: 0,
            }
        })
    }
}

impl Render for UiTreeExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let state = self.tree.read(cx);
        let tree_dump = serde_json::to_string_pretty(state.root())
            .unwrap_or_else(|err| format!("<unserializable: {err}>"));
        let selected = state
            .selected_node()
            .map(|node| node.name.clone())
            .unwrap_or_else(|| "<none>".to_string());
        let last_change = self
            .last_change
            .clone()
            .unwrap_or_else(|| "<none>".to_string());

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(div().text_xl().font_weight(FontWeight::BOLD).child("UI Tree"))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Tip: drag a row up or down to reorder it, right to nest it under the row above, left to lift it out of its parent (only from the last position). Dragging near the top or bottom edge scrolls. Click a caret to collapse or expand."),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("Selected: {selected}")),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("Changes: {} (last: {last_change})", self.changes)),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        v_flex()
                            .w(px(420.))
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child("Tree"))
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .child(ui_tree(&self.tree, move |ix, entry, node, row_state, _window, cx| {
                                        render_tree_row(ix, entry, node, row_state, cx)
                                    })),
                            ),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("Debug (tree as JSON)"),
                            )
                            .child(
                                div()
                                    .id("ui-tree-dump")
                                    .flex_1()
                                    .min_h(px(0.))
                                    .overflow_y_scroll()
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .p(px(12.))
                                    .child(render_tree_dump(tree_dump)),
                            ),
                    ),
            )
    }
}

fn render_tree_row(
    ix: usize,
    entry: &IndexEntry,
    node: &Node,
    row_state: UiTreeRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let label_color = if row_state.selected || entry.has_children() {
        theme.foreground
    } else {
        theme.muted_foreground
    };
    let label = if entry.has_children() && row_state.collapsed {
        format!("{} ({})", node.name, node.children.len())
    } else {
        node.name.clone()
    };

    ListItem::new(ix)
        .when(row_state.ghost, |this| this.opacity(0.9))
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .text_color(label_color)
                .when(entry.has_children(), |this| this.font_weight(FontWeight::MEDIUM))
                .child(label),
        )
}

fn render_tree_dump(text: String) -> impl IntoElement {
    let lines = text
        .lines()
        .map(|line| div().text_sm().child(line.to_string()));
    v_flex().gap_y_0p5().children(lines)
}

fn demo_tree() -> Node {
    Node::new("react-ui-tree")
        .child(
            Node::new("dist")
                .collapsed(true)
                .child(Node::new("node.js"))
                .child(Node::new("react-ui-tree.css"))
                .child(Node::new("react-ui-tree.js"))
                .child(Node::new("tree.js")),
        )
        .child(
            Node::new("example")
                .child(Node::new("app.js"))
                .child(Node::new("app.less"))
                .child(Node::new("index.html")),
        )
        .child(
            Node::new("lib")
                .child(Node::new("index.js"))
                .child(Node::new("node.js"))
                .child(Node::new("react-ui-tree.js"))
                .child(Node::new("react-ui-tree.less"))
                .child(Node::new("tree.js")),
        )
        .child(Node::new(".babelrc").leaf(true))
        .child(Node::new(".gitignore").leaf(true))
        .child(Node::new("index.js").leaf(true))
        .child(Node::new("package.json").leaf(true))
        .child(Node::new("readme.md").leaf(true).attr("size", 2048))
        .child(Node::new("webpack.config.js").leaf(true))
}
