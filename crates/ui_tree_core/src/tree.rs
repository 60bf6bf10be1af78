use std::rc::Rc;

use crate::config::UiTreeConfig;
use crate::error::{Result, TreeError};
use crate::gesture::PendingPress;
use crate::index::{FlatIndex, IndexEntry};
use crate::model::TreeModel;
use crate::mover::{Placement, Relocation};
use crate::node::{NodeId, TreeNode};
use crate::placer::DragState;
use crate::scroll::AutoScroller;

/// Payload of a change notification.
///
/// Completed drags report the moved node and its new parent; collapse toggles report
/// neither, meaning "the structure changed, nothing specific moved".
pub struct TreeChange<'a, N> {
    pub tree: &'a N,
    pub parent: Option<&'a N>,
    pub node: Option<&'a N>,
}

type IsCollapsedFn<N> = Rc<dyn Fn(&N) -> bool>;
type SetCollapsedFn<N> = Rc<dyn Fn(&mut N, bool)>;
type ChangeListener<N> = Box<dyn FnMut(TreeChange<'_, N>)>;

/// An indexed, draggable tree.
///
/// Owns the caller's nodes, the current [`FlatIndex`] and the drag/autoscroll state.
/// Every entry point takes `&mut self` and finishes its rebuild before returning, so
/// pointer updates and clock ticks are applied strictly one after another.
pub struct UiTree<N> {
    model: TreeModel<N>,
    index: Rc<FlatIndex>,
    pub(crate) config: UiTreeConfig,
    is_collapsed_hook: Option<IsCollapsedFn<N>>,
    set_collapsed_hook: Option<SetCollapsedFn<N>>,
    listener: Option<ChangeListener<N>>,
    pub(crate) drag: DragState,
    pub(crate) press: Option<PendingPress>,
    pub(crate) scroller: AutoScroller,
}

impl<N: TreeNode> UiTree<N> {
    pub fn new(root: N) -> Self {
        let model = TreeModel::new(root);
        let index = FlatIndex::build(&model, N::is_collapsed);
        Self {
            model,
            index: Rc::new(index),
            config: UiTreeConfig::default(),
            is_collapsed_hook: None,
            set_collapsed_hook: None,
            listener: None,
            drag: DragState::Idle,
            press: None,
            scroller: AutoScroller::default(),
        }
    }

    pub fn with_config(mut self, config: UiTreeConfig) -> Self {
        self.config = config.sanitized();
        self
    }

    /// Keep collapse state outside the nodes' own `collapsed` field.
    pub fn collapse_hooks(
        mut self,
        is_collapsed: impl Fn(&N) -> bool + 'static,
        set_collapsed: impl Fn(&mut N, bool) + 'static,
    ) -> Self {
        self.is_collapsed_hook = Some(Rc::new(is_collapsed));
        self.set_collapsed_hook = Some(Rc::new(set_collapsed));
        self.rebuild();
        self
    }

    /// Register the change listener, replacing any previous one.
    pub fn on_change(&mut self, listener: impl FnMut(TreeChange<'_, N>) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    #[inline]
    pub fn config(&self) -> &UiTreeConfig {
        &self.config
    }

    #[inline]
    pub fn root(&self) -> &N {
        self.model.root()
    }

    #[inline]
    pub fn model(&self) -> &TreeModel<N> {
        &self.model
    }

    pub fn into_root(self) -> N {
        self.model.into_root()
    }

    /// The current index snapshot. It stays valid, but goes stale, after the next edit.
    pub fn index(&self) -> Rc<FlatIndex> {
        Rc::clone(&self.index)
    }

    pub fn get(&self, id: NodeId) -> Option<&N> {
        self.index.get(&self.model, id)
    }

    pub fn entry(&self, id: NodeId) -> Option<&IndexEntry> {
        self.index.entry(id)
    }

    pub fn entry_by_top(&self, top: usize) -> Option<&IndexEntry> {
        self.index.entry_by_top(top)
    }

    /// Rendered rows in order, paired with the node each one draws.
    pub fn visible_rows(&self) -> impl Iterator<Item = (&IndexEntry, &N)> + '_ {
        self.index
            .rows()
            .filter_map(move |entry| Some((entry, self.model.node(&entry.path)?)))
    }

    pub fn is_collapsed(&self, id: NodeId) -> Option<bool> {
        self.get(id).map(|node| self.node_collapsed(node))
    }

    pub(crate) fn node_collapsed(&self, node: &N) -> bool {
        match &self.is_collapsed_hook {
            Some(hook) => hook(node),
            None => node.is_collapsed(),
        }
    }

    /// Set the collapse flag without notifying. Rebuilds only when the flag changes.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<()> {
        if self.is_collapsed(id).ok_or(TreeError::UnknownNode(id))? == collapsed {
            return Ok(());
        }
        let path = self.entry(id).ok_or(TreeError::UnknownNode(id))?.path.clone();
        let hook = self.set_collapsed_hook.clone();
        let node = self
            .model
            .node_mut(&path)
            .ok_or(TreeError::UnknownNode(id))?;
        match hook {
            Some(hook) => hook(node, collapsed),
            None => node.set_collapsed(collapsed),
        }
        self.rebuild();
        Ok(())
    }

    /// Flip a node's collapse flag, rebuild and notify. Returns the new flag.
    pub fn toggle_collapse(&mut self, id: NodeId) -> Result<bool> {
        let collapsed = !self.is_collapsed(id).ok_or(TreeError::UnknownNode(id))?;
        self.set_collapsed(id, collapsed)?;
        tracing::debug!(message = "ui_tree.toggle", node = %id, collapsed);
        self.notify(None, None);
        Ok(collapsed)
    }

    /// Relocate `id` relative to `anchor` and return its entry in the rebuilt index.
    ///
    /// `Ok(None)` is a no-op: moving the root, anchoring before/after the root, or
    /// anchoring a node on itself. Moves into the node's own subtree are rejected.
    pub fn move_node(
        &mut self,
        id: NodeId,
        anchor: NodeId,
        placement: Placement,
    ) -> Result<Option<IndexEntry>> {
        let plan = Relocation::plan(&self.model, &self.index, id, anchor, placement)
            .inspect_err(|err| {
                tracing::warn!(message = "ui_tree.move.rejected", node = %id, anchor = %anchor, ?placement, %err);
            })?;
        let Some(plan) = plan else {
            return Ok(None);
        };

        let path = plan.apply(&mut self.model);
        self.rebuild();
        let entry = path
            .and_then(|path| self.index.id_at_path(&path))
            .and_then(|id| self.index.entry(id))
            .cloned();

        let relocated = entry.as_ref().map(|entry| entry.id);
        tracing::debug!(message = "ui_tree.move", node = %id, anchor = %anchor, ?placement, ?relocated);
        Ok(entry)
    }

    /// Swap in a new root, e.g. after the host reloaded its data. Refused mid-drag.
    pub fn replace_root(&mut self, root: N) -> Result<N> {
        if self.is_dragging() {
            return Err(TreeError::DragInProgress);
        }
        let previous = std::mem::replace(&mut self.model, TreeModel::new(root));
        self.press = None;
        self.rebuild();
        Ok(previous.into_root())
    }

    pub(crate) fn rebuild(&mut self) {
        let generation = self.index.generation() + 1;
        let index = match &self.is_collapsed_hook {
            Some(hook) => FlatIndex::build_generation(&self.model, |node: &N| hook(node), generation),
            None => FlatIndex::build_generation(&self.model, N::is_collapsed, generation),
        };
        self.index = Rc::new(index);
    }

    pub(crate) fn notify(&mut self, parent: Option<NodeId>, node: Option<NodeId>) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        listener(TreeChange {
            tree: self.model.root(),
            parent: parent.and_then(|id| self.index.get(&self.model, id)),
            node: node.and_then(|id| self.index.get(&self.model, id)),
        });
    }
}
