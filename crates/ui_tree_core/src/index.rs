use crate::model::{Path, TreeModel};
use crate::node::{NodeId, TreeNode};

/// Positional metadata for one node, valid for the [`FlatIndex`] generation it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Previous sibling. Never crosses into another parent.
    pub prev: Option<NodeId>,
    /// Next sibling. Never crosses into another parent.
    pub next: Option<NodeId>,
    /// Depth, with the root at 1.
    pub left: usize,
    /// Rendered row, or `None` while an ancestor is collapsed.
    pub top: Option<usize>,
    /// Rendered rows covered by this node and its expanded descendants.
    pub height: usize,
    /// Where the node lives in the [`TreeModel`].
    pub path: Path,
}

impl IndexEntry {
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.top.is_some()
    }
}

/// Flattened, read-only view of a [`TreeModel`].
///
/// An index is never patched: every mutation builds a new one and bumps the
/// generation, so a snapshot held elsewhere stays internally consistent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    rows: Vec<NodeId>,
    generation: u64,
}

/// Slot of an id handed out by the walk below, which only mints ids from slots.
fn built_slot(id: NodeId) -> usize {
    id.get() as usize - 1
}

impl FlatIndex {
    pub fn build<N: TreeNode>(model: &TreeModel<N>, is_collapsed: impl Fn(&N) -> bool) -> Self {
        Self::build_generation(model, is_collapsed, 0)
    }

    pub(crate) fn build_generation<N: TreeNode>(
        model: &TreeModel<N>,
        is_collapsed: impl Fn(&N) -> bool,
        generation: u64,
    ) -> Self {
        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut collapsed: Vec<bool> = Vec::new();

        // Pre-order walk. Children are pushed in reverse so they pop in order, which
        // also makes each parent's `children` list come out in model order.
        let mut stack: Vec<(&N, Option<NodeId>, Path)> = vec![(model.root(), None, Vec::new())];
        while let Some((node, parent, path)) = stack.pop() {
            let id = NodeId::from_slot(entries.len());
            let left = match parent {
                Some(parent) => entries[built_slot(parent)].left + 1,
                None => 1,
            };
            if let Some(parent) = parent {
                entries[built_slot(parent)].children.push(id);
            }

            for (ix, child) in node.children().iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(ix);
                stack.push((child, Some(id), child_path));
            }

            collapsed.push(is_collapsed(node));
            entries.push(IndexEntry {
                id,
                parent,
                children: Vec::new(),
                prev: None,
                next: None,
                left,
                top: None,
                height: 1,
                path,
            });
        }

        for slot in 0..entries.len() {
            let children = std::mem::take(&mut entries[slot].children);
            for (ix, child) in children.iter().enumerate() {
                let entry = &mut entries[built_slot(*child)];
                entry.prev = ix.checked_sub(1).map(|prev| children[prev]);
                entry.next = children.get(ix + 1).copied();
            }
            entries[slot].children = children;
        }

        // Ids are pre-order, so walking them backwards visits children before parents.
        for slot in (0..entries.len()).rev() {
            if collapsed[slot] || entries[slot].children.is_empty() {
                entries[slot].height = 1;
                continue;
            }
            let height = entries[slot]
                .children
                .iter()
                .map(|child| entries[built_slot(*child)].height)
                .sum::<usize>();
            entries[slot].height = 1 + height;
        }

        // Pre-order restricted to rendered nodes is exactly the render order.
        let mut rows = Vec::new();
        for slot in 0..entries.len() {
            let rendered = match entries[slot].parent {
                None => true,
                Some(parent) => {
                    entries[built_slot(parent)].top.is_some() && !collapsed[built_slot(parent)]
                }
            };
            if rendered {
                entries[slot].top = Some(rows.len());
                rows.push(entries[slot].id);
            }
        }

        tracing::trace!(
            message = "ui_tree.index.rebuild",
            generation,
            nodes = entries.len(),
            rows = rows.len()
        );

        Self {
            entries,
            rows,
            generation,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of indexed nodes, hidden ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rendered rows.
    #[inline]
    pub fn visible_len(&self) -> usize {
        self.rows.len()
    }

    pub fn entry(&self, id: NodeId) -> Option<&IndexEntry> {
        self.entries.get(id.slot()?)
    }

    /// The entry rendered at row `top`.
    pub fn entry_by_top(&self, top: usize) -> Option<&IndexEntry> {
        let id = self.rows.get(top)?;
        self.entry(*id)
    }

    pub fn get<'m, N: TreeNode>(&self, model: &'m TreeModel<N>, id: NodeId) -> Option<&'m N> {
        model.node(&self.entry(id)?.path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> + '_ {
        self.entries.iter()
    }

    /// Rendered entries in row order.
    pub fn rows(&self) -> impl Iterator<Item = &IndexEntry> + '_ {
        self.rows.iter().filter_map(|id| self.entry(*id))
    }

    pub fn id_at_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut id = NodeId::ROOT;
        for &ix in path {
            id = *self.entry(id)?.children.get(ix)?;
        }
        Some(id)
    }

    /// Whether `id` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        match (self.entry(ancestor), self.entry(id)) {
            (Some(ancestor), Some(entry)) => entry.path.starts_with(&ancestor.path),
            _ => false,
        }
    }

    /// The row drawn directly above `id`, regardless of sibling structure.
    pub fn rendered_above(&self, id: NodeId) -> Option<&IndexEntry> {
        let top = self.entry(id)?.top?;
        self.entry_by_top(top.checked_sub(1)?)
    }

    /// The first row drawn below the subtree of `id`, regardless of sibling structure.
    pub fn rendered_below(&self, id: NodeId) -> Option<&IndexEntry> {
        let entry = self.entry(id)?;
        self.entry_by_top(entry.top? + entry.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn sample() -> TreeModel<Node> {
        TreeModel::new(
            Node::new("A")
                .child(Node::new("B"))
                .child(Node::new("C").children([Node::new("D"), Node::new("E")])),
        )
    }

    fn id_of(index: &FlatIndex, model: &TreeModel<Node>, name: &str) -> NodeId {
        index
            .entries()
            .find(|entry| model.node(&entry.path).is_some_and(|n| n.name == name))
            .map(|entry| entry.id)
            .unwrap()
    }

    #[test]
    fn ids_follow_pre_order() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);
        let names: Vec<_> = index
            .entries()
            .map(|entry| index.get(&model, entry.id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["A", "B", "C", "D", "E"]);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn geometry_of_expanded_tree() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);

        let root = index.entry(NodeId::ROOT).unwrap();
        assert_eq!((root.left, root.top, root.height), (1, Some(0), 5));

        let c = index.entry(id_of(&index, &model, "C")).unwrap();
        assert_eq!((c.left, c.top, c.height), (2, Some(2), 3));
        assert_eq!(c.prev, Some(id_of(&index, &model, "B")));
        assert_eq!(c.next, None);

        let d = index.entry(id_of(&index, &model, "D")).unwrap();
        assert_eq!((d.left, d.top, d.height), (3, Some(3), 1));
        assert_eq!(d.prev, None);
    }

    #[test]
    fn sibling_and_rendered_neighbours_differ() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);
        let d = id_of(&index, &model, "D");
        let c = id_of(&index, &model, "C");

        // D has no previous sibling, but C is drawn right above it.
        assert_eq!(index.entry(d).unwrap().prev, None);
        assert_eq!(index.rendered_above(d).map(|e| e.id), Some(c));

        let e = id_of(&index, &model, "E");
        assert_eq!(index.entry(e).unwrap().next, None);
        assert!(index.rendered_below(e).is_none());
    }

    #[test]
    fn collapsed_subtree_drops_out_of_rows() {
        let mut model = sample();
        model.node_mut(&[1]).unwrap().collapsed = true;
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);

        let c = index.entry(id_of(&index, &model, "C")).unwrap();
        assert_eq!((c.top, c.height), (Some(2), 1));
        assert!(index.entry(id_of(&index, &model, "E")).unwrap().top.is_none());
        assert_eq!(index.visible_len(), 3);
        assert_eq!(index.entry(NodeId::ROOT).unwrap().height, 3);
        assert!(index.entry_by_top(3).is_none());
    }

    #[test]
    fn lookups_by_path() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);
        let e = index.id_at_path(&[1, 1]).unwrap();
        assert_eq!(index.get(&model, e).unwrap().name, "E");
        assert!(index.id_at_path(&[4]).is_none());
        assert!(index.contains(index.id_at_path(&[1]).unwrap(), e));
        assert!(!index.contains(e, index.id_at_path(&[1]).unwrap()));
    }
}
