use crate::node::TreeNode;

/// Child-index path from the root. The root itself is the empty path.
pub type Path = Vec<usize>;

/// Owner of the caller's node graph.
///
/// The root value is never swapped out: every structural edit splices nested child
/// vectors, so a reference to [`TreeModel::root`] always names the same tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeModel<N> {
    root: N,
}

impl<N: TreeNode> TreeModel<N> {
    pub fn new(root: N) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &N {
        &self.root
    }

    pub fn into_root(self) -> N {
        self.root
    }

    pub fn node(&self, path: &[usize]) -> Option<&N> {
        let mut current = &self.root;
        for &ix in path {
            current = current.children().get(ix)?;
        }
        Some(current)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut N> {
        let mut current = &mut self.root;
        for &ix in path {
            current = current.children_mut().get_mut(ix)?;
        }
        Some(current)
    }

    /// Total node count, root included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Unlink the node at `path` from its parent. The root cannot be detached.
    pub(crate) fn detach(&mut self, path: &[usize]) -> Option<N> {
        let (&ix, parent_path) = path.split_last()?;
        let siblings = self.node_mut(parent_path)?.children_mut();
        (ix < siblings.len()).then(|| siblings.remove(ix))
    }

    /// Insert `node` as child `ix` of the node at `parent`.
    ///
    /// Hands the node back when the parent path does not resolve.
    pub(crate) fn insert(&mut self, parent: &[usize], ix: usize, node: N) -> Result<(), N> {
        let Some(parent) = self.node_mut(parent) else {
            return Err(node);
        };
        let siblings = parent.children_mut();
        let ix = ix.min(siblings.len());
        siblings.insert(ix, node);
        Ok(())
    }
}

/// Rewrite `path` so it still names the same node after the node at `removed` was
/// unlinked. Paths inside the removed subtree have no counterpart and yield `None`.
pub(crate) fn path_after_removal(path: &[usize], removed: &[usize]) -> Option<Path> {
    if path.starts_with(removed) {
        return None;
    }

    let mut out = path.to_vec();
    let Some((&removed_ix, removed_parent)) = removed.split_last() else {
        return Some(out);
    };
    let depth = removed_parent.len();
    if out.len() > depth && out.starts_with(removed_parent) && out[depth] > removed_ix {
        out[depth] -= 1;
    }
    Some(out)
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

    #[test]
    fn resolves_paths() {
        let model = sample();
        assert_eq!(model.node(&[]).map(|n| n.name.as_str()), Some("A"));
        assert_eq!(model.node(&[1, 1]).map(|n| n.name.as_str()), Some("E"));
        assert!(model.node(&[2]).is_none());
        assert_eq!(model.len(), 5);
    }

    #[test]
    fn detach_and_insert_round_trip() {
        let mut model = sample();
        let d = model.detach(&[1, 0]).unwrap();
        assert_eq!(model.root().outline(), "A{B,C{E}}");
        model.insert(&[], 99, d).unwrap();
        assert_eq!(model.root().outline(), "A{B,C{E},D}");
        assert!(model.detach(&[]).is_none());
        assert!(model.insert(&[7], 0, Node::new("X")).is_err());
    }

    #[test]
    fn path_after_removal_shifts_later_siblings() {
        assert_eq!(path_after_removal(&[1, 1], &[1, 0]), Some(vec![1, 0]));
        assert_eq!(path_after_removal(&[2, 3], &[1]), Some(vec![1, 3]));
        assert_eq!(path_after_removal(&[0, 3], &[1]), Some(vec![0, 3]));
        assert_eq!(path_after_removal(&[1], &[1, 0]), Some(vec![1]));
        assert_eq!(path_after_removal(&[1, 0, 2], &[1, 0]), None);
    }
}
