use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::index::FlatIndex;
use crate::model::{Path, TreeModel, path_after_removal};
use crate::node::{NodeId, TreeNode};

/// Where a moved node lands relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Previous sibling of the anchor.
    Before,
    /// Next sibling of the anchor.
    After,
    /// First child of the anchor.
    Prepend,
    /// Last child of the anchor.
    Append,
}

/// A validated relocation. Planning never touches the model, so a rejected move
/// leaves it exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Relocation {
    from: Path,
    parent: Path,
    ix: usize,
}

impl Relocation {
    pub(crate) fn plan<N: TreeNode>(
        model: &TreeModel<N>,
        index: &FlatIndex,
        node: NodeId,
        anchor: NodeId,
        placement: Placement,
    ) -> Result<Option<Self>> {
        let node_entry = index.entry(node).ok_or(TreeError::UnknownNode(node))?;
        let anchor_entry = index.entry(anchor).ok_or(TreeError::UnknownNode(anchor))?;

        if node.is_root() {
            return Ok(None);
        }

        let (parent, ix) = match placement {
            Placement::Before | Placement::After => {
                if node == anchor || anchor.is_root() {
                    return Ok(None);
                }
                let Some((&anchor_ix, anchor_parent)) = anchor_entry.path.split_last() else {
                    return Ok(None);
                };
                let ix = match placement {
                    Placement::Before => anchor_ix,
                    _ => anchor_ix + 1,
                };
                (anchor_parent.to_vec(), ix)
            }
            Placement::Prepend | Placement::Append => {
                let ix = match placement {
                    Placement::Prepend => 0,
                    _ => model
                        .node(&anchor_entry.path)
                        .map(|anchor| anchor.children().len())
                        .ok_or(TreeError::UnknownNode(anchor))?,
                };
                (anchor_entry.path.clone(), ix)
            }
        };

        let from = node_entry.path.clone();
        let Some(adjusted_parent) = path_after_removal(&parent, &from) else {
            return Err(TreeError::WouldCreateCycle { node, anchor });
        };

        // Removing the node shifts its later siblings down by one.
        let mut ix = ix;
        if let Some((&from_ix, from_parent)) = from.split_last()
            && from_parent == parent.as_slice()
            && ix > from_ix
        {
            ix -= 1;
        }

        Ok(Some(Self {
            from,
            parent: adjusted_parent,
            ix,
        }))
    }

    /// Splice the node into its new place and return its new path.
    pub(crate) fn apply<N: TreeNode>(self, model: &mut TreeModel<N>) -> Option<Path> {
        let node = model.detach(&self.from)?;
        match model.insert(&self.parent, self.ix, node) {
            Ok(()) => {
                let len = model.node(&self.parent)?.children().len();
                let mut path = self.parent;
                path.push(self.ix.min(len.saturating_sub(1)));
                Some(path)
            }
            Err(node) => {
                // Unreachable for a freshly planned relocation; put the node back.
                let (&ix, parent) = self.from.split_last()?;
                let _ = model.insert(parent, ix, node);
                None
            }
        }
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

    fn run(model: &mut TreeModel<Node>, node: &[usize], anchor: &[usize], placement: Placement) {
        let index = FlatIndex::build(model, |n: &Node| n.collapsed);
        let node = index.id_at_path(node).unwrap();
        let anchor = index.id_at_path(anchor).unwrap();
        let plan = Relocation::plan(model, &index, node, anchor, placement)
            .unwrap()
            .unwrap();
        plan.apply(model).unwrap();
    }

    #[test]
    fn after_later_sibling_accounts_for_removal() {
        let mut model = sample();
        run(&mut model, &[0], &[1], Placement::After);
        assert_eq!(model.root().outline(), "A{C{D,E},B}");
    }

    #[test]
    fn before_earlier_sibling() {
        let mut model = sample();
        run(&mut model, &[1, 1], &[1, 0], Placement::Before);
        assert_eq!(model.root().outline(), "A{B,C{E,D}}");
    }

    #[test]
    fn prepend_and_append_reparent() {
        let mut model = sample();
        run(&mut model, &[0], &[1], Placement::Prepend);
        assert_eq!(model.root().outline(), "A{C{B,D,E}}");

        let mut model = sample();
        run(&mut model, &[0], &[1], Placement::Append);
        assert_eq!(model.root().outline(), "A{C{D,E,B}}");
    }

    #[test]
    fn outdent_after_parent() {
        let mut model = sample();
        run(&mut model, &[1, 1], &[1], Placement::After);
        assert_eq!(model.root().outline(), "A{B,C{D},E}");
    }

    #[test]
    fn descendant_anchor_is_a_cycle() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);
        let c = index.id_at_path(&[1]).unwrap();
        let d = index.id_at_path(&[1, 0]).unwrap();
        for placement in [Placement::Before, Placement::After, Placement::Append] {
            let err = Relocation::plan(&model, &index, c, d, placement).unwrap_err();
            assert!(matches!(err, TreeError::WouldCreateCycle { .. }));
        }
        let err = Relocation::plan(&model, &index, c, c, Placement::Prepend).unwrap_err();
        assert!(matches!(err, TreeError::WouldCreateCycle { .. }));
    }

    #[test]
    fn root_anchor_and_self_are_no_ops() {
        let model = sample();
        let index = FlatIndex::build(&model, |n: &Node| n.collapsed);
        let b = index.id_at_path(&[0]).unwrap();
        assert_eq!(
            Relocation::plan(&model, &index, b, NodeId::ROOT, Placement::After).unwrap(),
            None
        );
        assert_eq!(
            Relocation::plan(&model, &index, b, b, Placement::Before).unwrap(),
            None
        );
        assert_eq!(
            Relocation::plan(&model, &index, NodeId::ROOT, b, Placement::Append).unwrap(),
            None
        );
    }
}
