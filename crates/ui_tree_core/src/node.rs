use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

pub type Attrs = BTreeMap<String, serde_json::Value>;

/// Positional identity of a node inside one [`crate::FlatIndex`] generation.
///
/// Ids are handed out in depth-first pre-order starting at [`NodeId::ROOT`], so any
/// structural change may renumber them. Re-resolve through the current index after
/// every mutating call instead of caching them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct NodeId(u32);

impl NodeId {
    /// The caller's top-level node. It can be neither moved nor dragged.
    pub const ROOT: NodeId = NodeId(1);

    pub fn new(raw: u32) -> Option<Self> {
        (raw >= 1).then_some(Self(raw))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    #[inline]
    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(slot as u32 + 1)
    }

    /// Position in the index's entry table. `None` below [`NodeId::ROOT`].
    #[inline]
    pub(crate) fn slot(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl TryFrom<u32> for NodeId {
    type Error = TreeError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(TreeError::InvalidNodeId(raw))
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hierarchical record the engine can index and rearrange.
///
/// Children are owned by value, which keeps the graph acyclic by construction.
pub trait TreeNode: Sized {
    fn children(&self) -> &[Self];

    fn children_mut(&mut self) -> &mut Vec<Self>;

    fn is_collapsed(&self) -> bool;

    fn set_collapsed(&mut self, collapsed: bool);

    /// Leaves never accept children while dragging. Defaults to `false`, so an empty
    /// node is still a valid drop container.
    fn is_leaf(&self) -> bool {
        false
    }
}

/// A ready-made tree node with a display name and free-form attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub leaf: bool,
    #[serde(flatten)]
    pub attrs: Attrs,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            collapsed: false,
            leaf: false,
            attrs: Attrs::default(),
        }
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn leaf(mut self, leaf: bool) -> Self {
        self.leaf = leaf;
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Depth-first lookup by name. Returns the first match in pre-order.
    pub fn find(&self, name: &str) -> Option<&Node> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.name == name {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Compact `A{B,C{D,E}}` rendering of the subtree, handy for logs and assertions.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        write_outline(self, &mut out);
        out
    }
}

fn write_outline(node: &Node, out: &mut String) {
    out.push_str(&node.name);
    if node.children.is_empty() {
        return;
    }
    out.push('{');
    for (ix, child) in node.children.iter().enumerate() {
        if ix > 0 {
            out.push(',');
        }
        write_outline(child, out);
    }
    out.push('}');
}

impl TreeNode for Node {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    fn is_leaf(&self) -> bool {
        self.leaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_matches_nesting() {
        let root = Node::new("A")
            .child(Node::new("B"))
            .child(Node::new("C").children([Node::new("D"), Node::new("E")]));
        assert_eq!(root.outline(), "A{B,C{D,E}}");
        assert_eq!(root.find("E").map(|n| n.name.as_str()), Some("E"));
        assert!(root.find("Z").is_none());
    }

    #[test]
    fn json_keeps_unknown_fields_as_attrs() {
        let json = r#"{
            "name": "react-ui-tree",
            "module": "root",
            "children": [{ "name": "dist", "collapsed": true, "children": [{ "name": "node.js", "leaf": true }] }]
        }"#;
        let root: Node = serde_json::from_str(json).unwrap();
        assert_eq!(root.attrs.get("module").and_then(|v| v.as_str()), Some("root"));
        assert!(root.children[0].collapsed);
        assert!(root.children[0].children[0].leaf);

        let back = serde_json::to_value(&root).unwrap();
        assert_eq!(back["module"], "root");
        assert!(back.get("collapsed").is_none());
    }

    #[test]
    fn node_id_rejects_zero() {
        assert!(NodeId::new(0).is_none());
        assert_eq!(NodeId::new(1), Some(NodeId::ROOT));
        assert_eq!(NodeId::from_slot(4).get(), 5);
        assert_eq!(NodeId::from_slot(4).slot(), Some(4));
    }

    #[test]
    fn node_id_json_rejects_zero() {
        assert!(serde_json::from_str::<NodeId>("0").is_err());
        assert_eq!(serde_json::from_str::<NodeId>("3").unwrap().get(), 3);
        assert_eq!(serde_json::to_string(&NodeId::ROOT).unwrap(), "1");
        assert!(matches!(
            NodeId::try_from(0),
            Err(TreeError::InvalidNodeId(0))
        ));
    }
}
