mod tree;

pub use crate::tree::*;
pub use ui_tree_core;
