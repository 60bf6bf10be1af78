pub mod ui_tree;
