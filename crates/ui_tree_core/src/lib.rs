mod config;
mod error;
mod geometry;
mod gesture;
mod index;
mod model;
mod mover;
mod node;
mod placer;
mod scroll;
mod tree;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::geometry::*;
pub use crate::gesture::*;
pub use crate::index::*;
pub use crate::model::*;
pub use crate::mover::*;
pub use crate::node::*;
pub use crate::placer::*;
pub use crate::scroll::*;
pub use crate::tree::*;
