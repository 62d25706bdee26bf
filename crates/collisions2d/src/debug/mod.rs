//! Debug module for visualization tools

pub mod draw;

pub use draw::{draw_aabb, draw_body, PathCommand, PathSink};
