//! Shared building blocks
//!
//! Cursor pools, fixed-point math, geometry primitives and the byte trie
//! used by the GIF encoder.

mod fixed;
mod geometry;
mod pool;
mod trie;

pub use fixed::{EPSILON, FRACTION_BITS, Fixed};
pub use geometry::{Axis, Line, Point, Rect};
pub use pool::{Pool, PoolIndex};
pub use trie::{Trie, TrieRef};
