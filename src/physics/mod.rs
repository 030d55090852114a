//! AABB physics
//!
//! Per-object integration, contact detection, separation and the quadtree
//! used to find candidate pairs.

mod collider;
mod collision;
mod hitbox;
mod object;
mod quadtree;

pub use collider::{Collider, SpriteRef};
pub use collision::{Collision, HitFlags};
pub use hitbox::Hitbox;
pub use object::{Aabb, Object};
pub use quadtree::{Quadtree, QuadtreeStats, QuadtreeStep};
