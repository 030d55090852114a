//! Static rectangles owned by tilemaps

use serde::{Deserialize, Serialize};

use super::collision::Collision;
use super::object::Aabb;
use crate::core::types::TypeCode;

/// A typed, immovable rectangle.
///
/// `hit_flags` lists the sides of the rectangle that accept contacts: a
/// hitbox with only [`Collision::UP`] reacts to objects landing on it from
/// above and lets everything else pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitbox {
    pub bounds: Aabb,
    pub type_code: TypeCode,
    pub hit_flags: Collision,
}

impl Hitbox {
    /// Solid rectangle reacting on every side
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32, type_code: TypeCode) -> Self {
        Self {
            bounds: Aabb::new(x, y, width, height),
            type_code,
            hit_flags: Collision::ALL,
        }
    }

    #[must_use]
    pub const fn with_hit_flags(mut self, hit_flags: Collision) -> Self {
        self.hit_flags = hit_flags;
        self
    }

    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        self.bounds
    }

    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        self.bounds.contains_point(x, y)
    }
}
