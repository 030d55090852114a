//! Identity attached to every collideable
//!
//! Objects carry a `(Collider, TypeCode)` pair so collision handlers can
//! route a reported overlap back to the owning sprite, area or game entity.

use serde::{Deserialize, Serialize};

/// A sprite slot inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteRef {
    /// Group identifier chosen by the game
    pub group: u32,
    /// Slot inside the group
    pub slot: u32,
}

/// What owns a collideable AABB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collider {
    /// Bare object with no owner
    #[default]
    None,
    /// Standalone object registered by the game
    Object(u32),
    /// Sprite managed by a group
    Sprite(SpriteRef),
    /// Area of a tilemap, by index
    Area(usize),
    /// Opaque handle for game-defined owners
    Extension(u64),
}

impl Collider {
    #[must_use]
    pub const fn sprite(group: u32, slot: u32) -> Self {
        Self::Sprite(SpriteRef { group, slot })
    }

    #[must_use]
    pub const fn as_sprite(&self) -> Option<SpriteRef> {
        match self {
            Self::Sprite(sprite) => Some(*sprite),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_area(&self) -> Option<usize> {
        match self {
            Self::Area(index) => Some(*index),
            _ => None,
        }
    }
}
