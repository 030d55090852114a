//! A 2D game framework core built in Rust
//!
//! This framework provides:
//! - A fixed-timestep scheduler pacing updates and draws
//! - AABB physics with contact flags and separation
//! - A quadtree with a resumable insert-and-collide walk
//! - Tilemaps with collision area synthesis and tile animation
//! - Sprite groups with pooled slots and draw ordering
//! - A map file parser
//! - GIF recording on a background thread

pub mod core;
pub mod gif;
pub mod parser;
pub mod physics;
pub mod renderer;
pub mod tilemap;
pub mod util;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::types::{self, TypeCode};
    pub use crate::core::{
        Context, ContextConfig, Event, EventSource, FixedStepSource, FrameScheduler, Game,
        GfmError, GfmResult, TimerSource,
    };
    pub use crate::parser::{Parser, Record, RecordKind};
    pub use crate::physics::{Aabb, Collider, Collision, Hitbox, Object, Quadtree, QuadtreeStep};
    pub use crate::renderer::{
        Animation, Camera, CollisionQuality, DrawOrder, Group, GroupConfig, SoftwareBackend,
        Sprite, Spriteset, TextureId, VideoBackend,
    };
    pub use crate::tilemap::Tilemap;
    pub use glam::{DVec2, IVec2};
}
