//! Rendering module
//!
//! 2D sprite rendering through a pluggable video backend, plus the camera,
//! animation and sprite group types that decide what gets drawn.

mod animation;
mod backend;
mod camera;
mod group;
mod sprite;
mod spriteset;

pub use animation::Animation;
pub use backend::{SoftwareBackend, VideoBackend};
pub use camera::Camera;
pub use group::{CollisionQuality, DrawOrder, Group, GroupConfig};
pub use sprite::Sprite;
pub use spriteset::{Spriteset, TextureId};
