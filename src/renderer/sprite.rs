//! Animated sprites
//!
//! A sprite is an [`Object`] plus the data needed to draw it: a spriteset,
//! the current tile and an offset from the hitbox to the image.

use glam::IVec2;

use super::animation::Animation;
use super::backend::VideoBackend;
use super::camera::Camera;
use super::spriteset::Spriteset;
use crate::core::error::{GfmError, GfmResult};
use crate::core::types::{self, TypeCode};
use crate::physics::{Aabb, Collider, Object};

/// Drawable object with optional frame animations
#[derive(Debug, Clone)]
pub struct Sprite {
    object: Object,
    spriteset: Option<Spriteset>,
    /// Image position relative to the hitbox
    offset: IVec2,
    frame: usize,
    flipped: bool,
    animations: Vec<Animation>,
    current: Option<usize>,
}

impl Sprite {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the hitbox is too small
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> GfmResult<Self> {
        let mut object = Object::new(x, y, width, height)?;
        object.set_child(Collider::None, types::SPRITE);
        Ok(Self {
            object,
            spriteset: None,
            offset: IVec2::ZERO,
            frame: 0,
            flipped: false,
            animations: Vec::new(),
            current: None,
        })
    }

    #[must_use]
    pub fn with_spriteset(mut self, spriteset: Spriteset, offset_x: i32, offset_y: i32) -> Self {
        self.spriteset = Some(spriteset);
        self.offset = IVec2::new(offset_x, offset_y);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Collider, type_code: TypeCode) -> Self {
        self.object.set_child(child, type_code);
        self
    }

    /// Reinitialize for reuse; animations are dropped
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the hitbox is too small
    pub fn reset(&mut self, x: i32, y: i32, width: i32, height: i32) -> GfmResult<()> {
        self.object.reset(x, y, width, height)?;
        self.frame = 0;
        self.flipped = false;
        self.animations.clear();
        self.current = None;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn object(&self) -> &Object {
        &self.object
    }

    #[inline]
    pub fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    pub fn set_child(&mut self, child: Collider, type_code: TypeCode) {
        self.object.set_child(child, type_code);
    }

    // ------------------------------------------------------------------------
    // Appearance
    // ------------------------------------------------------------------------

    pub fn set_spriteset(&mut self, spriteset: Option<Spriteset>) {
        self.spriteset = spriteset;
    }

    #[must_use]
    pub const fn spriteset(&self) -> Option<&Spriteset> {
        self.spriteset.as_ref()
    }

    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.offset = IVec2::new(x, y);
    }

    #[must_use]
    pub const fn offset(&self) -> IVec2 {
        self.offset
    }

    /// Show a fixed tile; this doesn't stop a playing animation
    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    #[must_use]
    pub const fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Rectangle covered by the image, in world space
    #[must_use]
    pub fn image_bounds(&self) -> Aabb {
        let (x, y) = self.object.position();
        match &self.spriteset {
            Some(set) => Aabb::new(
                x + self.offset.x,
                y + self.offset.y,
                set.tile_width(),
                set.tile_height(),
            ),
            None => self.object.aabb(),
        }
    }

    // ------------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------------

    /// Append an animation and return its index
    ///
    /// # Errors
    ///
    /// Propagates invalid animation parameters
    pub fn add_animation(&mut self, frames: Vec<usize>, fps: u32, looped: bool) -> GfmResult<usize> {
        self.animations.push(Animation::new(frames, fps, looped)?);
        Ok(self.animations.len() - 1)
    }

    /// Append an already built animation and return its index
    pub fn push_animation(&mut self, animation: Animation) -> usize {
        self.animations.push(animation);
        self.animations.len() - 1
    }

    /// Append every animation in packed `[count, fps, looped, frames...]` data
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for malformed data; nothing is added then
    pub fn add_animations(&mut self, data: &[i32]) -> GfmResult<()> {
        let parsed = Animation::parse_template(data)?;
        self.animations.extend(parsed);
        Ok(())
    }

    pub fn clear_animations(&mut self) {
        self.animations.clear();
        self.current = None;
    }

    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Switch to animation `index`. Playing the current animation again
    /// keeps its progress.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown animation
    pub fn play_animation(&mut self, index: usize) -> GfmResult<()> {
        let Some(anim) = self.animations.get_mut(index) else {
            return Err(GfmError::InvalidIndex {
                index,
                len: self.animations.len(),
            });
        };
        if self.current != Some(index) {
            anim.reset();
            self.frame = anim.frame();
            self.current = Some(index);
        }
        Ok(())
    }

    /// Restart the playing animation
    ///
    /// # Errors
    ///
    /// Returns `NoAnimationPlaying` if none was started
    pub fn reset_animation(&mut self) -> GfmResult<()> {
        let anim = self
            .current
            .and_then(|i| self.animations.get_mut(i))
            .ok_or(GfmError::NoAnimationPlaying)?;
        anim.reset();
        self.frame = anim.frame();
        Ok(())
    }

    #[must_use]
    pub const fn current_animation(&self) -> Option<usize> {
        self.current
    }

    fn playing(&self) -> GfmResult<&Animation> {
        self.current
            .and_then(|i| self.animations.get(i))
            .ok_or(GfmError::NoAnimationPlaying)
    }

    /// # Errors
    ///
    /// Returns `NoAnimationPlaying` if none was started
    pub fn did_animation_finish(&self) -> GfmResult<bool> {
        Ok(self.playing()?.did_finish())
    }

    /// # Errors
    ///
    /// Returns `NoAnimationPlaying` if none was started
    pub fn did_animation_just_loop(&self) -> GfmResult<bool> {
        Ok(self.playing()?.did_just_loop())
    }

    /// # Errors
    ///
    /// Returns `NoAnimationPlaying` if none was started
    pub fn did_animation_just_change_frame(&self) -> GfmResult<bool> {
        Ok(self.playing()?.did_just_change_frame())
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    /// Integrate the object and advance the playing animation
    pub fn update(&mut self, elapsed_ms: u32) {
        self.object.update(f64::from(elapsed_ms) / 1000.0);

        if let Some(anim) = self.current.and_then(|i| self.animations.get_mut(i))
            && !anim.did_finish()
        {
            // A running animation never reports AlreadyFinished
            if anim.update(elapsed_ms).is_ok() {
                self.frame = anim.frame();
            }
        }
    }

    /// Draw the current tile relative to the camera. Sprites without a
    /// spriteset are invisible.
    ///
    /// # Errors
    ///
    /// Propagates backend failures
    pub fn draw(&self, video: &mut dyn VideoBackend, camera: &Camera) -> GfmResult<()> {
        let Some(spriteset) = &self.spriteset else {
            return Ok(());
        };
        let bounds = self.image_bounds();
        let (cx, cy) = camera.position();
        video.draw_tile(spriteset, bounds.x - cx, bounds.y - cy, self.frame, self.flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::SoftwareBackend;

    #[test]
    fn test_animation_drives_frame() {
        let mut sprite = Sprite::new(0, 0, 8, 8).unwrap();
        sprite.add_animations(&[2, 10, 1, 3, 4, 1, 0, 0, 7]).unwrap();
        assert_eq!(sprite.animation_count(), 2);

        sprite.play_animation(0).unwrap();
        assert_eq!(sprite.frame(), 3);
        sprite.update(101);
        assert_eq!(sprite.frame(), 4);
        assert!(sprite.did_animation_just_change_frame().unwrap());

        // Replaying the current animation keeps its progress
        sprite.play_animation(0).unwrap();
        assert_eq!(sprite.frame(), 4);

        sprite.play_animation(1).unwrap();
        assert_eq!(sprite.frame(), 7);
    }

    #[test]
    fn test_animation_errors() {
        let mut sprite = Sprite::new(0, 0, 8, 8).unwrap();
        assert_eq!(sprite.did_animation_finish(), Err(GfmError::NoAnimationPlaying));
        assert_eq!(sprite.reset_animation(), Err(GfmError::NoAnimationPlaying));
        assert!(sprite.play_animation(0).is_err());
        assert!(sprite.add_animations(&[4, 10, 1, 0]).is_err());
        assert_eq!(sprite.animation_count(), 0);
    }

    #[test]
    fn test_update_moves_object() {
        let mut sprite = Sprite::new(0, 0, 8, 8).unwrap();
        sprite.object_mut().set_velocity(100.0, 0.0);
        sprite.update(100);
        assert_eq!(sprite.object().position(), (10, 0));
        assert_eq!(sprite.object().type_code(), types::SPRITE);
    }

    #[test]
    fn test_draw_uses_offset_and_camera() {
        let mut video = SoftwareBackend::new(16, 16).unwrap();
        let texture = video.add_texture(2, 2, vec![0xffff_ffff; 4]).unwrap();
        let set = Spriteset::new(texture, 2, 2, 2, 2).unwrap();
        let sprite = Sprite::new(4, 4, 2, 2).unwrap().with_spriteset(set, -1, -2);
        let camera = Camera::new(16, 16).unwrap();

        assert_eq!(sprite.image_bounds(), Aabb::new(3, 2, 2, 2));
        sprite.draw(&mut video, &camera).unwrap();
        assert_eq!(video.pixel(3, 2), Some(0xffff_ffff));
        assert_eq!(video.pixel(2, 2), Some(0xff00_0000));
    }
}
