//! Pooled sprite groups
//!
//! A group owns a bounded pool of sprite slots threaded on index-linked
//! lists: inactive slots wait to be recycled and active slots are updated
//! every frame. During the update each active sprite is tested against the
//! camera to build the visible list (which is what gets drawn) and the
//! collideable list (which is what the quadtree sees).
//!
//! # Example
//!
//! ```ignore
//! let mut bullets = Group::new(1, GroupConfig::default()
//!     .with_spriteset(set)
//!     .with_dimensions(4, 4, 0, 0)
//!     .with_velocity(0.0, -200.0)
//!     .with_max_len(32));
//! let slot = bullets.recycle()?;
//! bullets.sprite_mut(slot)?.object_mut().set_position(x, y);
//! ```

use super::animation::Animation;
use super::backend::VideoBackend;
use super::camera::Camera;
use super::sprite::Sprite;
use super::spriteset::Spriteset;
use crate::core::error::{GfmError, GfmResult};
use crate::core::types::{self, TypeCode};
use crate::physics::Collider;
use crate::util::{Pool, PoolIndex};

// ============================================================================
// Configuration
// ============================================================================

/// Order in which visible sprites are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOrder {
    /// Active list order (most recently recycled first)
    #[default]
    Linear,
    /// Smallest y drawn first
    TopFirst,
    /// Largest y drawn first
    BottomFirst,
    /// Youngest sprite drawn first
    NewestFirst,
    /// Oldest sprite drawn first
    OldestFirst,
}

/// Which active sprites are handed to collision each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionQuality {
    /// One visible sprite after every two skipped
    EveryThird,
    /// One visible sprite after every skipped one
    EverySecond,
    /// Every visible sprite
    VisibleOnly,
    /// Every live sprite
    #[default]
    CollideEverything,
}

/// Defaults applied to every recycled sprite
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub spriteset: Option<Spriteset>,
    pub width: i32,
    pub height: i32,
    pub offset: (i32, i32),
    pub velocity: (f64, f64),
    pub acceleration: (f64, f64),
    pub type_code: TypeCode,
    /// Milliseconds a recycled sprite lives, `None` for forever
    pub ttl: Option<u32>,
    /// Kill sprites as soon as they leave the camera
    pub die_on_leave: bool,
    /// Packed `[count, fps, looped, frames...]` animation data
    pub animations: Vec<i32>,
    /// Upper bound on slots, `0` for unbounded
    pub max_len: usize,
    pub draw_order: DrawOrder,
    pub collision_quality: CollisionQuality,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            spriteset: None,
            width: 0,
            height: 0,
            offset: (0, 0),
            velocity: (0.0, 0.0),
            acceleration: (0.0, 0.0),
            type_code: types::SPRITE,
            ttl: None,
            die_on_leave: false,
            animations: Vec::new(),
            max_len: 0,
            draw_order: DrawOrder::Linear,
            collision_quality: CollisionQuality::CollideEverything,
        }
    }
}

impl GroupConfig {
    #[must_use]
    pub fn with_spriteset(mut self, spriteset: Spriteset) -> Self {
        self.spriteset = Some(spriteset);
        self
    }

    /// Set hitbox dimensions and image offset
    #[must_use]
    pub fn with_dimensions(mut self, width: i32, height: i32, offset_x: i32, offset_y: i32) -> Self {
        self.width = width;
        self.height = height;
        self.offset = (offset_x, offset_y);
        self
    }

    #[must_use]
    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.velocity = (vx, vy);
        self
    }

    #[must_use]
    pub fn with_acceleration(mut self, ax: f64, ay: f64) -> Self {
        self.acceleration = (ax, ay);
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_code: TypeCode) -> Self {
        self.type_code = type_code;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_die_on_leave(mut self, die: bool) -> Self {
        self.die_on_leave = die;
        self
    }

    #[must_use]
    pub fn with_animations(mut self, data: Vec<i32>) -> Self {
        self.animations = data;
        self
    }

    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_draw_order(mut self, order: DrawOrder) -> Self {
        self.draw_order = order;
        self
    }

    #[must_use]
    pub fn with_collision_quality(mut self, quality: CollisionQuality) -> Self {
        self.collision_quality = quality;
        self
    }
}

// ============================================================================
// Slots and draw tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Inactive,
    Active,
    /// Killed, removed from the active list on the next update
    Dying,
    /// Inserted sprite that died without being recyclable
    Parked,
}

#[derive(Debug, Clone)]
struct Slot {
    sprite: Sprite,
    state: SlotState,
    auto_free: bool,
    /// Remaining life in ms
    ttl: Option<i64>,
    /// Milliseconds since the slot was recycled
    age: u64,
    next: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct DrawNode {
    slot: usize,
    key: i64,
    left: Option<PoolIndex>,
    right: Option<PoolIndex>,
}

/// Reset a slot's sprite from the group defaults
fn apply_defaults(
    config: &GroupConfig,
    template: &[Animation],
    group: u32,
    sprite: &mut Sprite,
    slot: usize,
) -> GfmResult<()> {
    sprite.reset(0, 0, config.width, config.height)?;
    sprite.set_spriteset(config.spriteset);
    sprite.set_offset(config.offset.0, config.offset.1);
    sprite.set_child(Collider::sprite(group, slot as u32), config.type_code);
    let obj = sprite.object_mut();
    obj.set_velocity(config.velocity.0, config.velocity.1);
    obj.set_acceleration(config.acceleration.0, config.acceleration.1);
    for anim in template {
        sprite.push_animation(anim.clone());
    }
    Ok(())
}

// ============================================================================
// Group
// ============================================================================

/// Bounded pool of sprites sharing the same defaults
#[derive(Debug, Clone)]
pub struct Group {
    id: u32,
    config: GroupConfig,
    template: Vec<Animation>,
    slots: Vec<Slot>,
    active: Option<usize>,
    inactive: Option<usize>,
    visible: Vec<usize>,
    collideable: Vec<usize>,
    last: Option<usize>,
    draw_tree: Pool<DrawNode>,
    draw_list: Vec<usize>,
}

impl Group {
    /// Create an empty group. `id` is stored in every sprite's collider so
    /// overlaps can be routed back to this group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the animation data is malformed
    pub fn new(id: u32, config: GroupConfig) -> GfmResult<Self> {
        let template = Animation::parse_template(&config.animations)?;
        Ok(Self {
            id,
            config,
            template,
            slots: Vec::new(),
            active: None,
            inactive: None,
            visible: Vec::new(),
            collideable: Vec::new(),
            last: None,
            draw_tree: Pool::new(),
            draw_list: Vec::new(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn config(&self) -> &GroupConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Defaults
    // ------------------------------------------------------------------------

    pub fn set_def_spriteset(&mut self, spriteset: Spriteset) {
        self.config.spriteset = Some(spriteset);
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` for a hitbox smaller than 2x2
    pub fn set_def_dimensions(&mut self, width: i32, height: i32, offset_x: i32, offset_y: i32) -> GfmResult<()> {
        if width < 2 || height < 2 {
            return Err(GfmError::InvalidArgument(format!(
                "sprite dimensions {width}x{height} are too small"
            )));
        }
        self.config.width = width;
        self.config.height = height;
        self.config.offset = (offset_x, offset_y);
        Ok(())
    }

    pub fn set_def_velocity(&mut self, vx: f64, vy: f64) {
        self.config.velocity = (vx, vy);
    }

    pub fn set_def_acceleration(&mut self, ax: f64, ay: f64) {
        self.config.acceleration = (ax, ay);
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` for a negative type
    pub fn set_def_type(&mut self, type_code: TypeCode) -> GfmResult<()> {
        if type_code < 0 {
            return Err(GfmError::InvalidArgument(format!("bad type {type_code}")));
        }
        self.config.type_code = type_code;
        Ok(())
    }

    /// Replace the animations given to recycled sprites
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the data is malformed
    pub fn set_def_animations(&mut self, data: Vec<i32>) -> GfmResult<()> {
        self.template = Animation::parse_template(&data)?;
        self.config.animations = data;
        Ok(())
    }

    pub fn set_death_on_leave(&mut self, die: bool) {
        self.config.die_on_leave = die;
    }

    /// Lifetime of recycled sprites, `None` for immortal
    pub fn set_death_on_time(&mut self, ttl: Option<u32>) {
        self.config.ttl = ttl;
    }

    pub fn set_draw_order(&mut self, order: DrawOrder) {
        self.config.draw_order = order;
    }

    pub fn set_collision_quality(&mut self, quality: CollisionQuality) {
        self.config.collision_quality = quality;
    }

    // ------------------------------------------------------------------------
    // Slots
    // ------------------------------------------------------------------------

    /// Allocate `count` more inactive slots up front.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without default dimensions, and
    /// `GroupMaxSprites` past the configured bound
    pub fn cache_sprites(&mut self, count: usize) -> GfmResult<()> {
        if count == 0 {
            return Err(GfmError::InvalidArgument("cache count is zero".into()));
        }
        if self.config.width < 2 || self.config.height < 2 {
            return Err(GfmError::NotInitialized("group dimensions"));
        }
        let start = self.slots.len();
        let end = start + count;
        if self.config.max_len != 0 && end > self.config.max_len {
            return Err(GfmError::GroupMaxSprites(self.config.max_len));
        }

        self.slots.reserve_exact(count);
        for slot in start..end {
            let mut sprite = Sprite::new(0, 0, self.config.width, self.config.height)?;
            apply_defaults(&self.config, &self.template, self.id, &mut sprite, slot)?;
            let next = if slot + 1 < end { Some(slot + 1) } else { self.inactive };
            self.slots.push(Slot {
                sprite,
                state: SlotState::Inactive,
                auto_free: true,
                ttl: None,
                age: 0,
                next,
            });
        }
        self.inactive = Some(start);
        log::trace!("Group {} grew to {} sprites", self.id, end);
        Ok(())
    }

    /// Take an inactive slot, reset it from the defaults and activate it.
    ///
    /// The pool doubles when empty, staying within `max_len`.
    ///
    /// # Errors
    ///
    /// Returns `GroupMaxSprites` when every slot is in use
    pub fn recycle(&mut self) -> GfmResult<usize> {
        if self.inactive.is_none() {
            let len = self.slots.len();
            let max = self.config.max_len;
            if max != 0 && len >= max {
                return Err(GfmError::GroupMaxSprites(max));
            }
            let grow = match len {
                0 => 1,
                _ if max != 0 && len * 2 > max => max - len,
                _ => len,
            };
            self.cache_sprites(grow)?;
        }
        let Some(slot) = self.inactive else {
            return Err(GfmError::AllocFailed);
        };
        self.inactive = self.slots[slot].next;

        let active = self.active;
        let entry = &mut self.slots[slot];
        apply_defaults(&self.config, &self.template, self.id, &mut entry.sprite, slot)?;
        entry.state = SlotState::Active;
        entry.ttl = self.config.ttl.map(i64::from);
        entry.age = 0;
        entry.next = active;
        self.active = Some(slot);
        self.last = Some(slot);
        Ok(slot)
    }

    /// Add a sprite built elsewhere. With `auto_free` off the slot is never
    /// recycled; once it dies it stays parked until [`Group::revive`].
    ///
    /// # Errors
    ///
    /// Returns `GroupMaxSprites` past the configured bound
    pub fn insert(&mut self, mut sprite: Sprite, auto_free: bool) -> GfmResult<usize> {
        let slot = self.slots.len();
        if self.config.max_len != 0 && slot >= self.config.max_len {
            return Err(GfmError::GroupMaxSprites(self.config.max_len));
        }
        let type_code = sprite.object().type_code();
        sprite.set_child(Collider::sprite(self.id, slot as u32), type_code);
        self.slots.push(Slot {
            sprite,
            state: SlotState::Active,
            auto_free,
            ttl: None,
            age: 0,
            next: self.active,
        });
        self.active = Some(slot);
        self.last = Some(slot);
        Ok(slot)
    }

    /// Reactivate a parked slot
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless the slot is parked
    pub fn revive(&mut self, slot: usize) -> GfmResult<()> {
        let active = self.active;
        let entry = self.slot_mut(slot)?;
        if entry.state != SlotState::Parked {
            return Err(GfmError::InvalidArgument(format!("slot {slot} isn't parked")));
        }
        entry.state = SlotState::Active;
        entry.age = 0;
        entry.next = active;
        self.active = Some(slot);
        Ok(())
    }

    /// Mark a sprite for removal on the next update
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown slot
    pub fn kill(&mut self, slot: usize) -> GfmResult<()> {
        let entry = self.slot_mut(slot)?;
        if entry.state == SlotState::Active {
            entry.state = SlotState::Dying;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown slot
    pub fn is_alive(&self, slot: usize) -> GfmResult<bool> {
        Ok(self.slot(slot)?.state == SlotState::Active)
    }

    fn slot(&self, slot: usize) -> GfmResult<&Slot> {
        let len = self.slots.len();
        self.slots
            .get(slot)
            .ok_or(GfmError::InvalidIndex { index: slot, len })
    }

    fn slot_mut(&mut self, slot: usize) -> GfmResult<&mut Slot> {
        let len = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(GfmError::InvalidIndex { index: slot, len })
    }

    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown slot
    pub fn sprite(&self, slot: usize) -> GfmResult<&Sprite> {
        Ok(&self.slot(slot)?.sprite)
    }

    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown slot
    pub fn sprite_mut(&mut self, slot: usize) -> GfmResult<&mut Sprite> {
        Ok(&mut self.slot_mut(slot)?.sprite)
    }

    /// Milliseconds since the slot was recycled
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown slot
    pub fn age(&self, slot: usize) -> GfmResult<u64> {
        Ok(self.slot(slot)?.age)
    }

    /// Number of allocated slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots on the active list, in list order
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.active, move |&slot| self.slots[slot].next)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Slots that passed the camera test during the last update
    #[must_use]
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Sprites selected for collision during the last update
    pub fn collideables(&self) -> impl Iterator<Item = &Sprite> + '_ {
        self.collideable.iter().map(move |&slot| &self.slots[slot].sprite)
    }

    // ------------------------------------------------------------------------
    // Last recycled sprite
    // ------------------------------------------------------------------------

    fn last_sprite(&mut self) -> GfmResult<&mut Sprite> {
        let slot = self.last.ok_or(GfmError::NotInitialized("recycled sprite"))?;
        self.sprite_mut(slot)
    }

    /// Move the most recently recycled sprite
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled since the last update
    pub fn set_position(&mut self, x: i32, y: i32) -> GfmResult<()> {
        self.last_sprite()?.object_mut().set_position(x, y);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled since the last update
    pub fn set_velocity(&mut self, vx: f64, vy: f64) -> GfmResult<()> {
        self.last_sprite()?.object_mut().set_velocity(vx, vy);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled since the last update
    pub fn set_acceleration(&mut self, ax: f64, ay: f64) -> GfmResult<()> {
        self.last_sprite()?.object_mut().set_acceleration(ax, ay);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled since the last update
    pub fn set_frame(&mut self, frame: usize) -> GfmResult<()> {
        self.last_sprite()?.set_frame(frame);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled, or `InvalidIndex`
    /// for an unknown animation
    pub fn set_animation(&mut self, index: usize) -> GfmResult<()> {
        self.last_sprite()?.play_animation(index)
    }

    /// # Errors
    ///
    /// Returns `NotInitialized` if nothing was recycled since the last update
    pub fn set_type(&mut self, type_code: TypeCode) -> GfmResult<()> {
        self.last_sprite()?.object_mut().set_type(type_code);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    /// Update every active sprite, retire the dead ones and rebuild the
    /// visible and collideable lists.
    pub fn update(&mut self, elapsed_ms: u32, camera: &Camera) {
        self.last = None;
        self.visible.clear();
        self.collideable.clear();
        let mut skipped = 0;

        let mut prev: Option<usize> = None;
        let mut cursor = self.active;
        while let Some(slot) = cursor {
            let entry = &mut self.slots[slot];
            cursor = entry.next;

            entry.sprite.update(elapsed_ms);
            entry.age += u64::from(elapsed_ms);
            if let Some(ttl) = entry.ttl.as_mut() {
                *ttl -= i64::from(elapsed_ms);
            }

            let inside = camera.is_inside(&entry.sprite.image_bounds());
            let alive = entry.state == SlotState::Active
                && (!self.config.die_on_leave || inside)
                && entry.ttl.is_none_or(|ttl| ttl > 0);

            if alive {
                if inside {
                    self.visible.push(slot);
                }
                if self.wants_collision(inside, &mut skipped) {
                    self.collideable.push(slot);
                }
                prev = Some(slot);
                continue;
            }

            // Unlink from the active list
            match prev {
                Some(p) => self.slots[p].next = cursor,
                None => self.active = cursor,
            }
            let entry = &mut self.slots[slot];
            if entry.auto_free {
                entry.state = SlotState::Inactive;
                entry.next = self.inactive;
                self.inactive = Some(slot);
            } else {
                entry.state = SlotState::Parked;
                entry.next = None;
            }
        }
    }

    fn wants_collision(&self, inside: bool, skipped: &mut u32) -> bool {
        let skip_before = match self.config.collision_quality {
            CollisionQuality::EveryThird => 2,
            CollisionQuality::EverySecond => 1,
            CollisionQuality::VisibleOnly => 0,
            CollisionQuality::CollideEverything => return true,
        };
        if *skipped < skip_before {
            *skipped += 1;
            return false;
        }
        if !inside {
            return false;
        }
        *skipped = 0;
        true
    }

    /// Slots in the order the next draw will visit them
    pub fn draw_order(&mut self) -> &[usize] {
        self.build_draw_list();
        &self.draw_list
    }

    fn build_draw_list(&mut self) {
        self.draw_list.clear();
        let order = self.config.draw_order;
        if order == DrawOrder::Linear {
            self.draw_list.extend_from_slice(&self.visible);
            return;
        }

        self.draw_tree.reset();
        let mut root: Option<PoolIndex> = None;
        for &slot in &self.visible {
            let entry = &self.slots[slot];
            let key = match order {
                DrawOrder::TopFirst | DrawOrder::BottomFirst => {
                    i64::from(entry.sprite.object().position().1)
                }
                _ => entry.age as i64,
            };
            let node = self.draw_tree.push(DrawNode {
                slot,
                key,
                left: None,
                right: None,
            });

            let Some(mut parent) = root else {
                root = Some(node);
                continue;
            };
            loop {
                let parent_key = self.draw_tree[parent].key;
                let go_left = match order {
                    DrawOrder::TopFirst | DrawOrder::NewestFirst => key <= parent_key,
                    _ => key > parent_key,
                };
                let link = if go_left {
                    &mut self.draw_tree[parent].left
                } else {
                    &mut self.draw_tree[parent].right
                };
                match *link {
                    Some(child) => parent = child,
                    None => {
                        *link = Some(node);
                        break;
                    }
                }
            }
        }

        // In-order walk
        let mut stack: Vec<PoolIndex> = Vec::new();
        let mut cursor = root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = self.draw_tree[node].left;
            }
            if let Some(node) = stack.pop() {
                self.draw_list.push(self.draw_tree[node].slot);
                cursor = self.draw_tree[node].right;
            }
        }
    }

    /// Draw every visible sprite in the configured order
    ///
    /// # Errors
    ///
    /// Propagates backend failures
    pub fn draw(&mut self, video: &mut dyn VideoBackend, camera: &Camera) -> GfmResult<()> {
        self.build_draw_list();
        for &slot in &self.draw_list {
            self.slots[slot].sprite.draw(video, camera)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::spriteset::TextureId;

    fn camera() -> Camera {
        let mut camera = Camera::new(100, 100).unwrap();
        camera.set_world_dimensions(1000, 1000).unwrap();
        camera
    }

    fn group(config: GroupConfig) -> Group {
        let set = Spriteset::new(TextureId(0), 16, 16, 8, 8).unwrap();
        Group::new(7, config.with_spriteset(set).with_dimensions(8, 8, 0, 0)).unwrap()
    }

    fn spawn(group: &mut Group, x: i32, y: i32) -> usize {
        let slot = group.recycle().unwrap();
        group.set_position(x, y).unwrap();
        slot
    }

    #[test]
    fn test_recycle_grows_by_doubling() {
        let mut g = group(GroupConfig::default());
        for _ in 0..5 {
            g.recycle().unwrap();
        }
        // 1 -> 2 -> 4 -> 8
        assert_eq!(g.len(), 8);
        assert_eq!(g.active_count(), 5);
    }

    #[test]
    fn test_max_len() {
        let mut g = group(GroupConfig::default().with_max_len(3));
        for _ in 0..3 {
            g.recycle().unwrap();
        }
        assert_eq!(g.len(), 3);
        assert_eq!(g.recycle(), Err(GfmError::GroupMaxSprites(3)));
    }

    #[test]
    fn test_recycle_requires_dimensions() {
        let mut g = Group::new(1, GroupConfig::default()).unwrap();
        assert_eq!(g.recycle(), Err(GfmError::NotInitialized("group dimensions")));
    }

    #[test]
    fn test_recycled_sprite_gets_defaults() {
        let mut g = group(
            GroupConfig::default()
                .with_velocity(10.0, 0.0)
                .with_type(types::RESERVED_2)
                .with_animations(vec![2, 10, 1, 0, 1]),
        );
        let slot = g.recycle().unwrap();
        let sprite = g.sprite(slot).unwrap();
        assert_eq!(sprite.object().velocity().x, 10.0);
        assert_eq!(sprite.object().type_code(), types::RESERVED_2);
        assert_eq!(sprite.object().child(), Collider::sprite(7, slot as u32));
        assert_eq!(sprite.animation_count(), 1);
    }

    #[test]
    fn test_kill_returns_slot_to_pool() {
        let mut g = group(GroupConfig::default());
        let a = spawn(&mut g, 0, 0);
        let b = spawn(&mut g, 10, 0);
        g.kill(a).unwrap();
        assert!(!g.is_alive(a).unwrap());

        g.update(16, &camera());
        assert_eq!(g.active().collect::<Vec<_>>(), vec![b]);

        // The killed slot is reused first
        assert_eq!(g.recycle().unwrap(), a);
    }

    #[test]
    fn test_ttl_expires() {
        let mut g = group(GroupConfig::default().with_ttl(Some(50)));
        spawn(&mut g, 0, 0);
        g.update(30, &camera());
        assert_eq!(g.active_count(), 1);
        g.update(30, &camera());
        assert_eq!(g.active_count(), 0);
    }

    #[test]
    fn test_die_on_leave() {
        let mut g = group(GroupConfig::default().with_die_on_leave(true));
        spawn(&mut g, 10, 10);
        spawn(&mut g, 500, 500);
        g.update(16, &camera());
        assert_eq!(g.active_count(), 1);
        assert_eq!(g.visible().len(), 1);
    }

    #[test]
    fn test_offscreen_sprites_stay_alive_but_invisible() {
        let mut g = group(GroupConfig::default());
        spawn(&mut g, 10, 10);
        spawn(&mut g, 500, 500);
        g.update(16, &camera());
        assert_eq!(g.active_count(), 2);
        assert_eq!(g.visible().len(), 1);
        assert_eq!(g.collideables().count(), 2);
    }

    #[test]
    fn test_collision_quality() {
        let mut g = group(GroupConfig::default().with_collision_quality(CollisionQuality::EveryThird));
        for i in 0..6 {
            spawn(&mut g, i * 10, 0);
        }
        g.update(16, &camera());
        assert_eq!(g.collideables().count(), 2);

        g.set_collision_quality(CollisionQuality::VisibleOnly);
        spawn(&mut g, 500, 500);
        g.update(16, &camera());
        assert_eq!(g.collideables().count(), 6);
    }

    #[test]
    fn test_draw_orders() {
        let mut g = group(GroupConfig::default());
        let a = spawn(&mut g, 0, 30);
        g.update(10, &camera());
        let b = spawn(&mut g, 0, 10);
        g.update(10, &camera());
        let c = spawn(&mut g, 0, 20);
        g.update(10, &camera());

        // Linear follows the active list, newest recycled first
        assert_eq!(g.draw_order(), &[c, b, a]);

        g.set_draw_order(DrawOrder::TopFirst);
        assert_eq!(g.draw_order(), &[b, c, a]);

        g.set_draw_order(DrawOrder::BottomFirst);
        assert_eq!(g.draw_order(), &[a, c, b]);

        g.set_draw_order(DrawOrder::NewestFirst);
        assert_eq!(g.draw_order(), &[c, b, a]);

        g.set_draw_order(DrawOrder::OldestFirst);
        assert_eq!(g.draw_order(), &[a, b, c]);
    }

    #[test]
    fn test_inserted_sprite_parks_on_death() {
        let mut g = group(GroupConfig::default());
        let player = Sprite::new(0, 0, 8, 8).unwrap();
        let slot = g.insert(player, false).unwrap();
        g.kill(slot).unwrap();
        g.update(16, &camera());
        assert_eq!(g.active_count(), 0);

        // Parked slots are never handed out by recycle
        let other = g.recycle().unwrap();
        assert_ne!(other, slot);
        g.revive(slot).unwrap();
        assert!(g.is_alive(slot).unwrap());
        assert_eq!(g.active().collect::<Vec<_>>(), vec![slot, other]);
        assert!(matches!(g.revive(slot), Err(GfmError::InvalidArgument(_))));
    }

    #[test]
    fn test_last_sprite_setters_expire_on_update() {
        let mut g = group(GroupConfig::default());
        spawn(&mut g, 0, 0);
        g.update(16, &camera());
        assert_eq!(g.set_position(1, 1), Err(GfmError::NotInitialized("recycled sprite")));
    }
}
