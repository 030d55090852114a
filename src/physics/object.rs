//! AABB objects: integration, overlap probing and separation
//!
//! An [`Object`] keeps two positions: an integer top-left corner used for
//! every collision test, and a fractional position advanced by the
//! integration step. The integer position is always the fractional one
//! truncated toward zero.
//!
//! Collision is split in two stages. [`Object::just_overlapped`] decides the
//! contact direction from where both objects were on the previous frame and
//! stores it on both sides; the separation functions then read those
//! direction bits to push the objects apart.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collider::Collider;
use super::collision::{Collision, HitFlags};
use super::hitbox::Hitbox;
use crate::core::error::{GfmError, GfmResult};
use crate::core::types::{self, TypeCode};

// ============================================================================
// Integer bounds
// ============================================================================

/// Integer axis-aligned rectangle, from its top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Aabb {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Interiors intersect; rectangles sharing only an edge don't overlap
    #[must_use]
    pub const fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Closed rectangles intersect; shared edges count
    #[must_use]
    pub const fn touches(&self, other: &Aabb) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Direction in which `b` was entered, from `a`'s point of view.
///
/// An axis only reports contact if the rectangles didn't overlap on it
/// during the previous frame. Swapping the arguments yields the mirrored
/// result.
fn entry_contact(a: Aabb, a_last: Aabb, b: Aabb, b_last: Aabb) -> Collision {
    if !a.overlaps(&b) {
        return Collision::NONE;
    }

    // Doubled center distances keep odd sizes exact
    let dx = (2 * b.x + b.width) - (2 * a.x + a.width);
    let dy = (2 * b.y + b.height) - (2 * a.y + a.height);
    let last_dx = (2 * b_last.x + b_last.width) - (2 * a_last.x + a_last.width);
    let last_dy = (2 * b_last.y + b_last.height) - (2 * a_last.y + a_last.height);
    let max_x = a_last.width + b_last.width;
    let max_y = a_last.height + b_last.height;

    let mut dir = Collision::NONE;

    if last_dx.abs() >= max_x {
        let side = if dx != 0 { dx } else { last_dx };
        dir |= if side > 0 { Collision::RIGHT } else { Collision::LEFT };
    }

    if last_dy.abs() >= max_y {
        let side = if dy != 0 { dy } else { last_dy };
        dir |= if side > 0 { Collision::DOWN } else { Collision::UP };
    }

    dir
}

/// Drag slows an unaccelerated axis toward rest without reversing it
fn apply_drag(position: &mut f64, velocity: &mut f64, drag: f64, dt: f64) {
    if drag <= 0.0 || *velocity == 0.0 {
        return;
    }
    let sign = velocity.signum();
    let dv = drag * dt;
    if velocity.abs() <= dv {
        *velocity = 0.0;
    } else {
        *position -= sign * 0.5 * drag * dt * dt;
        *velocity -= sign * dv;
    }
}

// ============================================================================
// Object
// ============================================================================

/// Axis-aligned box with simple kinematics
#[derive(Debug, Clone)]
pub struct Object {
    x: i32,
    y: i32,
    half_width: i32,
    half_height: i32,
    position: DVec2,
    last_position: DVec2,
    velocity: DVec2,
    acceleration: DVec2,
    drag: DVec2,
    fixed: bool,
    child: Collider,
    type_code: TypeCode,
    hit: HitFlags,
}

impl Object {
    /// Create an object at `(x, y)` (top-left corner).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either dimension is smaller than 2
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> GfmResult<Self> {
        let mut obj = Self {
            x,
            y,
            half_width: 1,
            half_height: 1,
            position: DVec2::new(f64::from(x), f64::from(y)),
            last_position: DVec2::new(f64::from(x), f64::from(y)),
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            drag: DVec2::ZERO,
            fixed: false,
            child: Collider::None,
            type_code: types::OBJECT,
            hit: HitFlags::default(),
        };
        obj.set_dimensions(width, height)?;
        Ok(obj)
    }

    /// Reinitialize a recycled object, clearing kinematics and contacts
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either dimension is smaller than 2
    pub fn reset(&mut self, x: i32, y: i32, width: i32, height: i32) -> GfmResult<()> {
        self.set_dimensions(width, height)?;
        self.set_position(x, y);
        self.velocity = DVec2::ZERO;
        self.acceleration = DVec2::ZERO;
        self.drag = DVec2::ZERO;
        self.fixed = false;
        self.hit = HitFlags::default();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub fn set_child(&mut self, child: Collider, type_code: TypeCode) {
        self.child = child;
        self.type_code = type_code;
    }

    #[must_use]
    pub const fn child(&self) -> Collider {
        self.child
    }

    #[must_use]
    pub const fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn set_type(&mut self, type_code: TypeCode) {
        self.type_code = type_code;
    }

    // ------------------------------------------------------------------------
    // Dimensions and position
    // ------------------------------------------------------------------------

    /// Resize the object, keeping its top-left corner.
    ///
    /// Dimensions are stored as half extents, so odd sizes round down.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either dimension is smaller than 2
    pub fn set_dimensions(&mut self, width: i32, height: i32) -> GfmResult<()> {
        if width / 2 <= 0 || height / 2 <= 0 {
            return Err(GfmError::InvalidArgument(format!(
                "object dimensions {width}x{height} are too small"
            )));
        }
        self.half_width = width / 2;
        self.half_height = height / 2;
        Ok(())
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.half_width * 2
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.half_height * 2
    }

    #[must_use]
    pub const fn half_width(&self) -> i32 {
        self.half_width
    }

    #[must_use]
    pub const fn half_height(&self) -> i32 {
        self.half_height
    }

    /// Integer top-left corner
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Teleport the object; last frame's position moves along with it
    pub fn set_position(&mut self, x: i32, y: i32) {
        let position = DVec2::new(f64::from(x), f64::from(y));
        self.position = position;
        self.last_position = position;
        self.sync_integer();
    }

    pub fn set_horizontal_position(&mut self, x: i32) {
        self.position.x = f64::from(x);
        self.last_position.x = self.position.x;
        self.sync_integer();
    }

    pub fn set_vertical_position(&mut self, y: i32) {
        self.position.y = f64::from(y);
        self.last_position.y = self.position.y;
        self.sync_integer();
    }

    #[must_use]
    pub const fn fractional_position(&self) -> DVec2 {
        self.position
    }

    #[must_use]
    pub const fn last_fractional_position(&self) -> DVec2 {
        self.last_position
    }

    /// Move the object this frame only; last frame's position is kept
    pub fn set_fractional_position(&mut self, position: DVec2) {
        self.position = position;
        self.sync_integer();
    }

    fn sync_integer(&mut self) {
        self.x = self.position.x.trunc() as i32;
        self.y = self.position.y.trunc() as i32;
    }

    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.half_width, self.y + self.half_height)
    }

    #[must_use]
    pub fn last_center(&self) -> (i32, i32) {
        let last = self.last_aabb();
        (last.x + self.half_width, last.y + self.half_height)
    }

    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width(), self.height())
    }

    /// Bounds at the start of the current frame
    #[must_use]
    pub fn last_aabb(&self) -> Aabb {
        Aabb::new(
            self.last_position.x.trunc() as i32,
            self.last_position.y.trunc() as i32,
            self.width(),
            self.height(),
        )
    }

    /// Distance between both centers, from `self` to `other`
    #[must_use]
    pub const fn distance(&self, other: &Object) -> (i32, i32) {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (bx - ax, by - ay)
    }

    // ------------------------------------------------------------------------
    // Kinematics
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, vx: f64, vy: f64) {
        self.velocity = DVec2::new(vx, vy);
    }

    pub fn set_horizontal_velocity(&mut self, vx: f64) {
        self.velocity.x = vx;
    }

    pub fn set_vertical_velocity(&mut self, vy: f64) {
        self.velocity.y = vy;
    }

    #[must_use]
    pub const fn acceleration(&self) -> DVec2 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, ax: f64, ay: f64) {
        self.acceleration = DVec2::new(ax, ay);
    }

    pub fn set_horizontal_acceleration(&mut self, ax: f64) {
        self.acceleration.x = ax;
    }

    pub fn set_vertical_acceleration(&mut self, ay: f64) {
        self.acceleration.y = ay;
    }

    #[must_use]
    pub const fn drag(&self) -> DVec2 {
        self.drag
    }

    /// Set the drag, clamped to be non-negative
    pub fn set_drag(&mut self, dx: f64, dy: f64) {
        self.drag = DVec2::new(dx.max(0.0), dy.max(0.0));
    }

    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Fixed objects are never moved by a separation
    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    /// Advance the object by `dt` seconds and start a new collision frame
    pub fn update(&mut self, dt: f64) {
        self.last_position = self.position;

        self.position += self.velocity * dt + 0.5 * self.acceleration * dt * dt;

        if self.acceleration.x != 0.0 {
            self.velocity.x += self.acceleration.x * dt;
        } else {
            apply_drag(&mut self.position.x, &mut self.velocity.x, self.drag.x, dt);
        }
        if self.acceleration.y != 0.0 {
            self.velocity.y += self.acceleration.y * dt;
        } else {
            apply_drag(&mut self.position.y, &mut self.velocity.y, self.drag.y, dt);
        }

        self.sync_integer();
        self.hit.advance();
    }

    /// Copy another object's movement during this frame (e.g. a platform
    /// being ridden). Last frame's position isn't touched.
    pub fn apply_delta(&mut self, other: &Object) {
        self.apply_horizontal_delta(other);
        self.apply_vertical_delta(other);
    }

    pub fn apply_horizontal_delta(&mut self, other: &Object) {
        self.position.x += other.position.x - other.last_position.x;
        self.sync_integer();
    }

    pub fn apply_vertical_delta(&mut self, other: &Object) {
        self.position.y += other.position.y - other.last_position.y;
        self.sync_integer();
    }

    // ------------------------------------------------------------------------
    // Collision state
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn hit_flags(&self) -> HitFlags {
        self.hit
    }

    /// Contacts from this frame or the previous one
    #[must_use]
    pub const fn collision(&self) -> Collision {
        Collision::from_bits_retain(self.hit.current().bits() | self.hit.last().bits())
    }

    #[must_use]
    pub const fn current_collision(&self) -> Collision {
        self.hit.current()
    }

    #[must_use]
    pub const fn last_collision(&self) -> Collision {
        self.hit.last()
    }

    #[must_use]
    pub const fn instant_collision(&self) -> Collision {
        self.hit.instant()
    }

    #[must_use]
    pub const fn is_overlapping(&self, other: &Object) -> bool {
        self.aabb().overlaps(&other.aabb())
    }

    #[must_use]
    pub const fn is_point_inside(&self, x: i32, y: i32) -> bool {
        self.aabb().contains_point(x, y)
    }

    /// Check for a new contact between two objects.
    ///
    /// On contact, the direction is stored in both objects' instant and
    /// current groups (mirrored on `other`). Returns whether any direction
    /// was set.
    pub fn just_overlapped(&mut self, other: &mut Object) -> bool {
        self.hit.clear_instant();
        other.hit.clear_instant();

        let dir = entry_contact(self.aabb(), self.last_aabb(), other.aabb(), other.last_aabb());
        if dir.is_empty() {
            return false;
        }

        self.hit.set_instant(dir);
        self.hit.commit_instant();
        other.hit.set_instant(dir.mirrored());
        other.hit.commit_instant();
        true
    }

    /// Check for a new contact against a static hitbox.
    ///
    /// Only sides listed in the hitbox's `hit_flags` report contact, and only
    /// this object's flags are written.
    pub fn just_overlapped_hitbox(&mut self, hitbox: &Hitbox) -> bool {
        self.hit.clear_instant();

        let area = hitbox.aabb();
        let dir = entry_contact(self.aabb(), self.last_aabb(), area, area);
        let accepted = (dir.mirrored() & hitbox.hit_flags).mirrored();
        if accepted.is_empty() {
            return false;
        }

        self.hit.set_instant(accepted);
        self.hit.commit_instant();
        true
    }

    /// Check for contact and push the objects apart on every touched axis.
    ///
    /// # Errors
    ///
    /// Returns `ObjectsCantCollide` if both objects touched and both are fixed
    pub fn collide(&mut self, other: &mut Object) -> GfmResult<bool> {
        if !self.just_overlapped(other) {
            return Ok(false);
        }
        if self.fixed && other.fixed {
            return Err(GfmError::ObjectsCantCollide);
        }

        let dir = self.hit.instant();
        if dir.intersects(Collision::HORIZONTAL) {
            self.separate_horizontal(other)?;
        }
        if dir.intersects(Collision::VERTICAL) {
            self.separate_vertical(other)?;
        }
        Ok(true)
    }

    /// Check a static hitbox and move this object out of it.
    ///
    /// # Errors
    ///
    /// Returns `ObjectsCantCollide` if this object is fixed
    pub fn collide_hitbox(&mut self, hitbox: &Hitbox) -> GfmResult<bool> {
        if !self.just_overlapped_hitbox(hitbox) {
            return Ok(false);
        }
        if self.fixed {
            return Err(GfmError::ObjectsCantCollide);
        }

        let dir = self.hit.instant();
        if dir.intersects(Collision::HORIZONTAL) {
            self.push_out_horizontal(hitbox.aabb(), dir);
        }
        if dir.intersects(Collision::VERTICAL) {
            self.push_out_vertical(hitbox.aabb(), dir);
        }
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Separation
    // ------------------------------------------------------------------------

    /// Resolve the horizontal contact found by the last overlap check.
    ///
    /// # Errors
    ///
    /// Returns `CollisionNotTriggered` without a horizontal contact and
    /// `ObjectsCantCollide` if both objects are fixed
    pub fn separate_horizontal(&mut self, other: &mut Object) -> GfmResult<()> {
        let dir = self.hit.instant() & Collision::HORIZONTAL;
        if dir.is_empty() {
            return Err(GfmError::CollisionNotTriggered);
        }

        match (self.fixed, other.fixed) {
            (true, true) => return Err(GfmError::ObjectsCantCollide),
            (false, true) => self.push_out_horizontal(other.aabb(), dir),
            (true, false) => other.push_out_horizontal(self.aabb(), dir.mirrored()),
            (false, false) => {
                let (left, right) = if dir.contains(Collision::RIGHT) {
                    (self, other)
                } else {
                    (other, self)
                };
                let overlap = left.aabb().right() - right.x;
                if overlap > 0 {
                    let left_x = left.x - (overlap - overlap / 2);
                    let right_x = right.x + overlap / 2;
                    left.set_fractional_position(DVec2::new(f64::from(left_x), left.position.y));
                    right.set_fractional_position(DVec2::new(f64::from(right_x), right.position.y));
                }
            }
        }
        Ok(())
    }

    /// Resolve the vertical contact found by the last overlap check.
    ///
    /// # Errors
    ///
    /// Returns `CollisionNotTriggered` without a vertical contact and
    /// `ObjectsCantCollide` if both objects are fixed
    pub fn separate_vertical(&mut self, other: &mut Object) -> GfmResult<()> {
        let dir = self.hit.instant() & Collision::VERTICAL;
        if dir.is_empty() {
            return Err(GfmError::CollisionNotTriggered);
        }

        match (self.fixed, other.fixed) {
            (true, true) => return Err(GfmError::ObjectsCantCollide),
            (false, true) => self.push_out_vertical(other.aabb(), dir),
            (true, false) => other.push_out_vertical(self.aabb(), dir.mirrored()),
            (false, false) => {
                let (top, bottom) = if dir.contains(Collision::DOWN) {
                    (self, other)
                } else {
                    (other, self)
                };
                let overlap = top.aabb().bottom() - bottom.y;
                if overlap > 0 {
                    let top_y = top.y - (overlap - overlap / 2);
                    let bottom_y = bottom.y + overlap / 2;
                    top.set_fractional_position(DVec2::new(top.position.x, f64::from(top_y)));
                    bottom.set_fractional_position(DVec2::new(bottom.position.x, f64::from(bottom_y)));
                }
            }
        }
        Ok(())
    }

    /// Place the object one pixel beside `wall` and stop it moving into it
    fn push_out_horizontal(&mut self, wall: Aabb, dir: Collision) {
        let new_x = if dir.contains(Collision::RIGHT) {
            if self.velocity.x > 0.0 {
                self.velocity.x = 0.0;
            }
            wall.x - self.width() - 1
        } else {
            if self.velocity.x < 0.0 {
                self.velocity.x = 0.0;
            }
            wall.right() + 1
        };
        self.set_fractional_position(DVec2::new(f64::from(new_x), self.position.y));
    }

    /// Place the object against `wall`'s top or bottom edge
    fn push_out_vertical(&mut self, wall: Aabb, dir: Collision) {
        let new_y = if dir.contains(Collision::DOWN) {
            if self.velocity.y > 0.0 {
                self.velocity.y = 0.0;
            }
            wall.y - self.height()
        } else {
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            wall.bottom()
        };
        self.set_fractional_position(DVec2::new(self.position.x, f64::from(new_y)));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn moved(x0: i32, y0: i32, x1: i32, y1: i32, size: i32) -> Object {
        let mut obj = Object::new(x0, y0, size, size).unwrap();
        obj.set_fractional_position(DVec2::new(f64::from(x1), f64::from(y1)));
        obj
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(Object::new(0, 0, 1, 8), Err(GfmError::InvalidArgument(_))));
        assert!(Object::new(0, 0, 2, 2).is_ok());
    }

    #[test]
    fn test_update_keeps_last_position() {
        let mut obj = Object::new(0, 0, 8, 8).unwrap();
        obj.set_velocity(30.0, -12.0);
        obj.set_acceleration(5.0, 0.0);

        for _ in 0..10 {
            let before = obj.fractional_position();
            obj.update(DT);
            assert_eq!(obj.last_fractional_position(), before);
        }
    }

    #[test]
    fn test_constant_acceleration_is_exact() {
        let mut obj = Object::new(0, 0, 8, 8).unwrap();
        obj.set_acceleration(0.0, 10.0);

        obj.update(0.5);
        obj.update(0.5);

        // y = a*t^2/2 after one second
        assert!((obj.fractional_position().y - 5.0).abs() < 1e-9);
        assert!((obj.velocity().y - 10.0).abs() < 1e-9);
        assert_eq!(obj.position(), (0, 5));
    }

    #[test]
    fn test_drag_never_flips_velocity() {
        let mut obj = Object::new(0, 0, 8, 8).unwrap();
        obj.set_velocity(10.0, -10.0);
        obj.set_drag(100.0, 100.0);

        obj.update(0.05);
        assert!((obj.velocity().x - 5.0).abs() < 1e-9);
        assert!((obj.velocity().y + 5.0).abs() < 1e-9);

        obj.update(0.5);
        assert_eq!(obj.velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_positions_truncate_toward_zero() {
        let mut obj = Object::new(0, 0, 8, 8).unwrap();
        obj.set_fractional_position(DVec2::new(-0.5, -1.5));
        assert_eq!(obj.position(), (0, -1));

        obj.set_fractional_position(DVec2::new(2.9, -0.99));
        assert_eq!(obj.position(), (2, 0));

        obj.update(0.0);
        assert_eq!(obj.last_aabb(), Aabb::new(2, 0, 8, 8));
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        let a = Object::new(0, 0, 8, 8).unwrap();
        let b = Object::new(8, 0, 8, 8).unwrap();
        assert!(!a.is_overlapping(&b));

        let c = Object::new(7, 7, 8, 8).unwrap();
        assert!(a.is_overlapping(&c));
    }

    #[test]
    fn test_just_overlapped_is_mirrored() {
        // b slides in from the right
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        let mut b = moved(20, 0, 4, 0, 8);

        assert!(a.just_overlapped(&mut b));
        assert_eq!(a.instant_collision(), Collision::RIGHT);
        assert_eq!(b.instant_collision(), Collision::LEFT);
        assert_eq!(a.current_collision(), Collision::RIGHT);

        // Same pair, checked the other way around
        let mut a2 = Object::new(0, 0, 8, 8).unwrap();
        let mut b2 = moved(20, 0, 4, 0, 8);
        assert!(b2.just_overlapped(&mut a2));
        assert_eq!(b2.instant_collision(), Collision::LEFT);
        assert_eq!(a2.instant_collision(), Collision::RIGHT);
    }

    #[test]
    fn test_just_overlapped_vertical_entry() {
        let mut falling = moved(0, -20, 0, -4, 8);
        let mut ground = Object::new(0, 0, 8, 8).unwrap();

        assert!(falling.just_overlapped(&mut ground));
        assert_eq!(falling.instant_collision(), Collision::DOWN);
        assert_eq!(ground.instant_collision(), Collision::UP);
    }

    #[test]
    fn test_fast_object_buried_in_tall_block_still_lands() {
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        a.set_velocity(0.0, 20.0);
        let mut block = Object::new(0, 10, 8, 30).unwrap();
        block.set_fixed(true);

        a.update(1.0);
        block.update(1.0);
        assert_eq!(a.position(), (0, 20));

        assert_eq!(a.collide(&mut block), Ok(true));
        assert!(a.current_collision().contains(Collision::DOWN));
        assert!(block.current_collision().contains(Collision::UP));
        assert_eq!(a.position(), (0, 2));
        assert_eq!(a.velocity().y, 0.0);
    }

    #[test]
    fn test_no_contact_without_entry() {
        // Already overlapping on both axes last frame
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        let mut b = Object::new(2, 2, 8, 8).unwrap();
        assert!(!a.just_overlapped(&mut b));
        assert_eq!(a.instant_collision(), Collision::NONE);
    }

    #[test]
    fn test_separate_requires_contact() {
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        let mut b = Object::new(30, 0, 8, 8).unwrap();
        assert_eq!(a.separate_horizontal(&mut b), Err(GfmError::CollisionNotTriggered));
    }

    #[test]
    fn test_two_fixed_objects_cant_collide() {
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        let mut b = moved(20, 0, 4, 0, 8);
        a.set_fixed(true);
        b.set_fixed(true);
        assert_eq!(a.collide(&mut b), Err(GfmError::ObjectsCantCollide));
    }

    #[test]
    fn test_separate_movable_pair_splits_overlap() {
        let mut a = Object::new(0, 0, 8, 8).unwrap();
        let mut b = moved(20, 0, 4, 0, 8);

        assert_eq!(a.collide(&mut b), Ok(true));
        assert_eq!(a.position(), (-2, 0));
        assert_eq!(b.position(), (6, 0));
        assert!(!a.just_overlapped(&mut b));
    }

    #[test]
    fn test_separate_against_fixed_wall_leaves_gap() {
        let mut wall = Object::new(0, 0, 16, 64).unwrap();
        wall.set_fixed(true);
        let mut player = moved(30, 8, 12, 8, 8);
        player.set_velocity(-40.0, 0.0);

        assert_eq!(player.collide(&mut wall), Ok(true));
        assert_eq!(player.position(), (17, 8));
        assert_eq!(player.velocity().x, 0.0);
        assert_eq!(wall.position(), (0, 0));
        assert!(!player.just_overlapped(&mut wall));
    }

    #[test]
    fn test_gravity_settles_on_floor() {
        let mut a = Object::new(10, 0, 8, 8).unwrap();
        a.set_acceleration(0.0, 500.0);
        let mut floor = Object::new(0, 100, 320, 16).unwrap();
        floor.set_fixed(true);

        let mut landed = false;
        for _ in 0..60 {
            a.update(DT);
            floor.update(DT);
            a.collide(&mut floor).unwrap();
            if a.current_collision().contains(Collision::DOWN) {
                landed = true;
                break;
            }
        }

        assert!(landed);
        assert_eq!(a.position().1, 92);
        assert_eq!(a.velocity().y, 0.0);
        assert_eq!(floor.current_collision(), Collision::UP);
    }

    #[test]
    fn test_one_way_hitbox() {
        let platform = Hitbox::new(0, 16, 32, 8, types::RESERVED_2).with_hit_flags(Collision::UP);

        let mut from_above = moved(4, 0, 4, 12, 8);
        assert_eq!(from_above.collide_hitbox(&platform), Ok(true));
        assert_eq!(from_above.position(), (4, 8));

        let mut from_below = moved(4, 30, 4, 20, 8);
        assert_eq!(from_below.collide_hitbox(&platform), Ok(false));
        assert_eq!(from_below.position(), (4, 20));
    }

    #[test]
    fn test_apply_delta_follows_platform() {
        let mut platform = Object::new(0, 50, 32, 8).unwrap();
        platform.set_velocity(60.0, 0.0);
        platform.update(0.1);

        let mut rider = Object::new(4, 42, 8, 8).unwrap();
        rider.apply_delta(&platform);
        assert_eq!(rider.position(), (10, 42));
        assert_eq!(rider.last_fractional_position(), DVec2::new(4.0, 42.0));
    }
}
