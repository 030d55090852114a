//! 2D camera with a deadzone
//!
//! The camera is a view rectangle inside a world rectangle. It follows a
//! point only once that point leaves the deadzone, and never scrolls past
//! the world edges.

use crate::core::error::{GfmError, GfmResult};
use crate::physics::{Aabb, Object};

/// Scrolling view over the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    /// Top-left corner in world space
    x: i32,
    y: i32,
    view_width: i32,
    view_height: i32,
    world_width: i32,
    world_height: i32,
    /// Deadzone center, relative to the view
    dead_x: i32,
    dead_y: i32,
    /// Deadzone half extents
    dead_half_width: i32,
    dead_half_height: i32,
}

impl Camera {
    /// Create a camera whose world is exactly as large as the view.
    ///
    /// The deadzone starts out covering the whole view.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty view
    pub fn new(view_width: i32, view_height: i32) -> GfmResult<Self> {
        if view_width <= 0 || view_height <= 0 {
            return Err(GfmError::InvalidArgument(format!(
                "camera view {view_width}x{view_height} is empty"
            )));
        }
        Ok(Self {
            x: 0,
            y: 0,
            view_width,
            view_height,
            world_width: view_width,
            world_height: view_height,
            dead_x: view_width / 2,
            dead_y: view_height / 2,
            dead_half_width: view_width / 2,
            dead_half_height: view_height / 2,
        })
    }

    /// Resize the world and pull the view back inside it.
    ///
    /// A world smaller than the view keeps the view centered on it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty world
    pub fn set_world_dimensions(&mut self, width: i32, height: i32) -> GfmResult<()> {
        if width <= 0 || height <= 0 {
            return Err(GfmError::InvalidArgument(format!(
                "world {width}x{height} is empty"
            )));
        }
        self.world_width = width;
        self.world_height = height;
        self.clamp();
        Ok(())
    }

    /// Set the deadzone from its top-left corner, relative to the view.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the deadzone doesn't fit in the view
    pub fn set_deadzone(&mut self, x: i32, y: i32, width: i32, height: i32) -> GfmResult<()> {
        if x < 0
            || y < 0
            || width <= 0
            || height <= 0
            || x + width > self.view_width
            || y + height > self.view_height
        {
            return Err(GfmError::InvalidArgument(format!(
                "deadzone ({x}, {y}, {width}, {height}) is outside the view"
            )));
        }
        self.dead_half_width = width / 2;
        self.dead_half_height = height / 2;
        self.dead_x = x + self.dead_half_width;
        self.dead_y = y + self.dead_half_height;
        Ok(())
    }

    /// Scroll just enough to bring `(x, y)` back into the deadzone.
    ///
    /// Returns whether the camera moved.
    pub fn center_at_point(&mut self, x: i32, y: i32) -> bool {
        let old = (self.x, self.y);

        let dx = x - (self.x + self.dead_x);
        if dx > self.dead_half_width {
            self.x = x - self.dead_x - self.dead_half_width;
        } else if dx < -self.dead_half_width {
            self.x = x - self.dead_x + self.dead_half_width;
        }

        let dy = y - (self.y + self.dead_y);
        if dy > self.dead_half_height {
            self.y = y - self.dead_y - self.dead_half_height;
        } else if dy < -self.dead_half_height {
            self.y = y - self.dead_y + self.dead_half_height;
        }

        self.clamp();
        old != (self.x, self.y)
    }

    fn clamp(&mut self) {
        self.x = clamp_axis(self.x, self.view_width, self.world_width);
        self.y = clamp_axis(self.y, self.view_height, self.world_height);
    }

    /// Convert a point on the screen into world space.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the point is outside the view
    pub fn screen_to_world(&self, x: i32, y: i32) -> GfmResult<(i32, i32)> {
        if x < 0 || y < 0 || x >= self.view_width || y >= self.view_height {
            return Err(GfmError::InvalidArgument(format!(
                "({x}, {y}) is off screen"
            )));
        }
        Ok((x + self.x, y + self.y))
    }

    #[inline]
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn view_size(&self) -> (i32, i32) {
        (self.view_width, self.view_height)
    }

    #[inline]
    #[must_use]
    pub const fn world_size(&self) -> (i32, i32) {
        (self.world_width, self.world_height)
    }

    /// Visible rectangle, in world space
    #[must_use]
    pub const fn view(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.view_width, self.view_height)
    }

    /// Whether any part of `bounds` is visible
    #[must_use]
    pub const fn is_inside(&self, bounds: &Aabb) -> bool {
        self.view().overlaps(bounds)
    }

    #[must_use]
    pub const fn is_object_inside(&self, object: &Object) -> bool {
        self.is_inside(&object.aabb())
    }
}

const fn clamp_axis(pos: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        (world - view) / 2
    } else if pos < 0 {
        0
    } else if pos + view > world {
        world - view
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrolling_camera() -> Camera {
        let mut camera = Camera::new(160, 120).unwrap();
        camera.set_world_dimensions(640, 480).unwrap();
        camera.set_deadzone(60, 40, 40, 40).unwrap();
        camera
    }

    #[test]
    fn test_new_camera_covers_world() {
        let camera = Camera::new(160, 120).unwrap();
        assert_eq!(camera.position(), (0, 0));
        assert_eq!(camera.world_size(), (160, 120));
        assert!(Camera::new(0, 120).is_err());
    }

    #[test]
    fn test_point_inside_deadzone_does_not_move() {
        let mut camera = scrolling_camera();
        assert!(!camera.center_at_point(80, 60));
        assert!(!camera.center_at_point(99, 79));
        assert_eq!(camera.position(), (0, 0));
    }

    #[test]
    fn test_point_leaving_deadzone_scrolls() {
        let mut camera = scrolling_camera();
        assert!(camera.center_at_point(150, 60));
        // The point sits on the deadzone's right edge afterwards
        assert_eq!(camera.position(), (50, 0));
        assert!(!camera.center_at_point(150, 60));
    }

    #[test]
    fn test_camera_clamps_to_world() {
        let mut camera = scrolling_camera();
        camera.center_at_point(10_000, 10_000);
        assert_eq!(camera.position(), (480, 360));
        camera.center_at_point(-10_000, -10_000);
        assert_eq!(camera.position(), (0, 0));
    }

    #[test]
    fn test_small_world_is_centered() {
        let mut camera = Camera::new(160, 120).unwrap();
        camera.set_world_dimensions(100, 120).unwrap();
        assert_eq!(camera.position(), (-30, 0));
    }

    #[test]
    fn test_screen_to_world() {
        let mut camera = scrolling_camera();
        camera.center_at_point(150, 60);
        assert_eq!(camera.screen_to_world(10, 20).unwrap(), (60, 20));
        assert!(camera.screen_to_world(160, 0).is_err());
    }

    #[test]
    fn test_visibility() {
        let camera = scrolling_camera();
        assert!(camera.is_inside(&Aabb::new(150, 100, 20, 20)));
        assert!(!camera.is_inside(&Aabb::new(160, 0, 8, 8)));
        assert!(!camera.is_inside(&Aabb::new(-8, 0, 8, 8)));
    }
}
