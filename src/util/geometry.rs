//! Fixed-point geometric primitives and intersection tests
//!
//! Four primitives are defined:
//! - [`Axis`]: a 1D closed range
//! - [`Point`]: a 2D point
//! - [`Line`]: a 2D segment `y = a*x + b` over a horizontal domain (can't be vertical)
//! - [`Rect`]: a rectangle defined from its center and half extents
//!
//! All tests are inclusive: touching primitives intersect.

use super::fixed::Fixed;

/// Closed range `[lt, gt]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Axis {
    pub lt: Fixed,
    pub gt: Fixed,
}

impl Axis {
    /// Build a range, ordering the ends
    #[must_use]
    pub fn new(a: Fixed, b: Fixed) -> Self {
        if a <= b { Self { lt: a, gt: b } } else { Self { lt: b, gt: a } }
    }

    #[must_use]
    pub fn contains(&self, value: Fixed) -> bool {
        value >= self.lt && value <= self.gt
    }

    #[must_use]
    pub fn intersects(&self, other: &Axis) -> bool {
        self.gt >= other.lt && other.gt >= self.lt
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point {
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }
}

/// Non-vertical line segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Line {
    /// Slope
    pub a: Fixed,
    /// Value of `y` at `x == 0`
    pub b: Fixed,
    /// Horizontal domain
    pub x: Axis,
}

impl Line {
    /// Segment through two points with distinct `x`
    #[must_use]
    pub fn from_points(p1: Point, p2: Point) -> Option<Self> {
        let a = (p2.y - p1.y).checked_div(p2.x - p1.x)?;
        let b = p1.y - p1.x.mul(a);
        Some(Self {
            a,
            b,
            x: Axis::new(p1.x, p2.x),
        })
    }

    /// Horizontal segment at height `y`
    #[must_use]
    pub fn horizontal(y: Fixed, x: Axis) -> Self {
        Self { a: Fixed::ZERO, b: y, x }
    }

    #[must_use]
    pub fn y_at(&self, x: Fixed) -> Fixed {
        x.mul(self.a) + self.b
    }

    /// Vertical range covered by the segment
    #[must_use]
    pub fn image(&self) -> Axis {
        Axis::new(self.y_at(self.x.lt), self.y_at(self.x.gt))
    }

    #[must_use]
    pub fn intersects(&self, other: &Line) -> bool {
        if self.a == other.a {
            // Parallel: only collinear segments may share points
            return self.b == other.b && self.x.intersects(&other.x);
        }
        match (other.b - self.b).checked_div(self.a - other.a) {
            Some(x) => self.x.contains(x) && other.x.contains(x),
            None => false,
        }
    }

    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        let horizontal = rect.horizontal_axis();
        let vertical = rect.vertical_axis();

        let top = Line::horizontal(vertical.lt, horizontal);
        let bottom = Line::horizontal(vertical.gt, horizontal);
        if self.intersects(&top) || self.intersects(&bottom) {
            return true;
        }

        for edge_x in [horizontal.lt, horizontal.gt] {
            if self.x.contains(edge_x) && vertical.contains(self.y_at(edge_x)) {
                return true;
            }
        }

        // Segment fully inside the rectangle
        let start = Point::new(self.x.lt, self.y_at(self.x.lt));
        let end = Point::new(self.x.gt, self.y_at(self.x.gt));
        rect.contains_point(&start) && rect.contains_point(&end)
    }
}

/// Center-defined rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub center_x: Fixed,
    pub center_y: Fixed,
    pub half_width: Fixed,
    pub half_height: Fixed,
}

impl Rect {
    /// Build from a top-left corner and dimensions in whole units
    #[must_use]
    pub fn from_corner(x: i32, y: i32, width: i32, height: i32) -> Self {
        let half_width = Fixed::from_f32(width as f32 / 2.0);
        let half_height = Fixed::from_f32(height as f32 / 2.0);
        Self {
            center_x: Fixed::from_int(x) + half_width,
            center_y: Fixed::from_int(y) + half_height,
            half_width,
            half_height,
        }
    }

    #[must_use]
    pub fn horizontal_axis(&self) -> Axis {
        Axis::new(self.center_x - self.half_width, self.center_x + self.half_width)
    }

    #[must_use]
    pub fn vertical_axis(&self) -> Axis {
        Axis::new(self.center_y - self.half_height, self.center_y + self.half_height)
    }

    #[must_use]
    pub fn contains_point(&self, point: &Point) -> bool {
        (self.center_x - point.x).abs() <= self.half_width
            && (self.center_y - point.y).abs() <= self.half_height
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        (self.center_x - other.center_x).abs() <= self.half_width + other.half_width
            && (self.center_y - other.center_y).abs() <= self.half_height + other.half_height
    }
}
