//! Scaled-integer arithmetic
//!
//! Values are stored in 16 bits with [`FRACTION_BITS`] bits of fraction and
//! widened to 32 bits for multiplication and division. The representable
//! range is small (about ±512), so geometry must be normalized into a common
//! space before being converted.

use std::ops::{Add, Neg, Sub};

/// Number of bits used by the fractional part
pub const FRACTION_BITS: u32 = 6;

/// Smallest representable step
pub const EPSILON: f32 = 1.0 / (1 << FRACTION_BITS) as f32;

/// A 10.6 fixed-point number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i16);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << FRACTION_BITS);

    /// Wrap a raw scaled value
    #[must_use]
    pub const fn from_raw(raw: i16) -> Self {
        Self(raw)
    }

    /// The raw scaled value
    #[must_use]
    pub const fn raw(self) -> i16 {
        self.0
    }

    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        Self((value << FRACTION_BITS) as i16)
    }

    /// Convert a float, truncating the fraction toward zero
    #[must_use]
    pub fn from_f32(value: f32) -> Self {
        let scaled = (value.abs() * (1 << FRACTION_BITS) as f32) as i32;
        if value < 0.0 {
            Self(-scaled as i16)
        } else {
            Self(scaled as i16)
        }
    }

    #[must_use]
    pub fn to_f32(self) -> f32 {
        f32::from(self.0) * EPSILON
    }

    /// Integer part, rounded toward negative infinity
    #[must_use]
    pub const fn to_int(self) -> i32 {
        (self.0 as i32) >> FRACTION_BITS
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    #[must_use]
    pub const fn mul(self, other: Self) -> Self {
        Self(((self.0 as i32 * other.0 as i32) >> FRACTION_BITS) as i16)
    }

    /// Divide, returning `None` when `other` is zero
    #[must_use]
    pub const fn checked_div(self, other: Self) -> Option<Self> {
        if other.0 == 0 {
            return None;
        }
        Some(Self((((self.0 as i32) << FRACTION_BITS) / other.0 as i32) as i16))
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}
