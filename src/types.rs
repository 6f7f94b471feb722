//! Common value types for the trailer layout.
//!
//! Axis convention used throughout the crate:
//! - `x`: across the trailer (width axis)
//! - `y`: vertical (presentation only, layout keeps it at 0)
//! - `z`: along the trailer (length axis)

use std::ops::{Add, Mul, Sub};

/// Global numerical tolerance for floating-point comparisons.
///
/// Used when comparing accumulated widths/lengths against the container extents.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in trailer space.
///
/// # Examples
/// ```
/// use pallet_layout::types::Vec3;
///
/// let corner = Vec3::new(0.8, 0.0, 0.0);
/// let extent = Vec3::new(0.8, 1.2, 1.2);
/// let center = corner + extent * 0.5;
/// assert!((center.x - 1.2).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    ///
    /// # Parameters
    /// * `x` - across component
    /// * `y` - vertical component
    /// * `z` - along component
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector, or `None` for a (near) zero vector.
    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len <= EPSILON_GENERAL || !len.is_finite() {
            None
        } else {
            Some(*self * (1.0 / len))
        }
    }

    /// Checks if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

/// RGB color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Default additive offset used by [`Color::brighten`].
    pub const BRIGHTEN_OFFSET: f64 = 0.1;

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    ///
    /// # Examples
    /// ```
    /// use pallet_layout::types::Color;
    ///
    /// let red = Color::from_hex("#ff0000").unwrap();
    /// assert_eq!(red.to_hex(), "#ff0000");
    /// assert!(Color::from_hex("#ff00").is_none());
    /// ```
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|v| f64::from(v) / 255.0)
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Formats as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// Highlight color: every channel becomes `min((c + offset) * factor, 1)`.
    pub fn brighten(&self, factor: f64, offset: f64) -> Self {
        let lift = |c: f64| ((c + offset) * factor).min(1.0);
        Self::new(lift(self.r), lift(self.g), lift(self.b))
    }

    /// Linear interpolation towards `target` by `t`.
    pub fn lerp(&self, target: &Self, t: f64) -> Self {
        Self::new(
            self.r + (target.r - self.r) * t,
            self.g + (target.g - self.g) * t,
            self.b + (target.b - self.b) * t,
        )
    }

    /// Largest per-channel difference, handy for convergence checks.
    pub fn max_channel_delta(&self, other: &Self) -> f64 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }
}

/// Trait for objects with a rectangular floor footprint.
///
/// `width` runs across the trailer, `length` along it.
pub trait Footprint {
    fn width(&self) -> f64;
    fn length(&self) -> f64;

    /// Floor area covered by the footprint.
    fn area(&self) -> f64 {
        self.width() * self.length()
    }
}

/// Validation helpers shared by the container and unit constructors.
pub mod validation {
    /// Checks that a dimension is finite and strictly positive.
    #[inline]
    pub fn is_valid_dimension(value: f64) -> bool {
        value.is_finite() && value > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert!((a.dot(&b) - 32.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_normalized_rejects_zero_vector() {
        assert!(Vec3::zero().normalized().is_none());
        let n = Vec3::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_color_hex_roundtrip_of_palette_entry() {
        let color = Color::from_hex("#5fd1fa").unwrap();
        assert_eq!(color.to_hex(), "#5fd1fa");
        assert!(Color::from_hex("5fd1fa").is_some());
        assert!(Color::from_hex("#zzzzzz").is_none());
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn test_brighten_clamps_to_one() {
        let base = Color::new(0.2, 0.5, 0.0);
        let bright = base.brighten(2.0, Color::BRIGHTEN_OFFSET);
        assert!((bright.r - 0.6).abs() < EPSILON_GENERAL);
        assert!((bright.g - 1.0).abs() < EPSILON_GENERAL);
        assert!((bright.b - 0.2).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_lerp_halfway() {
        let black = Color::new(0.0, 0.0, 0.0);
        let white = Color::new(1.0, 1.0, 1.0);
        let mid = black.lerp(&white, 0.5);
        assert!(mid.max_channel_delta(&Color::new(0.5, 0.5, 0.5)) < EPSILON_GENERAL);
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::is_valid_dimension(0.8));
        assert!(!validation::is_valid_dimension(0.0));
        assert!(!validation::is_valid_dimension(-1.0));
        assert!(!validation::is_valid_dimension(f64::NAN));
        assert!(!validation::is_valid_dimension(f64::INFINITY));
    }
}
