//! Point and displacement types
//!
//! `Position` is a point in play-field coordinates; `Vector2d` is a
//! displacement between two points. Both are thin wrappers over `glam::Vec2`.

use std::ops::{Add, Mul, Neg};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A point on the play field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Point at `fraction` of the way from `self` to `other`
    pub fn interpolate(self, other: Position, fraction: f32) -> Position {
        self.as_vec2().lerp(other.as_vec2(), fraction).into()
    }

    /// Move this position in place
    pub fn translate(&mut self, offset: Vector2d) {
        self.x += offset.0.x;
        self.y += offset.0.y;
    }

    /// Copy of this position moved by `offset`
    pub fn offset(self, offset: Vector2d) -> Position {
        (self.as_vec2() + offset.0).into()
    }

    pub fn distance(self, other: Position) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }

    /// Displacement from `self` to `other`
    pub fn vector_to(self, other: Position) -> Vector2d {
        Vector2d(other.as_vec2() - self.as_vec2())
    }

    /// Clamp both coordinates into the box spanned by `min` and `max`
    pub fn clamp(self, min: Position, max: Position) -> Position {
        self.as_vec2().clamp(min.as_vec2(), max.as_vec2()).into()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// A displacement with magnitude/direction operations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2d(pub Vec2);

impl Vector2d {
    pub const ZERO: Vector2d = Vector2d(Vec2::ZERO);

    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.0.length()
    }

    /// Same direction, new length. A zero vector stays zero.
    pub fn scale_to_magnitude(self, magnitude: f32) -> Vector2d {
        Vector2d(self.0.normalize_or_zero() * magnitude)
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: f32) -> Vector2d {
        Vector2d(Vec2::from_angle(angle).rotate(self.0))
    }

    /// Angle of this vector from the +x axis
    pub fn angle(self) -> f32 {
        self.0.y.atan2(self.0.x)
    }
}

impl Add for Vector2d {
    type Output = Vector2d;

    fn add(self, rhs: Vector2d) -> Vector2d {
        Vector2d(self.0 + rhs.0)
    }
}

impl Mul<f32> for Vector2d {
    type Output = Vector2d;

    fn mul(self, rhs: f32) -> Vector2d {
        Vector2d(self.0 * rhs)
    }
}

impl Neg for Vector2d {
    type Output = Vector2d;

    fn neg(self) -> Vector2d {
        Vector2d(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let a = Position::new(0.0, 10.0);
        let b = Position::new(100.0, 30.0);

        assert_eq!(a.interpolate(b, 0.0), a);
        assert_eq!(a.interpolate(b, 1.0), b);
        let mid = a.interpolate(b, 0.5);
        assert!((mid.x - 50.0).abs() < 0.001);
        assert!((mid.y - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_scale_to_magnitude() {
        let v = Vector2d::new(3.0, 4.0).scale_to_magnitude(10.0);
        assert!((v.length() - 10.0).abs() < 0.001);
        assert!((v.0.x - 6.0).abs() < 0.001);

        // Zero vectors have no direction to scale
        assert_eq!(Vector2d::ZERO.scale_to_magnitude(5.0), Vector2d::ZERO);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = Vector2d::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert!(v.0.x.abs() < 0.001);
        assert!((v.0.y - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_translate_and_offset_agree() {
        let mut p = Position::new(1.0, 2.0);
        let d = Vector2d::new(-4.0, 0.5);
        let q = p.offset(d);
        p.translate(d);
        assert_eq!(p, q);
        assert_eq!(Position::new(1.0, 2.0).vector_to(q), d);
    }
}
