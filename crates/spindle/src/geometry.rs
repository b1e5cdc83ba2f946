use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotates about the origin. Screen space is y-down, so positive degrees
    /// turn clockwise on screen, matching how the ring is drawn.
    pub fn rotated(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Clockwise angle in degrees measured from "straight up", the ring's
    /// reference direction.
    pub fn bearing(self) -> f64 {
        self.x.atan2(-self.y).to_degrees()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero, negative or non-finite extents can't be fitted or anchored.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_rotation_is_clockwise_in_screen_space() {
        let up = Point::new(0.0, -1.0);
        assert!(close(up.rotated(90.0), Point::new(1.0, 0.0)));
        assert!(close(up.rotated(-90.0), Point::new(-1.0, 0.0)));
        assert!(close(up.rotated(180.0), Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_bearing_matches_rotation() {
        let up = Point::new(0.0, -10.0);
        for deg in [0.0, 30.0, 90.0, 135.0, -45.0, -170.0] {
            assert!((up.rotated(deg).bearing() - deg).abs() < 1e-9, "bearing of {deg}");
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(10.0, f64::NAN).is_degenerate());
        assert!(Size::new(-1.0, 10.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
    }
}
