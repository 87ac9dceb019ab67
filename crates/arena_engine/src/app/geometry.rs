use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Screen-space vector in surface pixels; `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }

    /// Rescales to `length`, keeping direction. Zero vectors stay zero.
    pub fn with_length(self, length: f32) -> Self {
        let current = self.length();
        if current <= f32::EPSILON {
            return Self::ZERO;
        }
        self * (length / current)
    }

    pub fn rotated(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn from_angle(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { x: cos, y: sin }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Unit vector pointing from `from` toward `to`.
///
/// Derived from `atan2`, so coincident points resolve to angle zero (`+x`)
/// instead of dividing by a zero distance.
pub fn collision_normal(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    Vec2::from_angle(delta.y.atan2(delta.x))
}

/// Clamps a circle centre into `[radius, extent - radius]`.
///
/// When the extent is narrower than the circle the centre is pinned to the
/// middle of the axis.
pub fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    let max = extent - radius;
    if max < radius {
        return extent * 0.5;
    }
    value.clamp(radius, max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn clamp_circle(&self, center: Vec2, radius: f32) -> Vec2 {
        Vec2 {
            x: clamp_axis(center.x, radius, self.width),
            y: clamp_axis(center.y, radius, self.height),
        }
    }

    pub fn contains_circle(&self, center: Vec2, radius: f32) -> bool {
        self.clamp_circle(center, radius) == center
    }

    /// Bounces a circle off the walls: each axis that crosses a bound has its
    /// velocity component inverted and its position clamped.
    pub fn reflect_circle(&self, position: &mut Vec2, velocity: &mut Vec2, radius: f32) {
        if position.x - radius < 0.0 || position.x + radius > self.width {
            velocity.x = -velocity.x;
            position.x = clamp_axis(position.x, radius, self.width);
        }
        if position.y - radius < 0.0 || position.y + radius > self.height {
            velocity.y = -velocity.y;
            position.y = clamp_axis(position.y, radius, self.height);
        }
    }
}
