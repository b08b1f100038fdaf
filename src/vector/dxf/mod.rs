//! Curve interpolation for DXF entities.
//!
//! [`nurbs`] evaluates rational B-splines such as those of SPLINE entities,
//! [`LeaderLine`] fits a clamped cubic spline through the vertices of a
//! spline-pathed LEADER.

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

pub mod nurbs;

mod leader;

pub use leader::{get_control_points, LeaderLine, DEFAULT_MAX_CONTROL_POINTS};

/// A point or vector in three dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DxfTriple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl DxfTriple {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        DxfTriple { x, y, z }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Scale to unit length. Zero vectors are left unchanged.
    pub fn normalize(&mut self) {
        let length = self.length();
        if length != 0.0 {
            self.x /= length;
            self.y /= length;
            self.z /= length;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl Add for DxfTriple {
    type Output = DxfTriple;

    fn add(self, rhs: DxfTriple) -> DxfTriple {
        DxfTriple::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for DxfTriple {
    fn add_assign(&mut self, rhs: DxfTriple) {
        *self = *self + rhs;
    }
}

impl Sub for DxfTriple {
    type Output = DxfTriple;

    fn sub(self, rhs: DxfTriple) -> DxfTriple {
        DxfTriple::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for DxfTriple {
    type Output = DxfTriple;

    fn mul(self, rhs: f64) -> DxfTriple {
        DxfTriple::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<f64> for DxfTriple {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl From<geo_types::Coord<f64>> for DxfTriple {
    fn from(coord: geo_types::Coord<f64>) -> Self {
        DxfTriple::new(coord.x, coord.y, 0.0)
    }
}

impl From<DxfTriple> for geo_types::Coord<f64> {
    fn from(triple: DxfTriple) -> Self {
        geo_types::Coord {
            x: triple.x,
            y: triple.y,
        }
    }
}
