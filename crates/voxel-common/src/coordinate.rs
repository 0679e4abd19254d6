//! Integer coordinates in physical or voxel-index space.

use std::fmt;
use std::ops::{Add, Index, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// An ordered (z, y, x) triple of integers.
///
/// A `Coordinate` is either a physical position/extent (in the same length
/// unit as voxel sizes) or a voxel-index position, depending on context.
/// All arithmetic is elementwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Coordinate(pub [i64; 3]);

impl Coordinate {
    /// Number of spatial dimensions.
    pub const DIMS: usize = 3;

    /// Create a coordinate from its (z, y, x) components.
    pub fn new(z: i64, y: i64, x: i64) -> Self {
        Self([z, y, x])
    }

    /// Create a coordinate with the same value on every axis.
    pub fn splat(value: i64) -> Self {
        Self([value; 3])
    }

    /// The origin.
    pub fn zero() -> Self {
        Self([0; 3])
    }

    /// Elementwise minimum.
    pub fn min(self, other: Self) -> Self {
        Self([
            self.0[0].min(other.0[0]),
            self.0[1].min(other.0[1]),
            self.0[2].min(other.0[2]),
        ])
    }

    /// Elementwise maximum.
    pub fn max(self, other: Self) -> Self {
        Self([
            self.0[0].max(other.0[0]),
            self.0[1].max(other.0[1]),
            self.0[2].max(other.0[2]),
        ])
    }

    /// Exact elementwise division.
    ///
    /// Fails with [`GridError::NotDivisible`] if any axis leaves a remainder,
    /// and with [`GridError::NonPositiveDivisor`] if the divisor has a
    /// component that is zero or negative.
    pub fn checked_div(self, divisor: Coordinate) -> GridResult<Coordinate> {
        if !divisor.all_positive() {
            return Err(GridError::NonPositiveDivisor { divisor });
        }
        let mut out = [0i64; 3];
        for d in 0..Self::DIMS {
            if self.0[d] % divisor.0[d] != 0 {
                return Err(GridError::NotDivisible {
                    value: self,
                    divisor,
                });
            }
            out[d] = self.0[d] / divisor.0[d];
        }
        Ok(Self(out))
    }

    /// True if every component is an exact multiple of the corresponding
    /// component of `step`. `step` must be all-positive; a non-positive
    /// step is never a multiple.
    pub fn is_multiple_of(self, step: Coordinate) -> bool {
        step.all_positive() && (0..Self::DIMS).all(|d| self.0[d].rem_euclid(step.0[d]) == 0)
    }

    /// True if every component is strictly positive.
    pub fn all_positive(self) -> bool {
        self.0.iter().all(|&v| v > 0)
    }

    /// True if every component is zero or positive.
    pub fn all_non_negative(self) -> bool {
        self.0.iter().all(|&v| v >= 0)
    }
}

impl Index<usize> for Coordinate {
    type Output = i64;

    fn index(&self, axis: usize) -> &i64 {
        &self.0[axis]
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Self([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Self([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }
}

impl Mul for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: Coordinate) -> Coordinate {
        Self([
            self.0[0] * rhs.0[0],
            self.0[1] * rhs.0[1],
            self.0[2] * rhs.0[2],
        ])
    }
}

impl Mul<i64> for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: i64) -> Coordinate {
        self * Coordinate::splat(rhs)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}
