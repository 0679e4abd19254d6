//! Axis-aligned regions of interest in physical coordinate space.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::Coordinate;

/// An axis-aligned box described by its begin corner and shape.
///
/// A `Roi` lives in physical coordinate space unless explicitly scaled into
/// voxel-index space with [`Roi::scale_down`]. The begin corner is inclusive,
/// the end corner (`begin + shape`) exclusive. Shape components are never
/// negative; a zero component makes the ROI empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    begin: Coordinate,
    shape: Coordinate,
}

impl Roi {
    /// Create a ROI from its begin corner and shape.
    pub fn new(begin: Coordinate, shape: Coordinate) -> GridResult<Self> {
        if !shape.all_non_negative() {
            return Err(GridError::NegativeShape { shape });
        }
        Ok(Self { begin, shape })
    }

    /// Create a ROI from its begin (inclusive) and end (exclusive) corners.
    pub fn from_begin_end(begin: Coordinate, end: Coordinate) -> GridResult<Self> {
        Self::new(begin, end - begin)
    }

    /// The inclusive begin corner.
    pub fn begin(&self) -> Coordinate {
        self.begin
    }

    /// The exclusive end corner, `begin + shape`.
    pub fn end(&self) -> Coordinate {
        self.begin + self.shape
    }

    /// The extent along each axis.
    pub fn shape(&self) -> Coordinate {
        self.shape
    }

    /// True if the ROI covers no cells.
    pub fn is_empty(&self) -> bool {
        self.shape.0.iter().any(|&v| v == 0)
    }

    /// Number of unit cells covered.
    pub fn num_cells(&self) -> usize {
        self.shape.0.iter().map(|&v| v as usize).product()
    }

    /// Scale into a coarser unit: multiply begin and shape elementwise.
    ///
    /// Typically used to map a voxel-index ROI back to physical space.
    pub fn scale_up(&self, factor: Coordinate) -> Roi {
        Roi {
            begin: self.begin * factor,
            shape: self.shape * factor,
        }
    }

    /// Scale into a finer unit: divide begin and shape elementwise.
    ///
    /// Typically used to map a physical ROI to voxel-index space. The
    /// division must be exact; a fractional result is a caller error and
    /// fails with [`GridError::NotDivisible`].
    pub fn scale_down(&self, divisor: Coordinate) -> GridResult<Roi> {
        Ok(Roi {
            begin: self.begin.checked_div(divisor)?,
            shape: self.shape.checked_div(divisor)?,
        })
    }

    /// True if `other` lies entirely within this ROI.
    pub fn contains(&self, other: &Roi) -> bool {
        let (b, e) = (self.begin, self.end());
        let (ob, oe) = (other.begin, other.end());
        (0..Coordinate::DIMS).all(|d| ob[d] >= b[d] && oe[d] <= e[d])
    }

    /// True if the point lies within this ROI.
    pub fn contains_point(&self, point: Coordinate) -> bool {
        let (b, e) = (self.begin, self.end());
        (0..Coordinate::DIMS).all(|d| point[d] >= b[d] && point[d] < e[d])
    }

    /// The overlap of two ROIs, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Roi) -> Option<Roi> {
        let begin = self.begin.max(other.begin);
        let end = self.end().min(other.end());
        if (0..Coordinate::DIMS).any(|d| end[d] <= begin[d]) {
            return None;
        }
        Some(Roi {
            begin,
            shape: end - begin,
        })
    }

    /// The smallest ROI covering both inputs.
    pub fn union_hull(&self, other: &Roi) -> Roi {
        let begin = self.begin.min(other.begin);
        let end = self.end().max(other.end());
        Roi {
            begin,
            shape: end - begin,
        }
    }

    /// True if both begin and end land on the grid with the given step.
    pub fn is_aligned_to(&self, step: Coordinate) -> bool {
        self.begin.is_multiple_of(step) && self.end().is_multiple_of(step)
    }

    /// True if the begin corner lands on the grid with the given step.
    pub fn begin_aligned_to(&self, step: Coordinate) -> bool {
        self.begin.is_multiple_of(step)
    }

    /// The smallest step-aligned ROI enclosing this one: begin is floored
    /// to the grid, end is ceiled.
    pub fn snap_outward(&self, step: Coordinate) -> GridResult<Roi> {
        if !step.all_positive() {
            return Err(GridError::NonPositiveDivisor { divisor: step });
        }
        let mut begin = [0i64; 3];
        let mut end = [0i64; 3];
        let e = self.end();
        for d in 0..Coordinate::DIMS {
            begin[d] = self.begin[d].div_euclid(step[d]) * step[d];
            end[d] = e[d].div_euclid(step[d]) * step[d];
            if e[d].rem_euclid(step[d]) != 0 {
                end[d] += step[d];
            }
        }
        Roi::from_begin_end(Coordinate(begin), Coordinate(end))
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end())
    }
}
