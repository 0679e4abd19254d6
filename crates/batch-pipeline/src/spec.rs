//! Array metadata and array data containers.

use serde::{Deserialize, Serialize};
use voxel_common::{Coordinate, GridResult, Roi};

use crate::error::{PipelineError, Result};

/// Per-array metadata: where the array sits in physical space and how
/// large one of its cells is.
///
/// The voxel size is the physical extent of one grid cell along each axis.
/// It never changes under cropping, only under explicit resolution-changing
/// transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySpec {
    /// Physical region covered by the array.
    pub roi: Roi,
    /// Physical size of one grid cell along each axis.
    pub voxel_size: Coordinate,
}

impl ArraySpec {
    /// Create a new array spec.
    pub fn new(roi: Roi, voxel_size: Coordinate) -> Self {
        Self { roi, voxel_size }
    }

    /// Number of voxels along each axis, `roi.shape / voxel_size`.
    ///
    /// The division must be exact; a spec whose ROI does not divide by its
    /// voxel size cannot describe array data.
    pub fn grid_shape(&self) -> GridResult<Coordinate> {
        self.roi.shape().checked_div(self.voxel_size)
    }
}

/// A dense block of values tagged with the spec it satisfies.
///
/// Data is stored flat in row-major (z, y, x) order. The shape law
/// `data.len() == product(roi.shape / voxel_size)` is enforced on
/// construction and holds for every array a pipeline returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: Vec<f32>,
    spec: ArraySpec,
}

impl Array {
    /// Create an array, verifying the shape law.
    pub fn new(data: Vec<f32>, spec: ArraySpec) -> Result<Self> {
        let grid = spec.grid_shape()?;
        let expected = grid.0.iter().map(|&v| v as usize).product::<usize>();
        if data.len() != expected {
            return Err(PipelineError::ShapeMismatch {
                expected: grid,
                len: data.len(),
            });
        }
        Ok(Self { data, spec })
    }

    /// The raw values in row-major (z, y, x) order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The spec this array satisfies.
    pub fn spec(&self) -> &ArraySpec {
        &self.spec
    }

    /// Number of voxels along each axis.
    pub fn grid_shape(&self) -> GridResult<Coordinate> {
        self.spec.grid_shape()
    }

    /// Value at a voxel index local to this array, if in range.
    pub fn get(&self, index: Coordinate) -> Option<f32> {
        let shape = self.spec.grid_shape().ok()?;
        if !index.all_non_negative() {
            return None;
        }
        if (0..Coordinate::DIMS).any(|d| index[d] >= shape[d]) {
            return None;
        }
        let flat = (index[0] * shape[1] + index[1]) * shape[2] + index[2];
        self.data.get(flat as usize).copied()
    }

    /// Value at a physical position, using nearest (floor) voxel lookup.
    pub fn value_at(&self, position: Coordinate) -> Option<f32> {
        if !self.spec.roi.contains_point(position) {
            return None;
        }
        let offset = position - self.spec.roi.begin();
        let mut index = [0i64; 3];
        for d in 0..Coordinate::DIMS {
            index[d] = offset[d].div_euclid(self.spec.voxel_size[d]);
        }
        self.get(Coordinate(index))
    }

    /// Copy out the sub-array covering `roi`, which must lie within this
    /// array's ROI and align to its voxel grid. The voxel size is
    /// unchanged; a fresh array is returned.
    pub fn crop(&self, roi: Roi) -> Result<Array> {
        if !self.spec.roi.contains(&roi) {
            return Err(PipelineError::CropOutOfBounds {
                requested: roi,
                available: self.spec.roi,
            });
        }
        let voxel_size = self.spec.voxel_size;
        let offset = (roi.begin() - self.spec.roi.begin()).checked_div(voxel_size)?;
        let window = roi.shape().checked_div(voxel_size)?;
        let shape = self.spec.grid_shape()?;

        let mut data = Vec::with_capacity(window.0.iter().map(|&v| v as usize).product());
        for z in offset[0]..offset[0] + window[0] {
            for y in offset[1]..offset[1] + window[1] {
                let row = (z * shape[1] + y) * shape[2] + offset[2];
                let row = row as usize..(row + window[2]) as usize;
                data.extend_from_slice(&self.data[row]);
            }
        }
        Array::new(data, ArraySpec::new(roi, voxel_size))
    }
}
