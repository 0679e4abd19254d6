//! Synthetic providers and grids with known value patterns for tests.
//!
//! The patterns make it cheap to verify data integrity after request
//! rewriting: every voxel encodes something about its own position, so a
//! misplaced crop or an off-by-one replication shows up as a wrong value
//! rather than a wrong-but-plausible one.

use voxel_common::{Coordinate, Roi};

use crate::batch::{Batch, BatchRequest};
use crate::error::Result;
use crate::key::ArrayKey;
use crate::provider::{Provider, SpecTable};
use crate::spec::{Array, ArraySpec};

/// Values encode the sum of their absolute voxel-index coordinates:
/// the voxel at index (z, y, x) holds `z + y + x`.
///
/// `grid_roi` is in voxel-index space (a physical ROI already divided by
/// the voxel size).
pub fn position_grid(grid_roi: Roi) -> Vec<f32> {
    let (b, e) = (grid_roi.begin(), grid_roi.end());
    let mut data = Vec::with_capacity(grid_roi.num_cells());
    for z in b[0]..e[0] {
        for y in b[1]..e[1] {
            for x in b[2]..e[2] {
                data.push((z + y + x) as f32);
            }
        }
    }
    data
}

/// A grid of one constant value.
pub fn constant_grid(shape: Coordinate, value: f32) -> Vec<f32> {
    vec![value; shape.0.iter().map(|&v| v as usize).product()]
}

/// A leaf provider serving position-encoded data for a fixed set of keys,
/// all declared over the same ROI and voxel size.
pub struct PositionSource {
    keys: Vec<ArrayKey>,
    roi: Roi,
    voxel_size: Coordinate,
    specs: SpecTable,
}

impl PositionSource {
    /// Create a source declaring each key over `roi` at `voxel_size`.
    pub fn new(keys: Vec<ArrayKey>, roi: Roi, voxel_size: Coordinate) -> Self {
        Self {
            keys,
            roi,
            voxel_size,
            specs: SpecTable::new(),
        }
    }
}

impl Provider for PositionSource {
    fn setup(&mut self) -> Result<()> {
        for key in &self.keys {
            self.specs
                .declare(key.clone(), ArraySpec::new(self.roi, self.voxel_size))?;
        }
        Ok(())
    }

    fn specs(&self) -> &SpecTable {
        &self.specs
    }

    fn provide(&mut self, request: &BatchRequest) -> Result<Batch> {
        let mut batch = Batch::new();
        for (key, entry) in request.iter() {
            let declared = self.specs.validate_request(key, entry)?;
            let grid_roi = entry.roi.scale_down(declared.voxel_size)?;
            let array = Array::new(
                position_grid(grid_roi),
                ArraySpec::new(entry.roi, declared.voxel_size),
            )?;
            batch.insert(key.clone(), array);
        }
        Ok(batch)
    }
}
