//! The provider contract and declared-spec tables.
//!
//! Every pipeline stage answers two questions: "what can you produce?"
//! (declared once during setup) and "produce this" (per request). Leaf
//! sources implement [`Provider`] directly; transforms implement [`Node`]
//! and are attached to a source with [`crate::Pipeline`].

use std::collections::HashMap;

use crate::batch::{Batch, BatchRequest, RequestSpec};
use crate::error::{PipelineError, Result};
use crate::key::ArrayKey;
use crate::spec::ArraySpec;

/// Declared specs: for each array key a provider can serve, the maximal
/// ROI and the voxel size it is served at.
#[derive(Debug, Clone, Default)]
pub struct SpecTable {
    specs: HashMap<ArrayKey, ArraySpec>,
}

impl SpecTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one array. Each key may be declared once per pipeline.
    pub fn declare(&mut self, key: ArrayKey, spec: ArraySpec) -> Result<()> {
        if self.specs.contains_key(&key) {
            return Err(PipelineError::AlreadyDeclared { key });
        }
        self.specs.insert(key, spec);
        Ok(())
    }

    /// The declared spec for one key, if any.
    pub fn get(&self, key: &ArrayKey) -> Option<&ArraySpec> {
        self.specs.get(key)
    }

    /// True if the key is declared.
    pub fn contains(&self, key: &ArrayKey) -> bool {
        self.specs.contains_key(key)
    }

    /// Iterate over all declarations.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &ArraySpec)> {
        self.specs.iter()
    }

    /// Number of declared arrays.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Fold another table into this one, rejecting duplicate keys.
    pub fn merge(&mut self, other: SpecTable) -> Result<()> {
        for (key, spec) in other.specs {
            self.declare(key, spec)?;
        }
        Ok(())
    }

    /// Check one request entry against the declaration for its key and
    /// return that declaration.
    ///
    /// Fails with [`PipelineError::UnknownKey`] for undeclared keys,
    /// [`PipelineError::OutOfBounds`] for ROIs outside the declared ROI,
    /// [`PipelineError::Misaligned`] for ROIs off the declared voxel grid,
    /// and [`PipelineError::VoxelSizeMismatch`] when the request pins a
    /// voxel size other than the declared one.
    pub fn validate_request(&self, key: &ArrayKey, request: &RequestSpec) -> Result<&ArraySpec> {
        let declared = self.get(key).ok_or_else(|| PipelineError::UnknownKey {
            key: key.clone(),
        })?;
        if let Some(requested) = request.voxel_size {
            if requested != declared.voxel_size {
                return Err(PipelineError::VoxelSizeMismatch {
                    key: key.clone(),
                    requested,
                    declared: declared.voxel_size,
                });
            }
        }
        if !declared.roi.contains(&request.roi) {
            return Err(PipelineError::OutOfBounds {
                key: key.clone(),
                requested: request.roi,
                provided: declared.roi,
            });
        }
        if !request.roi.is_aligned_to(declared.voxel_size) {
            return Err(PipelineError::Misaligned {
                key: key.clone(),
                roi: request.roi,
                step: declared.voxel_size,
            });
        }
        Ok(declared)
    }
}

/// A pipeline stage that can declare what it offers and produce batches
/// satisfying requests.
///
/// `setup` runs exactly once, after any upstream setup, before any
/// `provide`. `provide` is synchronous and fully materializes its result:
/// for every requested key it returns an array whose spec ROI exactly
/// equals the requested ROI at the declared voxel size, or fails without
/// returning a partial batch.
pub trait Provider {
    /// Populate the declared-spec table.
    fn setup(&mut self) -> Result<()>;

    /// The declared specs. Only meaningful after `setup` succeeded.
    fn specs(&self) -> &SpecTable;

    /// Produce a batch satisfying `request`.
    fn provide(&mut self, request: &BatchRequest) -> Result<Batch>;
}

/// A transform stage chained downstream of a provider.
///
/// A node sees its upstream's declared specs during setup and returns the
/// specs it adds on top. During `provide` it may rewrite the request
/// (add/remove keys, change ROIs) before delegating upstream, then
/// post-process the returned batch.
pub trait Node {
    /// Inspect upstream declarations, return the specs this node adds.
    fn setup(&mut self, upstream: &SpecTable) -> Result<SpecTable>;

    /// Serve a request, delegating to `upstream` for source data.
    fn provide(&mut self, request: &BatchRequest, upstream: &mut dyn Provider) -> Result<Batch>;
}
