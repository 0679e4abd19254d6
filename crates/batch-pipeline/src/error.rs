//! Error types for batch pipeline operations.

use thiserror::Error;
use voxel_common::{Coordinate, GridError, Roi};

use crate::key::ArrayKey;

/// Result type alias using PipelineError.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while assembling a pipeline or serving a batch.
///
/// All of these are unrecoverable for the current `provide` call: they
/// propagate immediately to the caller and no partial batch is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A requested ROI does not land on the required voxel grid.
    #[error("array {key}: ROI {roi} does not align to voxel grid {step}")]
    Misaligned {
        key: ArrayKey,
        roi: Roi,
        step: Coordinate,
    },

    /// A requested ROI is not contained in a provider's declared ROI.
    #[error("array {key}: requested ROI {requested} is outside provided ROI {provided}")]
    OutOfBounds {
        key: ArrayKey,
        requested: Roi,
        provided: Roi,
    },

    /// A request references an array no provider in the pipeline declares.
    #[error("no provider declares array {key}")]
    UnknownKey { key: ArrayKey },

    /// A request pins a voxel size that differs from the declared one.
    #[error("array {key}: requested voxel size {requested} does not match declared {declared}")]
    VoxelSizeMismatch {
        key: ArrayKey,
        requested: Coordinate,
        declared: Coordinate,
    },

    /// Two providers declare the same array.
    #[error("array {key} is already declared by an upstream provider")]
    AlreadyDeclared { key: ArrayKey },

    /// A resampling factor has a component below 1.
    #[error("resampling factor {factor} must be at least 1 on every axis")]
    InvalidFactor { factor: Coordinate },

    /// A resampling node was configured with identical source and target.
    #[error("source and target of a resampling node must differ, got {key} for both")]
    SelfReference { key: ArrayKey },

    /// Array data does not match the grid shape implied by its spec.
    #[error("data length {len} does not match grid shape {expected}")]
    ShapeMismatch { expected: Coordinate, len: usize },

    /// A crop window extends past the data it is applied to.
    #[error("crop ROI {requested} is not within array ROI {available}")]
    CropOutOfBounds { requested: Roi, available: Roi },

    /// The pipeline was used out of order.
    #[error("setup() must complete exactly once before provide()")]
    NotSetUp,

    /// A ROI or voxel size division was not exact where exactness is
    /// required.
    #[error(transparent)]
    Grid(#[from] GridError),
}
