//! Common spatial types shared across voxel pipeline crates.

pub mod coordinate;
pub mod error;
pub mod roi;

pub use coordinate::Coordinate;
pub use error::{GridError, GridResult};
pub use roi::Roi;
