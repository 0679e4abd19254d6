//! Composable batch pipeline for spatially-indexed, multi-resolution arrays.
//!
//! This crate provides the request/response protocol used to pull
//! named, spec-tagged voxel arrays ("batches") through a chain of
//! providers. Pipeline stages can transparently alter resolution and
//! cropping while preserving correctness:
//!
//! ```text
//! BatchRequest
//!      │
//!      ▼
//! Pipeline::provide(request)
//!      │
//!      ├─► most-downstream node rewrites the request
//!      │        (e.g. UpSample maps a fine-resolution ROI
//!      │         onto the coarse source grid)
//!      │
//!      ├─► delegates upstream until the leaf source produces data
//!      │
//!      └─► node post-processes the returned Batch
//!               │
//!               ▼
//!          Batch back to the caller
//! ```
//!
//! # Example
//!
//! ```rust
//! use batch_pipeline::testdata::PositionSource;
//! use batch_pipeline::{ArrayKey, BatchRequest, Coordinate, Pipeline, Provider, Roi, UpSample};
//!
//! let raw = ArrayKey::new("raw");
//! let raw_up = ArrayKey::new("raw_upsampled");
//!
//! let roi = Roi::new(Coordinate::zero(), Coordinate::splat(1000)).unwrap();
//! let source = PositionSource::new(vec![raw.clone()], roi, Coordinate::splat(4));
//!
//! let mut pipeline = Pipeline::new(source).then(UpSample::new(
//!     raw.clone(),
//!     Coordinate::splat(2),
//!     raw_up.clone(),
//! ));
//! pipeline.setup().unwrap();
//!
//! let request = BatchRequest::new().add(
//!     raw_up.clone(),
//!     Roi::new(Coordinate::splat(40), Coordinate::splat(120)).unwrap(),
//! );
//! let batch = pipeline.provide(&request).unwrap();
//! assert_eq!(batch.get(&raw_up).unwrap().get(Coordinate::zero()), Some(30.0));
//! ```

pub mod batch;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod provider;
pub mod spec;
pub mod testdata;
pub mod upsample;

// Re-export commonly used types at crate root
pub use batch::{Batch, BatchRequest, RequestSpec};
pub use error::{PipelineError, Result};
pub use key::ArrayKey;
pub use pipeline::{chain, NodeChain, Pipeline};
pub use provider::{Node, Provider, SpecTable};
pub use spec::{Array, ArraySpec};
pub use upsample::UpSample;
pub use voxel_common::{Coordinate, GridError, Roi};
