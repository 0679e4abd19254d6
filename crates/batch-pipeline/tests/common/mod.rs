#![allow(dead_code)]

use batch_pipeline::testdata::PositionSource;
use batch_pipeline::{ArrayKey, Coordinate, Pipeline, Provider, Roi, UpSample};

/// Install a fmt subscriber once so failing tests show the pipeline's
/// debug output. Honors RUST_LOG.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn roi(begin: [i64; 3], shape: [i64; 3]) -> Roi {
    Roi::new(Coordinate(begin), Coordinate(shape)).unwrap()
}

/// The shared fixture: position-encoded source data over [0, 1000)^3 at
/// voxel size 4.
pub const SOURCE_VOXEL_SIZE: i64 = 4;

pub fn position_source(keys: &[&ArrayKey]) -> PositionSource {
    PositionSource::new(
        keys.iter().map(|k| (*k).clone()).collect(),
        roi([0, 0, 0], [1000, 1000, 1000]),
        Coordinate::splat(SOURCE_VOXEL_SIZE),
    )
}

/// Source plus one upsampling stage for `source_key` -> `target_key`.
pub fn upsample_pipeline(
    source_key: &ArrayKey,
    factor: Coordinate,
    target_key: &ArrayKey,
) -> Pipeline {
    let mut pipeline = Pipeline::new(position_source(&[source_key])).then(UpSample::new(
        source_key.clone(),
        factor,
        target_key.clone(),
    ));
    pipeline.setup().unwrap();
    pipeline
}
