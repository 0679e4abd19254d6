//! Nearest-neighbor upsampling of a coarse upstream array onto a finer grid.
//!
//! `UpSample` wraps an upstream *source* array at one voxel resolution and
//! exposes a virtual *target* array at voxel size `source / factor`.
//! Requests for the target are rewritten down to the source resolution
//! (physical extent preserved), served upstream, and the returned coarse
//! data is replicated `factor` times along each axis before being cropped
//! to exactly the requested ROI.

use voxel_common::{Coordinate, Roi};

use crate::batch::{Batch, BatchRequest, RequestSpec};
use crate::error::{PipelineError, Result};
use crate::key::ArrayKey;
use crate::provider::{Node, Provider, SpecTable};
use crate::spec::{Array, ArraySpec};

/// A [`Node`] presenting a coarse source array as a finer-resolution
/// target array.
pub struct UpSample {
    source: ArrayKey,
    factor: Coordinate,
    target: ArrayKey,
    source_spec: Option<ArraySpec>,
    target_spec: Option<ArraySpec>,
}

impl UpSample {
    /// Create an upsampling node.
    ///
    /// `factor` is a per-axis integer, all components at least 1; use
    /// `Coordinate::splat(n)` for the isotropic case. A factor of 1 is an
    /// identity passthrough. `source` and `target` must differ. Both
    /// constraints are verified during setup.
    pub fn new(source: ArrayKey, factor: Coordinate, target: ArrayKey) -> Self {
        Self {
            source,
            factor,
            target,
            source_spec: None,
            target_spec: None,
        }
    }

    /// The declared spec of the target array; available after setup.
    fn specs_or_not_set_up(&self) -> Result<(ArraySpec, ArraySpec)> {
        match (self.source_spec, self.target_spec) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(PipelineError::NotSetUp),
        }
    }

    /// Validate a target request and map it onto the source grid.
    ///
    /// The requested ROI must land on the target voxel grid; a ROI whose
    /// edges fall between source voxels is allowed and handled by growing
    /// the upstream ROI outward to the next source-grid boundary, then
    /// cropping the replicated data back. Misalignment to the *target*
    /// grid is a caller error and is never silently rounded.
    fn rewrite_target_roi(
        &self,
        requested: &RequestSpec,
        source_spec: &ArraySpec,
        target_spec: &ArraySpec,
    ) -> Result<Roi> {
        let roi = requested.roi;
        if let Some(voxel_size) = requested.voxel_size {
            if voxel_size != target_spec.voxel_size {
                return Err(PipelineError::VoxelSizeMismatch {
                    key: self.target.clone(),
                    requested: voxel_size,
                    declared: target_spec.voxel_size,
                });
            }
        }
        if !target_spec.roi.contains(&roi) {
            return Err(PipelineError::OutOfBounds {
                key: self.target.clone(),
                requested: roi,
                provided: target_spec.roi,
            });
        }
        if !roi.begin_aligned_to(target_spec.voxel_size)
            || !roi.shape().is_multiple_of(target_spec.voxel_size)
        {
            return Err(PipelineError::Misaligned {
                key: self.target.clone(),
                roi,
                step: target_spec.voxel_size,
            });
        }
        Ok(roi.snap_outward(source_spec.voxel_size)?)
    }
}

impl Node for UpSample {
    /// Declares the target: same physical ROI as the source, voxel size
    /// divided by the factor.
    fn setup(&mut self, upstream: &SpecTable) -> Result<SpecTable> {
        if !self.factor.all_positive() {
            return Err(PipelineError::InvalidFactor {
                factor: self.factor,
            });
        }
        if self.source == self.target {
            return Err(PipelineError::SelfReference {
                key: self.source.clone(),
            });
        }
        let source_spec = *upstream
            .get(&self.source)
            .ok_or_else(|| PipelineError::UnknownKey {
                key: self.source.clone(),
            })?;
        let voxel_size = source_spec.voxel_size.checked_div(self.factor)?;
        let target_spec = ArraySpec::new(source_spec.roi, voxel_size);

        self.source_spec = Some(source_spec);
        self.target_spec = Some(target_spec);

        let mut added = SpecTable::new();
        added.declare(self.target.clone(), target_spec)?;
        tracing::debug!(
            source = %self.source,
            target = %self.target,
            factor = %self.factor,
            voxel_size = %voxel_size,
            "declared upsampled array"
        );
        Ok(added)
    }

    fn provide(&mut self, request: &BatchRequest, upstream: &mut dyn Provider) -> Result<Batch> {
        let Some(target_request) = request.get(&self.target).copied() else {
            // Target not requested: this node is invisible.
            return upstream.provide(request);
        };
        let (source_spec, target_spec) = self.specs_or_not_set_up()?;
        let source_roi = self.rewrite_target_roi(&target_request, &source_spec, &target_spec)?;

        // An independent request for the source must hold on its own terms
        // before it is widened to the hull: the widening must not mask a
        // bad voxel-size pin or a misaligned ROI the bare request would
        // reject.
        if let Some(own) = request.get(&self.source) {
            upstream.specs().validate_request(&self.source, own)?;
        }

        // Rewrite: replace the target entry by a source-resolution entry,
        // keep everything else untouched. An independent request for the
        // source itself is widened to the hull and cropped back below.
        let mut rewritten = BatchRequest::new();
        for (key, spec) in request.iter() {
            if *key != self.target {
                rewritten.insert(key.clone(), *spec);
            }
        }
        let independent_source_roi = request.get(&self.source).map(|spec| spec.roi);
        let upstream_roi = match independent_source_roi {
            Some(own) => own.union_hull(&source_roi),
            None => source_roi,
        };
        rewritten.insert(self.source.clone(), RequestSpec::roi(upstream_roi));
        tracing::debug!(
            target = %self.target,
            roi = %target_request.roi,
            source_roi = %source_roi,
            "rewrote upsample request"
        );

        let mut batch = upstream.provide(&rewritten)?;

        let coarse = batch
            .take(&self.source)
            .ok_or_else(|| PipelineError::UnknownKey {
                key: self.source.clone(),
            })?;
        let fine = replicate(&coarse.crop(source_roi)?, self.factor)?;
        let target_array = fine.crop(target_request.roi)?;

        if let Some(own_roi) = independent_source_roi {
            batch.insert(self.source.clone(), coarse.crop(own_roi)?);
        }
        batch.insert(self.target.clone(), target_array);
        Ok(batch)
    }
}

/// Repeat every voxel of `coarse` `factor` times along each axis. The
/// physical ROI is unchanged; the voxel size shrinks by the factor.
fn replicate(coarse: &Array, factor: Coordinate) -> Result<Array> {
    let src_shape = coarse.grid_shape()?;
    let out_shape = src_shape * factor;
    let out_spec = ArraySpec::new(
        coarse.spec().roi,
        coarse.spec().voxel_size.checked_div(factor)?,
    );

    let src = coarse.data();
    let (sy, sx) = (src_shape[1], src_shape[2]);
    let mut data = Vec::with_capacity(out_shape.0.iter().map(|&v| v as usize).product());
    for z in 0..out_shape[0] {
        for y in 0..out_shape[1] {
            let plane = (z / factor[0]) * sy + y / factor[1];
            for x in 0..out_shape[2] {
                data.push(src[(plane * sx + x / factor[2]) as usize]);
            }
        }
    }
    Array::new(data, out_spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{position_grid, PositionSource};
    use crate::{chain, Pipeline};

    fn roi(begin: [i64; 3], shape: [i64; 3]) -> Roi {
        Roi::new(Coordinate(begin), Coordinate(shape)).unwrap()
    }

    fn pipeline(factor: i64) -> (Pipeline, ArrayKey, ArrayKey) {
        let raw = ArrayKey::new("raw");
        let raw_up = ArrayKey::new("raw_upsampled");
        let source = PositionSource::new(
            vec![raw.clone()],
            roi([0, 0, 0], [1000, 1000, 1000]),
            Coordinate::splat(4),
        );
        let mut pipeline = Pipeline::new(source).then(UpSample::new(
            raw.clone(),
            Coordinate::splat(factor),
            raw_up.clone(),
        ));
        pipeline.setup().unwrap();
        (pipeline, raw, raw_up)
    }

    #[test]
    fn test_setup_declares_target() {
        let (pipeline, _, raw_up) = pipeline(2);
        let spec = pipeline.specs().get(&raw_up).unwrap();
        assert_eq!(spec.roi, roi([0, 0, 0], [1000, 1000, 1000]));
        assert_eq!(spec.voxel_size, Coordinate::splat(2));
    }

    #[test]
    fn test_setup_rejects_invalid_factor() {
        let raw = ArrayKey::new("raw");
        let mut node = UpSample::new(raw.clone(), Coordinate::new(2, 0, 2), ArrayKey::new("up"));
        let err = node.setup(&SpecTable::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFactor { .. }));
    }

    #[test]
    fn test_setup_rejects_self_reference() {
        let raw = ArrayKey::new("raw");
        let mut node = UpSample::new(raw.clone(), Coordinate::splat(2), raw);
        let err = node.setup(&SpecTable::new()).unwrap_err();
        assert!(matches!(err, PipelineError::SelfReference { .. }));
    }

    #[test]
    fn test_setup_rejects_unknown_source() {
        let mut node = UpSample::new(
            ArrayKey::new("missing"),
            Coordinate::splat(2),
            ArrayKey::new("up"),
        );
        let err = node.setup(&SpecTable::new()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownKey { .. }));
    }

    #[test]
    fn test_setup_rejects_non_divisible_voxel_size() {
        let raw = ArrayKey::new("raw");
        let mut upstream = SpecTable::new();
        upstream
            .declare(
                raw.clone(),
                ArraySpec::new(roi([0, 0, 0], [1000, 1000, 1000]), Coordinate::splat(4)),
            )
            .unwrap();
        let mut node = UpSample::new(raw, Coordinate::splat(3), ArrayKey::new("up"));
        assert!(matches!(
            node.setup(&upstream),
            Err(PipelineError::Grid(_))
        ));
    }

    #[test]
    fn test_identity_under_factor_one() {
        let (mut pipeline, raw, raw_up) = pipeline(1);
        let request_roi = roi([40, 40, 40], [120, 120, 120]);
        let request = BatchRequest::new()
            .add(raw.clone(), request_roi)
            .add(raw_up.clone(), request_roi);

        let batch = pipeline.provide(&request).unwrap();
        let source = batch.get(&raw).unwrap();
        let target = batch.get(&raw_up).unwrap();

        assert_eq!(target.data(), source.data());
        assert_eq!(target.spec().voxel_size, source.spec().voxel_size);
    }

    #[test]
    fn test_replication_pointwise() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        let request =
            BatchRequest::new().add(raw_up.clone(), roi([40, 40, 40], [120, 120, 120]));
        let batch = pipeline.provide(&request).unwrap();
        let target = batch.get(&raw_up).unwrap();

        // Source voxel (10, 10, 10) encodes 30; each source voxel is
        // repeated twice per axis.
        assert_eq!(target.get(Coordinate::new(0, 0, 0)), Some(30.0));
        assert_eq!(target.get(Coordinate::new(1, 0, 0)), Some(30.0));
        assert_eq!(target.get(Coordinate::new(2, 0, 0)), Some(31.0));
        assert_eq!(target.get(Coordinate::new(3, 0, 0)), Some(31.0));
        assert_eq!(target.get(Coordinate::new(0, 0, 1)), Some(30.0));
        assert_eq!(target.get(Coordinate::new(0, 0, 2)), Some(31.0));

        // Shape law.
        assert_eq!(target.grid_shape().unwrap(), Coordinate::splat(60));
        assert_eq!(target.data().len(), 60 * 60 * 60);
    }

    #[test]
    fn test_anisotropic_factor() {
        let raw = ArrayKey::new("raw");
        let raw_up = ArrayKey::new("raw_upsampled");
        let source = PositionSource::new(
            vec![raw.clone()],
            roi([0, 0, 0], [1000, 1000, 1000]),
            Coordinate::splat(4),
        );
        let mut pipeline = Pipeline::new(source).then(UpSample::new(
            raw,
            Coordinate::new(4, 2, 1),
            raw_up.clone(),
        ));
        pipeline.setup().unwrap();

        let spec = *pipeline.specs().get(&raw_up).unwrap();
        assert_eq!(spec.voxel_size, Coordinate::new(1, 2, 4));

        let request = BatchRequest::new().add(raw_up.clone(), roi([0, 0, 0], [8, 8, 8]));
        let batch = pipeline.provide(&request).unwrap();
        let target = batch.get(&raw_up).unwrap();

        assert_eq!(target.grid_shape().unwrap(), Coordinate::new(8, 4, 2));
        // z advances a source voxel every 4 target voxels, y every 2,
        // x every 1.
        assert_eq!(target.get(Coordinate::new(3, 0, 0)), Some(0.0));
        assert_eq!(target.get(Coordinate::new(4, 0, 0)), Some(1.0));
        assert_eq!(target.get(Coordinate::new(0, 1, 0)), Some(0.0));
        assert_eq!(target.get(Coordinate::new(0, 2, 0)), Some(1.0));
        assert_eq!(target.get(Coordinate::new(0, 0, 1)), Some(1.0));
    }

    #[test]
    fn test_trailing_crop_tolerated() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        // Begin 42 lands between source voxels (40, 44) but on the target
        // grid; the shape is a whole number of target voxels.
        let request =
            BatchRequest::new().add(raw_up.clone(), roi([42, 40, 40], [116, 120, 120]));
        let batch = pipeline.provide(&request).unwrap();
        let target = batch.get(&raw_up).unwrap();

        assert_eq!(target.spec().roi, roi([42, 40, 40], [116, 120, 120]));
        assert_eq!(target.get(Coordinate::new(0, 0, 0)), Some(30.0));
        assert_eq!(target.get(Coordinate::new(1, 0, 0)), Some(31.0));
        assert_eq!(target.get(Coordinate::new(2, 0, 0)), Some(31.0));
        assert_eq!(target.get(Coordinate::new(3, 0, 0)), Some(32.0));
    }

    #[test]
    fn test_misaligned_begin_rejected() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        let request =
            BatchRequest::new().add(raw_up.clone(), roi([41, 40, 40], [118, 120, 120]));
        let err = pipeline.provide(&request).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Misaligned { ref key, .. } if *key == raw_up
        ));
    }

    #[test]
    fn test_misaligned_shape_rejected() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        let request =
            BatchRequest::new().add(raw_up.clone(), roi([40, 40, 40], [117, 120, 120]));
        assert!(matches!(
            pipeline.provide(&request),
            Err(PipelineError::Misaligned { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        let request =
            BatchRequest::new().add(raw_up.clone(), roi([960, 0, 0], [80, 8, 8]));
        assert!(matches!(
            pipeline.provide(&request),
            Err(PipelineError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_voxel_size_mismatch_rejected() {
        let (mut pipeline, _, raw_up) = pipeline(2);
        let request = BatchRequest::new().add_with_voxel_size(
            raw_up.clone(),
            roi([40, 40, 40], [120, 120, 120]),
            Coordinate::splat(4),
        );
        assert!(matches!(
            pipeline.provide(&request),
            Err(PipelineError::VoxelSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_source_and_target_in_one_request() {
        let (mut pipeline, raw, raw_up) = pipeline(2);
        // Physically disjoint ROIs for source and target.
        let request = BatchRequest::new()
            .add(raw.clone(), roi([400, 400, 400], [80, 80, 80]))
            .add(raw_up.clone(), roi([40, 40, 40], [40, 40, 40]));

        let batch = pipeline.provide(&request).unwrap();

        let source = batch.get(&raw).unwrap();
        assert_eq!(source.spec().roi, roi([400, 400, 400], [80, 80, 80]));
        let expected = position_grid(roi([100, 100, 100], [20, 20, 20]));
        assert_eq!(source.data(), &expected[..]);

        let target = batch.get(&raw_up).unwrap();
        assert_eq!(target.spec().roi, roi([40, 40, 40], [40, 40, 40]));
        assert_eq!(target.get(Coordinate::new(0, 0, 0)), Some(30.0));
    }

    #[test]
    fn test_independent_source_voxel_size_still_checked() {
        let (mut pipeline, raw, raw_up) = pipeline(2);
        // A bad voxel-size pin on the source fails the same way whether or
        // not the target rides along in the request.
        let request = BatchRequest::new()
            .add_with_voxel_size(
                raw.clone(),
                roi([40, 40, 40], [120, 120, 120]),
                Coordinate::splat(8),
            )
            .add(raw_up.clone(), roi([40, 40, 40], [120, 120, 120]));
        let err = pipeline.provide(&request).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::VoxelSizeMismatch { ref key, .. } if *key == raw
        ));
    }

    #[test]
    fn test_independent_source_alignment_still_checked() {
        let (mut pipeline, raw, raw_up) = pipeline(2);
        // The source ROI is off the source grid; a covering target entry
        // must not launder it through the widened upstream request.
        let request = BatchRequest::new()
            .add(raw.clone(), roi([42, 40, 40], [116, 120, 120]))
            .add(raw_up.clone(), roi([40, 40, 40], [120, 120, 120]));
        let err = pipeline.provide(&request).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Misaligned { ref key, .. } if *key == raw
        ));
    }

    #[test]
    fn test_replicate_helper() {
        let spec = ArraySpec::new(roi([0, 0, 0], [4, 4, 4]), Coordinate::splat(2));
        let coarse = Array::new((0..8).map(|v| v as f32).collect(), spec).unwrap();
        let fine = replicate(&coarse, Coordinate::splat(2)).unwrap();

        assert_eq!(fine.spec().roi, coarse.spec().roi);
        assert_eq!(fine.spec().voxel_size, Coordinate::splat(1));
        assert_eq!(fine.grid_shape().unwrap(), Coordinate::splat(4));
        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    let expected = coarse.get(Coordinate::new(z / 2, y / 2, x / 2)).unwrap();
                    assert_eq!(fine.get(Coordinate::new(z, y, x)), Some(expected));
                }
            }
        }
    }

    #[test]
    fn test_two_upsample_nodes_chained() {
        let raw = ArrayKey::new("raw");
        let labels = ArrayKey::new("labels");
        let raw_up = ArrayKey::new("raw_upsampled");
        let labels_up = ArrayKey::new("labels_upsampled");

        let source = PositionSource::new(
            vec![raw.clone(), labels.clone()],
            roi([0, 0, 0], [1000, 1000, 1000]),
            Coordinate::splat(4),
        );
        let mut pipeline = Pipeline::new(source).then(chain(
            UpSample::new(raw.clone(), Coordinate::splat(2), raw_up.clone()),
            UpSample::new(labels.clone(), Coordinate::splat(2), labels_up.clone()),
        ));
        pipeline.setup().unwrap();

        let request = BatchRequest::new()
            .add(raw_up.clone(), roi([40, 40, 40], [120, 120, 120]))
            .add(labels_up.clone(), roi([0, 0, 0], [200, 200, 200]));
        let batch = pipeline.provide(&request).unwrap();

        assert_eq!(
            batch.get(&raw_up).unwrap().get(Coordinate::zero()),
            Some(30.0)
        );
        let labels_array = batch.get(&labels_up).unwrap();
        assert_eq!(labels_array.get(Coordinate::new(0, 0, 0)), Some(0.0));
        assert_eq!(labels_array.get(Coordinate::new(1, 0, 0)), Some(0.0));
        assert_eq!(labels_array.get(Coordinate::new(2, 0, 0)), Some(1.0));
        assert_eq!(labels_array.get(Coordinate::new(3, 0, 0)), Some(1.0));
    }
}
