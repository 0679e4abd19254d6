//! Batch requests and the batches produced to satisfy them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use voxel_common::{Coordinate, Roi};

use crate::key::ArrayKey;
use crate::spec::Array;

/// What a caller wants produced for one array: a physical ROI and,
/// optionally, a pinned voxel size. When the voxel size is omitted it is
/// inferred from the provider's declared spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub roi: Roi,
    pub voxel_size: Option<Coordinate>,
}

impl RequestSpec {
    /// Request a ROI at the provider's declared voxel size.
    pub fn roi(roi: Roi) -> Self {
        Self {
            roi,
            voxel_size: None,
        }
    }

    /// Request a ROI at an explicit voxel size.
    pub fn with_voxel_size(roi: Roi, voxel_size: Coordinate) -> Self {
        Self {
            roi,
            voxel_size: Some(voxel_size),
        }
    }
}

/// A bundle of named request specs describing what a caller wants
/// produced. Keys are unique; insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequest {
    entries: HashMap<ArrayKey, RequestSpec>,
}

impl BatchRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ROI request for one array. Replaces any earlier entry for
    /// the same key.
    pub fn add(mut self, key: ArrayKey, roi: Roi) -> Self {
        self.entries.insert(key, RequestSpec::roi(roi));
        self
    }

    /// Add a ROI request with an explicitly pinned voxel size.
    pub fn add_with_voxel_size(mut self, key: ArrayKey, roi: Roi, voxel_size: Coordinate) -> Self {
        self.entries
            .insert(key, RequestSpec::with_voxel_size(roi, voxel_size));
        self
    }

    /// Insert an entry without consuming the request.
    pub fn insert(&mut self, key: ArrayKey, spec: RequestSpec) {
        self.entries.insert(key, spec);
    }

    /// The request entry for one key, if present.
    pub fn get(&self, key: &ArrayKey) -> Option<&RequestSpec> {
        self.entries.get(key)
    }

    /// True if the request names the key.
    pub fn contains(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove and return the entry for one key.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<RequestSpec> {
        self.entries.remove(key)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &RequestSpec)> {
        self.entries.iter()
    }

    /// Number of requested arrays.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A bundle of named arrays produced to satisfy a [`BatchRequest`].
///
/// A batch is created fresh per `provide` call; the producing node owns it
/// until it hands it downstream, after which the requester owns it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    arrays: HashMap<ArrayKey, Array>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an array under a key, replacing any earlier one.
    pub fn insert(&mut self, key: ArrayKey, array: Array) {
        self.arrays.insert(key, array);
    }

    /// The array for one key, if present.
    pub fn get(&self, key: &ArrayKey) -> Option<&Array> {
        self.arrays.get(key)
    }

    /// Remove and return the array for one key.
    pub fn take(&mut self, key: &ArrayKey) -> Option<Array> {
        self.arrays.remove(key)
    }

    /// True if the batch holds the key.
    pub fn contains(&self, key: &ArrayKey) -> bool {
        self.arrays.contains_key(key)
    }

    /// Move every array from `other` into this batch.
    pub fn merge(&mut self, other: Batch) {
        self.arrays.extend(other.arrays);
    }

    /// Iterate over all arrays.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Array)> {
        self.arrays.iter()
    }

    /// Number of arrays in the batch.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// True if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}
