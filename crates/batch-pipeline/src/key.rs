//! Array identifiers.
//!
//! Arrays are addressed by symbolic keys rather than fixed fields so that
//! pipelines can be assembled at runtime. Keys are cheap to clone and
//! compare; two keys with the same name are the same key.

use std::fmt;
use std::sync::Arc;

/// Identifies one logical array as it flows through a pipeline.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayKey(Arc<str>);

impl ArrayKey {
    /// Creates a key with the given name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the key's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayKey({})", self.0)
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ArrayKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
