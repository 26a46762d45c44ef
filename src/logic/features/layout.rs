//! Feature Layout - extractor configuration descriptor
//!
//! ## Rules
//! 1. Vector length depends only on the layout, never on file content
//! 2. Change how bytes are encoded -> increment FEATURE_VERSION
//!
//! The layout travels with every persisted model so prediction can check that
//! it samples files the same way training did.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::FeatureKind;

/// Current byte-encoding version
pub const FEATURE_VERSION: u8 = 1;

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub version: u8,
    pub kind: FeatureKind,
    /// Head bytes (0 for `rand`)
    pub head_size: usize,
    /// Random bytes (0 for `head`)
    pub rand_size: usize,
}

impl FeatureLayout {
    pub fn new(kind: FeatureKind, head_size: usize, rand_size: usize) -> Self {
        let (head_size, rand_size) = match kind {
            FeatureKind::Head => (head_size, 0),
            FeatureKind::Rand => (0, rand_size),
            FeatureKind::RandHead => (head_size, rand_size),
        };
        Self { version: FEATURE_VERSION, kind, head_size, rand_size }
    }

    /// Total number of features
    pub fn nfeatures(&self) -> usize {
        self.head_size + self.rand_size
    }

    /// CRC32 of version, kind and sizes
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[self.version]);
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(&(self.head_size as u64).to_le_bytes());
        hasher.update(&(self.rand_size as u64).to_le_bytes());
        hasher.finalize()
    }

    /// Check that an extractor with layout `actual` can feed a model trained
    /// on `self`. Different lengths are fatal; same length with a different
    /// layout is allowed but logged.
    pub fn check_compatible(&self, actual: &FeatureLayout) -> SamplerResult<()> {
        if self.nfeatures() != actual.nfeatures() {
            return Err(SamplerError::FeatureMismatch {
                expected: self.nfeatures(),
                actual: actual.nfeatures(),
            });
        }
        if self.layout_hash() != actual.layout_hash() {
            log::warn!(
                "Feature layout differs from training ({} {:08x} vs {} {:08x}); predictions may be meaningless",
                self, self.layout_hash(), actual, actual.layout_hash()
            );
        }
        Ok(())
    }
}

impl std::fmt::Display for FeatureLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FeatureKind::Head => write!(f, "head[{}]", self.head_size),
            FeatureKind::Rand => write!(f, "rand[{}]", self.rand_size),
            FeatureKind::RandHead => write!(f, "randhead[{}+{}]", self.head_size, self.rand_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfeatures_per_kind() {
        assert_eq!(FeatureLayout::new(FeatureKind::Head, 512, 256).nfeatures(), 512);
        assert_eq!(FeatureLayout::new(FeatureKind::Rand, 512, 256).nfeatures(), 256);
        assert_eq!(FeatureLayout::new(FeatureKind::RandHead, 512, 256).nfeatures(), 768);
    }

    #[test]
    fn test_hash_is_stable_and_distinct() {
        let a = FeatureLayout::new(FeatureKind::Head, 512, 0);
        let b = FeatureLayout::new(FeatureKind::Head, 512, 999);
        let c = FeatureLayout::new(FeatureKind::Rand, 0, 512);

        // rand_size is irrelevant for head layouts
        assert_eq!(a.layout_hash(), b.layout_hash());
        assert_ne!(a.layout_hash(), c.layout_hash());
    }

    #[test]
    fn test_compatibility() {
        let trained = FeatureLayout::new(FeatureKind::Head, 512, 0);

        assert!(trained.check_compatible(&trained).is_ok());
        // Same length, different sampling: allowed with a warning
        assert!(trained.check_compatible(&FeatureLayout::new(FeatureKind::Rand, 0, 512)).is_ok());

        let err = trained
            .check_compatible(&FeatureLayout::new(FeatureKind::Head, 256, 0))
            .unwrap_err();
        assert!(matches!(err, SamplerError::FeatureMismatch { expected: 512, actual: 256 }));
    }
}
