//! Rand Head - head bytes followed by random bytes

use std::path::Path;

use crate::logic::config::FeatureKind;
use super::head::HeadBytes;
use super::layout::FeatureLayout;
use super::random::RandBytes;
use super::vector::{FeatureExtractor, FeatureVector};

#[derive(Debug)]
pub struct RandHead {
    head: HeadBytes,
    rand: RandBytes,
}

impl RandHead {
    pub fn new(head_size: usize, rand_size: usize, seed: Option<u64>) -> Self {
        Self {
            head: HeadBytes::new(head_size),
            rand: RandBytes::new(rand_size, seed),
        }
    }
}

impl FeatureExtractor for RandHead {
    fn layout(&self) -> FeatureLayout {
        FeatureLayout::new(FeatureKind::RandHead, self.head.head_size(), self.rand.number_bytes())
    }

    fn extract(&self, path: &Path) -> std::io::Result<FeatureVector> {
        let head = self.head.extract(path)?;
        let rand = self.rand.extract(path)?;
        Ok(head.concat(rand))
    }
}
