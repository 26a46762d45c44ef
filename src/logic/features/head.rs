//! Head Bytes - the first N bytes of a file

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::logic::config::FeatureKind;
use super::layout::FeatureLayout;
use super::vector::{FeatureExtractor, FeatureVector};

#[derive(Debug, Clone)]
pub struct HeadBytes {
    head_size: usize,
}

impl HeadBytes {
    pub fn new(head_size: usize) -> Self {
        Self { head_size }
    }

    pub fn head_size(&self) -> usize {
        self.head_size
    }
}

impl FeatureExtractor for HeadBytes {
    fn layout(&self) -> FeatureLayout {
        FeatureLayout::new(FeatureKind::Head, self.head_size, 0)
    }

    fn extract(&self, path: &Path) -> std::io::Result<FeatureVector> {
        let file = File::open(path)?;
        let mut head = Vec::with_capacity(self.head_size);
        file.take(self.head_size as u64).read_to_end(&mut head)?;
        Ok(FeatureVector::from_bytes(&head, self.head_size))
    }
}
