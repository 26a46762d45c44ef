//! Random Bytes - N bytes at distinct random offsets
//!
//! Offsets are drawn without replacement and kept in draw order, so the
//! vector is order-randomized. Files shorter than N contribute every byte
//! (shuffled) and are zero-padded.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::logic::config::FeatureKind;
use super::layout::FeatureLayout;
use super::vector::{FeatureExtractor, FeatureVector};

/// Files up to this size are read whole instead of seeking per byte
const READ_WHOLE_LIMIT: u64 = 1024 * 1024;

#[derive(Debug)]
pub struct RandBytes {
    number_bytes: usize,
    rng: Mutex<StdRng>,
}

impl RandBytes {
    /// `seed = None` draws from entropy
    pub fn new(number_bytes: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { number_bytes, rng: Mutex::new(rng) }
    }

    pub fn number_bytes(&self) -> usize {
        self.number_bytes
    }

    /// Sample `amount` distinct offsets in random order
    fn offsets(&self, file_len: usize) -> Vec<usize> {
        let amount = self.number_bytes.min(file_len);
        let mut rng = self.rng.lock();
        index::sample(&mut *rng, file_len, amount).into_vec()
    }
}

impl FeatureExtractor for RandBytes {
    fn layout(&self) -> FeatureLayout {
        FeatureLayout::new(FeatureKind::Rand, 0, self.number_bytes)
    }

    fn extract(&self, path: &Path) -> std::io::Result<FeatureVector> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let offsets = self.offsets(file_len as usize);

        let sampled: Vec<u8> = if file_len <= READ_WHOLE_LIMIT {
            let mut content = Vec::with_capacity(file_len as usize);
            file.read_to_end(&mut content)?;
            // File may have shrunk since metadata was read
            offsets.iter().filter_map(|&o| content.get(o).copied()).collect()
        } else {
            // Visit offsets in file order, then restore draw order
            let mut order: Vec<(usize, usize)> = offsets.iter().copied().enumerate().collect();
            order.sort_by_key(|&(_, offset)| offset);
            let mut bytes = vec![0u8; offsets.len()];
            let mut byte = [0u8; 1];
            for (slot, offset) in order {
                file.seek(SeekFrom::Start(offset as u64))?;
                file.read_exact(&mut byte)?;
                bytes[slot] = byte[0];
            }
            bytes
        };

        Ok(FeatureVector::from_bytes(&sampled, self.number_bytes))
    }
}
