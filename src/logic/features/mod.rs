//! Features Module - Byte-Sampling Feature Extraction
//!
//! Turns a file into a fixed-length numeric vector without parsing it.
//!
//! - `head`: first N bytes
//! - `random`: N bytes at random offsets
//! - `randhead`: both, concatenated
//! - `class_table`: label <-> class id mapping shared with the dataset
//! - `layout`: extractor descriptor persisted with models

pub mod class_table;
pub mod head;
pub mod layout;
pub mod random;
pub mod randhead;
pub mod vector;


// Re-export common types
pub use class_table::ClassTable;
pub use head::HeadBytes;
pub use layout::FeatureLayout;
pub use random::RandBytes;
pub use randhead::RandHead;
pub use vector::{FeatureExtractor, FeatureVector, LabeledExample};

use crate::logic::config::FeatureKind;

/// Build the extractor a layout describes
pub fn build_extractor(layout: &FeatureLayout, seed: Option<u64>) -> Box<dyn FeatureExtractor> {
    match layout.kind {
        FeatureKind::Head => Box::new(HeadBytes::new(layout.head_size)),
        FeatureKind::Rand => Box::new(RandBytes::new(layout.rand_size, seed)),
        FeatureKind::RandHead => Box::new(RandHead::new(layout.head_size, layout.rand_size, seed)),
    }
}
