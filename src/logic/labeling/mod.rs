//! Labeling Module - Weak-Label Generation
//!
//! Crawled files are run through an ordered cascade of format probes. The
//! first probe that applies names the file's weak label; nothing applying
//! means "unknown".
//!
//! ## Structure
//! - `label`: The closed label set (`FileLabel`)
//! - `probe`: Probe capability trait and its success/mismatch types
//! - `probes`: Built-in netcdf, json/xml, tabular and keyword probes
//! - `oracle`: The cascade itself (`WeakLabelOracle`)
//! - `table`: Label table persistence (`path,size,file_label,infer_time`)

pub mod label;
pub mod probe;
pub mod probes;
pub mod oracle;
pub mod table;


pub use label::FileLabel;
pub use oracle::WeakLabelOracle;
pub use table::{read_label_table, write_label_table, WeakLabel};
