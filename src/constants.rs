//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a default sample size or output file name, only edit this file.

/// Default number of head bytes sampled per file
pub const DEFAULT_HEAD_BYTES: usize = 512;

/// Default number of random bytes sampled per file
pub const DEFAULT_RAND_BYTES: usize = 512;

/// Default train/test split ratio (fraction used for training)
pub const DEFAULT_SPLIT: f64 = 0.8;

/// Default number of trials
pub const DEFAULT_TRIALS: usize = 1;

/// Default per-probe timeout (seconds). 0 disables the timeout.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

/// Default weak-label table location
pub const DEFAULT_LABEL_CSV: &str = "automated_training_results/naivetruth.csv";

/// Default trained model used in prediction mode
pub const DEFAULT_TRAINED_MODEL: &str = "rf-head-default.json";

/// Default prediction results file
pub const DEFAULT_RESULTS_FILE: &str = "sampler_results.json";

/// Default class table file written at trainer construction
pub const DEFAULT_CLASS_TABLE: &str = "CLASS_TABLE.json";

/// Raster image extensions short-circuited to the "image" label
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "png", "gif", "bmp", "jpeg", "tif", "tiff", "jif",
    "jfif", "jp2", "jpx", "j2k", "j2c", "fpx", "pcd",
];

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "File Sampler";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get head byte count from environment or use default
pub fn get_head_bytes() -> usize {
    env_parse("SAMPLER_HEAD_BYTES").unwrap_or(DEFAULT_HEAD_BYTES)
}

/// Get random byte count from environment or use default
pub fn get_rand_bytes() -> usize {
    env_parse("SAMPLER_RAND_BYTES").unwrap_or(DEFAULT_RAND_BYTES)
}

/// Get split ratio from environment or use default
pub fn get_split() -> f64 {
    env_parse("SAMPLER_SPLIT").unwrap_or(DEFAULT_SPLIT)
}

/// Get trial count from environment or use default
pub fn get_trials() -> usize {
    env_parse("SAMPLER_TRIALS").unwrap_or(DEFAULT_TRIALS)
}

/// Get probe timeout from environment or use default
pub fn get_probe_timeout_secs() -> u64 {
    env_parse("SAMPLER_PROBE_TIMEOUT").unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS)
}

/// Get RNG seed from environment (None = use entropy)
pub fn get_seed() -> Option<u64> {
    env_parse("SAMPLER_SEED")
}

/// Get label table path from environment or use default
pub fn get_label_csv() -> String {
    std::env::var("SAMPLER_LABEL_CSV")
        .unwrap_or_else(|_| DEFAULT_LABEL_CSV.to_string())
}

/// Get class table path from environment or use default
pub fn get_class_table_path() -> String {
    std::env::var("SAMPLER_CLASS_TABLE")
        .unwrap_or_else(|_| DEFAULT_CLASS_TABLE.to_string())
}

/// Check if parallel labeling is enabled
pub fn is_parallel_labeling() -> bool {
    std::env::var("SAMPLER_PARALLEL")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
