/// Fraction of the limiting displayed dimension used for a fresh selection.
pub const DEFAULT_SELECTION_FRACTION: f64 = 0.8;

/// Delay before a scheduled preview refresh fires, in milliseconds.
pub const PREVIEW_DEBOUNCE_MS: u64 = 100;

/// JPEG quality (0-100) of the confirmed crop.
pub const CROP_JPEG_QUALITY: u8 = 95;

/// JPEG quality (0-100) used by the smart re-encoding compressor.
pub const SMART_COMPRESS_QUALITY: u8 = 75;

/// Tolerance used when comparing selection coordinates in percent units.
pub const PERCENT_EPSILON: f64 = 1e-9;

/// Length of the random suffix in stored upload names.
pub const UPLOAD_SUFFIX_LEN: usize = 6;

/// File name of the local library index.
pub const LIBRARY_INDEX_FILE: &str = "index.json";

/// Sub-directory of the local library holding uploaded files.
pub const LIBRARY_UPLOAD_DIR: &str = "uploads";

/// File under the library root holding the persisted caller token.
pub const CALLER_ID_FILE: &str = "caller-id";

/// Default box the CLI fits an image into before cropping, in pixels.
pub const DEFAULT_DISPLAY_BOX: u32 = 800;
