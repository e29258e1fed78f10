use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CROP_JPEG_QUALITY, DEFAULT_SELECTION_FRACTION, PREVIEW_DEBOUNCE_MS, SMART_COMPRESS_QUALITY,
};
use crate::error::{PicturaError, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PicturaConfig {
    #[serde(default)]
    pub crop: CropConfig,
    #[serde(default)]
    pub compress: CompressConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

impl PicturaConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| PicturaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        let fraction = self.crop.default_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(PicturaError::Config(format!(
                "crop.default_fraction must be in (0, 1], got {fraction}"
            )));
        }
        check_quality("crop.jpeg_quality", self.crop.jpeg_quality)?;
        check_quality("compress.quality", self.compress.quality)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PicturaError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

fn check_quality(key: &str, quality: u8) -> Result<()> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(PicturaError::Config(format!(
            "{key} must be in 1-100, got {quality}"
        )))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// JPEG quality (1-100) of the confirmed crop.
    pub jpeg_quality: u8,
    /// Delay before the settled preview refresh, in milliseconds.
    pub preview_debounce_ms: u64,
    /// Fraction of the limiting displayed side used for a new selection.
    pub default_fraction: f64,
}

impl CropConfig {
    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: CROP_JPEG_QUALITY,
            preview_debounce_ms: PREVIEW_DEBOUNCE_MS,
            default_fraction: DEFAULT_SELECTION_FRACTION,
        }
    }
}

/// How the local re-encoding compressor treats its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressMode {
    /// Lossy re-encode at the configured quality.
    #[default]
    Smart,
    /// Lossless re-encode in the source format.
    Original,
}

impl fmt::Display for CompressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smart => write!(f, "Smart"),
            Self::Original => write!(f, "Original"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub mode: CompressMode,
    /// JPEG quality (1-100) for smart mode.
    pub quality: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            mode: CompressMode::default(),
            quality: SMART_COMPRESS_QUALITY,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding uploaded files and the index.
    pub root: PathBuf,
    /// Prefix for record URLs. Empty means `file://` URLs under `root`.
    pub public_base_url: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("pictura-library"),
            public_base_url: String::new(),
        }
    }
}
