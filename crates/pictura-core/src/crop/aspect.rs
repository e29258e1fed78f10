use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PicturaError, Result};

/// Aspect ratio constraint on the crop selection.
///
/// Deserialization goes through [`AspectConstraint::ratio`], so a stored
/// ratio is validated the same way as a parsed one.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "AspectRepr")]
pub enum AspectConstraint {
    #[default]
    Free,
    /// Width divided by height. Prefer [`AspectConstraint::ratio`]; a value
    /// that is not finite and positive acts as [`AspectConstraint::Free`].
    Ratio(f64),
}

#[derive(Deserialize)]
enum AspectRepr {
    Free,
    Ratio(f64),
}

impl TryFrom<AspectRepr> for AspectConstraint {
    type Error = PicturaError;

    fn try_from(repr: AspectRepr) -> Result<Self> {
        match repr {
            AspectRepr::Free => Ok(Self::Free),
            AspectRepr::Ratio(value) => Self::ratio(value),
        }
    }
}

impl AspectConstraint {
    /// Toolbar presets, in display order.
    pub const PRESETS: &[(&'static str, Self)] = &[
        ("Free", Self::Free),
        ("1:1", Self::Ratio(1.0)),
        ("2:3", Self::Ratio(2.0 / 3.0)),
        ("3:2", Self::Ratio(3.0 / 2.0)),
        ("4:3", Self::Ratio(4.0 / 3.0)),
        ("3:4", Self::Ratio(3.0 / 4.0)),
        ("9:16", Self::Ratio(9.0 / 16.0)),
        ("16:9", Self::Ratio(16.0 / 9.0)),
    ];

    /// Build a ratio constraint, rejecting zero, negative and non-finite values.
    pub fn ratio(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self::Ratio(value))
        } else {
            Err(PicturaError::InvalidAspect(value.to_string()))
        }
    }

    /// Return the width/height ratio, or `None` for free or an unusable ratio.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Free => None,
            Self::Ratio(r) => (r.is_finite() && *r > 0.0).then_some(*r),
        }
    }
}

impl fmt::Display for AspectConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "Free"),
            Self::Ratio(r) => {
                let preset = Self::PRESETS.iter().find(|(_, p)| match p {
                    Self::Ratio(v) => (v - r).abs() < 1e-9,
                    Self::Free => false,
                });
                match preset {
                    Some((label, _)) => write!(f, "{label}"),
                    None => write!(f, "{r:.3}"),
                }
            }
        }
    }
}

/// Accepts `free`, `W:H` (e.g. `16:9`) or a decimal ratio (e.g. `1.5`).
impl FromStr for AspectConstraint {
    type Err = PicturaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("free") {
            return Ok(Self::Free);
        }

        let invalid = || PicturaError::InvalidAspect(s.to_string());
        let value = match s.split_once(':') {
            Some((w, h)) => {
                let w: f64 = w.trim().parse().map_err(|_| invalid())?;
                let h: f64 = h.trim().parse().map_err(|_| invalid())?;
                w / h
            }
            None => s.parse().map_err(|_| invalid())?,
        };
        Self::ratio(value).map_err(|_| invalid())
    }
}
