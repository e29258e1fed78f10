use serde::{Deserialize, Serialize};

use super::geometry::DisplayGeometry;

/// Unit of a [`SelectionRect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionUnit {
    /// Percent of the displayed image, in `[0, 100]`.
    #[default]
    Percent,
    /// Pixels of the displayed (scaled) image.
    Pixel,
}

/// Crop selection relative to the displayed image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: SelectionUnit,
}

impl SelectionRect {
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: SelectionUnit::Percent,
        }
    }

    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: SelectionUnit::Pixel,
        }
    }

    /// Whole displayed image.
    pub fn full() -> Self {
        Self::percent(0.0, 0.0, 100.0, 100.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Width over height, `None` for a degenerate rect.
    pub fn aspect(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    /// Express this rect in percent of the displayed image.
    pub fn to_percent(&self, geometry: &DisplayGeometry) -> Self {
        match self.unit {
            SelectionUnit::Percent => *self,
            SelectionUnit::Pixel => {
                let (dw, dh) = geometry.displayed_size();
                Self::percent(
                    self.x / dw * 100.0,
                    self.y / dh * 100.0,
                    self.width / dw * 100.0,
                    self.height / dh * 100.0,
                )
            }
        }
    }

    /// Express this rect in displayed pixels.
    pub fn to_pixels(&self, geometry: &DisplayGeometry) -> Self {
        match self.unit {
            SelectionUnit::Pixel => *self,
            SelectionUnit::Percent => {
                let (dw, dh) = geometry.displayed_size();
                Self::pixels(
                    self.x / 100.0 * dw,
                    self.y / 100.0 * dh,
                    self.width / 100.0 * dw,
                    self.height / 100.0 * dh,
                )
            }
        }
    }

    /// Clamp to the displayed bounds, keeping the unit.
    ///
    /// The origin is pulled inside the image first, then the extent is cut so
    /// that `x + width` and `y + height` never exceed the bound.
    pub fn clamped(&self, geometry: &DisplayGeometry) -> Self {
        let (max_x, max_y) = match self.unit {
            SelectionUnit::Percent => (100.0, 100.0),
            SelectionUnit::Pixel => geometry.displayed_size(),
        };
        let x = self.x.clamp(0.0, max_x);
        let y = self.y.clamp(0.0, max_y);
        let width = self.width.max(0.0).min(max_x - x);
        let height = self.height.max(0.0).min(max_y - y);
        Self {
            x,
            y,
            width,
            height,
            unit: self.unit,
        }
    }
}

impl Default for SelectionRect {
    fn default() -> Self {
        Self::full()
    }
}
