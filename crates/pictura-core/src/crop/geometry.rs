use crate::consts::DEFAULT_SELECTION_FRACTION;
use crate::error::{PicturaError, Result};

use super::aspect::AspectConstraint;
use super::selection::SelectionRect;

/// Natural and on-screen size of the loaded image.
///
/// Built once per loaded image. The scale factors derived from it are the
/// only ones used for every percent -> source pixel conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    natural_width: u32,
    natural_height: u32,
    displayed_width: f64,
    displayed_height: f64,
}

impl DisplayGeometry {
    pub fn new(
        natural_width: u32,
        natural_height: u32,
        displayed_width: f64,
        displayed_height: f64,
    ) -> Result<Self> {
        let displayed_ok = displayed_width.is_finite()
            && displayed_height.is_finite()
            && displayed_width > 0.0
            && displayed_height > 0.0;
        if natural_width == 0 || natural_height == 0 || !displayed_ok {
            return Err(PicturaError::InvalidDimensions {
                width: natural_width,
                height: natural_height,
            });
        }
        Ok(Self {
            natural_width,
            natural_height,
            displayed_width,
            displayed_height,
        })
    }

    /// Geometry of an image shown inside a `max_width` x `max_height` box,
    /// scaled down to fit and never scaled up.
    pub fn fit_within(
        natural_width: u32,
        natural_height: u32,
        max_width: f64,
        max_height: f64,
    ) -> Result<Self> {
        let nw = natural_width as f64;
        let nh = natural_height as f64;
        let scale = (max_width / nw).min(max_height / nh).min(1.0);
        Self::new(natural_width, natural_height, nw * scale, nh * scale)
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn displayed_size(&self) -> (f64, f64) {
        (self.displayed_width, self.displayed_height)
    }

    pub fn scale_x(&self) -> f64 {
        self.natural_width as f64 / self.displayed_width
    }

    pub fn scale_y(&self) -> f64 {
        self.natural_height as f64 / self.displayed_height
    }

    /// Map a selection to the source-pixel window it covers.
    pub fn source_window(&self, selection: &SelectionRect) -> SourceWindow {
        let px = selection.to_pixels(self);
        SourceWindow {
            x: px.x * self.scale_x(),
            y: px.y * self.scale_y(),
            width: px.width * self.scale_x(),
            height: px.height * self.scale_y(),
        }
    }

    /// Inverse of [`source_window`](Self::source_window), in percent units.
    pub fn selection_from_source(&self, window: &SourceWindow) -> SelectionRect {
        SelectionRect::pixels(
            window.x / self.scale_x(),
            window.y / self.scale_y(),
            window.width / self.scale_x(),
            window.height / self.scale_y(),
        )
        .to_percent(self)
    }

    /// Centred default selection in displayed pixels.
    ///
    /// With a ratio, `fraction` is applied to the limiting dimension and the
    /// other side follows from the ratio; free selections take `fraction`
    /// of both sides. A `fraction` outside `(0, 1]` is capped at 1, or
    /// replaced by the default when it is not positive.
    pub fn centered_selection(&self, aspect: AspectConstraint, fraction: f64) -> SelectionRect {
        let fraction = if fraction.is_finite() && fraction > 0.0 {
            fraction.min(1.0)
        } else {
            DEFAULT_SELECTION_FRACTION
        };
        let (dw, dh) = self.displayed_size();
        let (width, height) = match aspect.value() {
            Some(ratio) if dw / dh > ratio => {
                let h = dh * fraction;
                (h * ratio, h)
            }
            Some(ratio) => {
                let w = dw * fraction;
                (w, w / ratio)
            }
            None => (dw * fraction, dh * fraction),
        };
        SelectionRect::pixels((dw - width) / 2.0, (dh - height) / 2.0, width, height)
    }
}

/// A crop window in fractional source pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceWindow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceWindow {
    /// Round to whole pixels inside `bounds`. `None` if nothing is left.
    pub fn to_pixel_rect(&self, bounds: (u32, u32)) -> Option<PixelRect> {
        let (bw, bh) = bounds;
        let x = (self.x.round().max(0.0) as u32).min(bw);
        let y = (self.y.round().max(0.0) as u32).min(bh);
        let width = (self.width.round().max(0.0) as u32).min(bw - x);
        let height = (self.height.round().max(0.0) as u32).min(bh - y);
        (width > 0 && height > 0).then_some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

/// A rectangle in whole source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
