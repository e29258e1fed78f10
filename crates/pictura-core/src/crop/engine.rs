use std::time::Instant;

use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::{debug, info};

use crate::config::CropConfig;
use crate::error::Result;

use super::aspect::AspectConstraint;
use super::debounce::Debouncer;
use super::geometry::{DisplayGeometry, PixelRect};
use super::render::{encode_jpeg, render_window, CroppedImage};
use super::selection::SelectionRect;

struct LoadedImage {
    source: DynamicImage,
    geometry: DisplayGeometry,
}

/// One crop session: the loaded image, its selection and the derived outputs.
///
/// Geometry is fixed when the image is loaded. Preview refreshes are driven by
/// a single-flight [`Debouncer`]; the owner calls
/// [`poll_preview`](Self::poll_preview) from its event loop.
pub struct CropEngine {
    config: CropConfig,
    image: Option<LoadedImage>,
    selection: Option<SelectionRect>,
    aspect: AspectConstraint,
    interacting: bool,
    refresh: Debouncer,
    preview: Option<RgbaImage>,
    cropped: Option<CroppedImage>,
    preview_renders: u64,
}

impl CropEngine {
    pub fn new(config: CropConfig) -> Self {
        let refresh = Debouncer::new(config.preview_debounce());
        Self {
            config,
            image: None,
            selection: None,
            aspect: AspectConstraint::Free,
            interacting: false,
            refresh,
            preview: None,
            cropped: None,
            preview_renders: 0,
        }
    }

    /// Load a decoded image shown at `displayed_width` x `displayed_height`.
    ///
    /// Replaces any previous image and its outputs, then places the centred
    /// default selection under the current aspect constraint.
    pub fn load_image(
        &mut self,
        source: DynamicImage,
        displayed_width: f64,
        displayed_height: f64,
        now: Instant,
    ) -> Result<()> {
        let (w, h) = source.dimensions();
        let geometry = DisplayGeometry::new(w, h, displayed_width, displayed_height)?;
        self.install(source, geometry, now);
        Ok(())
    }

    /// Load a decoded image shown scaled down to fit `max_width` x `max_height`.
    pub fn load_fitted(
        &mut self,
        source: DynamicImage,
        max_width: f64,
        max_height: f64,
        now: Instant,
    ) -> Result<()> {
        let (w, h) = source.dimensions();
        let geometry = DisplayGeometry::fit_within(w, h, max_width, max_height)?;
        self.install(source, geometry, now);
        Ok(())
    }

    fn install(&mut self, source: DynamicImage, geometry: DisplayGeometry, now: Instant) {
        info!(
            natural = ?geometry.natural_size(),
            displayed = ?geometry.displayed_size(),
            "Image loaded for cropping"
        );
        self.image = Some(LoadedImage { source, geometry });
        self.preview = None;
        self.cropped = None;
        self.interacting = false;
        self.recenter(now);
    }

    /// Change the aspect constraint and replace the selection with a centred default.
    ///
    /// Without a loaded image only the stored constraint changes.
    pub fn set_aspect_constraint(&mut self, aspect: AspectConstraint, now: Instant) {
        self.aspect = aspect;
        if self.image.is_some() {
            self.recenter(now);
        }
    }

    fn recenter(&mut self, now: Instant) {
        let Some(image) = &self.image else {
            return;
        };
        let selection = image
            .geometry
            .centered_selection(self.aspect, self.config.default_fraction);
        debug!(aspect = %self.aspect, ?selection, "Selection recentred");
        self.selection = Some(selection);
        self.refresh.schedule(now);
    }

    /// Store an in-progress selection from a drag or resize.
    ///
    /// The rect is clamped and kept in percent units. Marks the engine as
    /// interacting, which suspends preview refreshes, and drops any refresh
    /// that was already scheduled.
    pub fn update_selection(&mut self, rect: SelectionRect, _now: Instant) {
        let Some(image) = &self.image else {
            return;
        };
        self.selection = Some(rect.clamped(&image.geometry).to_percent(&image.geometry));
        self.interacting = true;
        self.refresh.cancel();
    }

    /// Store the final selection at pointer release.
    ///
    /// Stored in percent units like [`update_selection`](Self::update_selection).
    /// Renders the preview right away and schedules one settle refresh.
    pub fn complete_selection(&mut self, rect: SelectionRect, now: Instant) {
        let Some(image) = &self.image else {
            return;
        };
        self.selection = Some(rect.clamped(&image.geometry).to_percent(&image.geometry));
        self.interacting = false;
        self.render_preview();
        self.refresh.schedule(now);
    }

    /// Run the scheduled refresh if it is due. Returns whether a render happened.
    pub fn poll_preview(&mut self, now: Instant) -> bool {
        if self.interacting || !self.refresh.fire(now) {
            return false;
        }
        self.render_preview().is_some()
    }

    pub fn next_preview_deadline(&self) -> Option<Instant> {
        if self.interacting {
            None
        } else {
            self.refresh.deadline()
        }
    }

    /// Source window of the current selection, in whole source pixels.
    fn window(&self) -> Option<(&LoadedImage, &SelectionRect, PixelRect)> {
        let image = self.image.as_ref()?;
        let selection = self.selection.as_ref()?;
        if !selection.has_area() {
            return None;
        }
        let geometry = &image.geometry;
        let window = geometry
            .source_window(selection)
            .to_pixel_rect(geometry.natural_size())?;
        Some((image, selection, window))
    }

    /// Redraw the preview at the crop's displayed size.
    ///
    /// Returns `None` without an image, with an empty selection, or when the
    /// selection rounds to less than one displayed pixel.
    pub fn render_preview(&mut self) -> Option<&RgbaImage> {
        let (image, selection, window) = self.window()?;
        let displayed = selection.to_pixels(&image.geometry);
        let width = displayed.width.round() as u32;
        let height = displayed.height.round() as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let surface = render_window(&image.source, window, width, height);
        self.preview_renders += 1;
        debug!(?window, width, height, "Preview rendered");
        self.preview = Some(surface);
        self.preview.as_ref()
    }

    /// Produce the full-resolution crop.
    ///
    /// Depends only on the source window, so a selection too small to show
    /// on screen still crops. Returns `Ok(None)` when there is nothing to crop.
    pub fn confirm_crop(&mut self) -> Result<Option<&CroppedImage>> {
        let Some((image, _, window)) = self.window() else {
            return Ok(None);
        };
        let surface = render_window(&image.source, window, window.width, window.height);
        let bytes = encode_jpeg(&surface, self.config.jpeg_quality)?;
        info!(
            x = window.x,
            y = window.y,
            width = window.width,
            height = window.height,
            bytes = bytes.len(),
            "Crop confirmed"
        );
        self.cropped = Some(CroppedImage {
            bytes,
            width: window.width,
            height: window.height,
        });
        Ok(self.cropped.as_ref())
    }

    /// Return to the initial, empty state.
    pub fn reset(&mut self) {
        self.image = None;
        self.selection = None;
        self.aspect = AspectConstraint::Free;
        self.interacting = false;
        self.refresh.cancel();
        self.preview = None;
        self.cropped = None;
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn geometry(&self) -> Option<&DisplayGeometry> {
        self.image.as_ref().map(|i| &i.geometry)
    }

    pub fn selection(&self) -> Option<&SelectionRect> {
        self.selection.as_ref()
    }

    pub fn aspect(&self) -> AspectConstraint {
        self.aspect
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    pub fn cropped(&self) -> Option<&CroppedImage> {
        self.cropped.as_ref()
    }

    /// Number of preview renders since the engine was created.
    pub fn preview_renders(&self) -> u64 {
        self.preview_renders
    }
}

impl Default for CropEngine {
    fn default() -> Self {
        Self::new(CropConfig::default())
    }
}
