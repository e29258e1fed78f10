pub mod aspect;
pub mod debounce;
pub mod engine;
pub mod geometry;
pub mod render;
pub mod selection;

pub use aspect::AspectConstraint;
pub use engine::CropEngine;
pub use geometry::{DisplayGeometry, PixelRect, SourceWindow};
pub use render::CroppedImage;
pub use selection::{SelectionRect, SelectionUnit};
