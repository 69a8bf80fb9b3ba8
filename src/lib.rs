//! Bitmap colouring engine: tap-to-fill inside line art without bleeding
//! across outlines, freehand brush and eraser, undo/redo, and lossless
//! PNG / data-URL persistence, all over one raw RGBA buffer.

pub mod assets;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;

pub use assets::EngineSettings;
pub use canvas::{Bitmap, PixelMask, Point};
pub use io::{DecodeError, EncodeError, ProjectError};
pub use ops::brush::BrushMode;
pub use ops::fill::FillOptions;
pub use project::ColoringSession;
