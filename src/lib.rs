pub mod core;
pub mod detection;
pub mod display;
pub mod error;
pub mod models;

pub use detection::{StampDetector, annotate, load_image};
pub use display::{DisplayMapping, HitMap, LayoutPhase, Viewport};
pub use error::DetectError;
pub use models::{BoundingBox, DetectedRegion, ExportFailure, ExportReport, RegionCandidate};
