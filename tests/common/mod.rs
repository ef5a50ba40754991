mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from stampscan for tests
pub use stampscan::core::catalog::{
    CatalogDb, CatalogError, CatalogRepository, NewStampRecord, StampRecord,
};
pub use stampscan::{
    BoundingBox, DetectError, DetectedRegion, DisplayMapping, HitMap, LayoutPhase, StampDetector,
    Viewport,
};
