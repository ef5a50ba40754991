use std::path::PathBuf;

use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in source image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge, clamped to `u32::MAX`
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, clamped to `u32::MAX`
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// `width / height`, or `None` for a zero-height box
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    /// True when the box is non-empty and lies fully inside a `width x height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// A quadrilateral contour that passed the size and shape checks
#[derive(Debug, Clone)]
pub struct RegionCandidate {
    pub bbox: BoundingBox,
    /// Area enclosed by the raw contour
    pub area: f64,
    /// Vertices of the simplified polygon (always four)
    pub vertices: Vec<Point<i32>>,
}

/// A cropped region that was written to storage.
///
/// `storage_path` is the join key into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    #[serde(rename = "path")]
    pub storage_path: PathBuf,
    pub bbox: BoundingBox,
}

impl DetectedRegion {
    /// Storage path as the string key used by the catalog
    pub fn path_key(&self) -> String {
        self.storage_path.to_string_lossy().into_owned()
    }
}

/// A candidate that could not be written
#[derive(Debug, Clone)]
pub struct ExportFailure {
    pub bbox: BoundingBox,
    pub target: Option<PathBuf>,
    pub reason: String,
}

/// Result of exporting a batch of candidates
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub regions: Vec<DetectedRegion>,
    pub failures: Vec<ExportFailure>,
}
