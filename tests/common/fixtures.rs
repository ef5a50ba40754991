use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use stampscan::core::catalog::{CatalogDb, NewStampRecord};
use stampscan::{BoundingBox, DetectedRegion};
use tempfile::TempDir;

/// Fill an inclusive pixel rectangle
pub fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// 400x300 black sheet with a white stamp at x 50..=150, y 50..=200
/// and a light grey one at x 200..=350, y 80..=180.
pub fn stamp_sheet() -> RgbImage {
    let mut img = ImageBuffer::from_pixel(400, 300, Rgb([0u8, 0, 0]));
    fill_rect(&mut img, 50, 50, 150, 200, Rgb([255, 255, 255]));
    fill_rect(&mut img, 200, 80, 350, 180, Rgb([200, 200, 200]));
    img
}

/// Save `img` as `name` inside `dir` and return the path
pub fn save_fixture(img: &RgbImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save fixture image");
    path
}

/// Creates a catalog database inside a fresh temp directory.
/// Returns both the catalog and the temp directory (which must be kept alive).
pub async fn create_test_catalog() -> (CatalogDb, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("database").join("stamps.db");
    let catalog = CatalogDb::open(&path)
        .await
        .expect("Failed to create test catalog");
    (catalog, dir)
}

pub fn make_test_record(storage_path: &str) -> NewStampRecord {
    NewStampRecord {
        original_image_ref: Some("data/uploaded_images/sheet.png".to_string()),
        storage_path: storage_path.to_string(),
        search_keywords: Some("Canada 1950s Queen Elizabeth".to_string()),
        country: Some("Canada".to_string()),
        title_suggestion: Some("Queen Elizabeth II 5c Blue".to_string()),
        estimated_price_range: Some("$0.50 - $1.50".to_string()),
        history_notes: Some("Common definitive stamp.".to_string()),
        source_urls: vec![
            "http://example.com/stamp_info/canada_qe2_5c".to_string(),
            "http://anotherstampsite.com/qe2_blue".to_string(),
        ],
    }
}

pub fn region(path: &str, x: u32, y: u32, w: u32, h: u32) -> DetectedRegion {
    DetectedRegion {
        storage_path: PathBuf::from(path),
        bbox: BoundingBox::new(x, y, w, h),
    }
}

/// True when every edge of `actual` is within `slack` pixels of `expected`
pub fn approx_box(actual: &BoundingBox, expected: &BoundingBox, slack: i64) -> bool {
    let close = |a: u32, b: u32| (a as i64 - b as i64).abs() <= slack;
    close(actual.x, expected.x)
        && close(actual.y, expected.y)
        && close(actual.right(), expected.right())
        && close(actual.bottom(), expected.bottom())
}
