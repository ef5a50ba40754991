use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};
use uuid::Uuid;

use crate::error::{DetectError, Result};
use crate::models::{DetectedRegion, ExportFailure, ExportReport, RegionCandidate};

/// Extension of every cropped region written to storage
pub const OUTPUT_EXTENSION: &str = "png";

/// Build a crop filename: `<source stem>_stamp_<token>.png`
pub fn stamp_filename(source: &Path, token: Uuid) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    format!("{}_stamp_{}.{}", stem, token.simple(), OUTPUT_EXTENSION)
}

/// Crop every candidate from the original image and write it into `output_dir`.
///
/// The directory is created if missing. A crop that cannot be written is logged
/// and recorded in the report's failures; the rest of the batch continues.
pub fn export_regions(
    original: &DynamicImage,
    source_path: &Path,
    candidates: &[RegionCandidate],
    output_dir: &Path,
) -> Result<ExportReport> {
    std::fs::create_dir_all(output_dir).map_err(|source| DetectError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let (img_width, img_height) = original.dimensions();
    let mut report = ExportReport::default();

    for candidate in candidates {
        let bbox = candidate.bbox;
        if !bbox.fits_within(img_width, img_height) {
            tracing::warn!(?bbox, img_width, img_height, "candidate lies outside the source image");
            report.failures.push(ExportFailure {
                bbox,
                target: None,
                reason: format!("bounding box outside {}x{} image", img_width, img_height),
            });
            continue;
        }

        let target: PathBuf = output_dir.join(stamp_filename(source_path, Uuid::new_v4()));
        let cropped = original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);

        match cropped.save_with_format(&target, ImageFormat::Png) {
            Ok(()) => {
                tracing::debug!(path = %target.display(), ?bbox, "saved region");
                report.regions.push(DetectedRegion {
                    storage_path: target,
                    bbox,
                });
            }
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "could not save detected region");
                report.failures.push(ExportFailure {
                    bbox,
                    target: Some(target),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Write detected regions as the JSON result list (`path`, `bbox`)
pub fn save_regions(path: &Path, regions: &[DetectedRegion]) -> Result<()> {
    let json = serde_json::to_string_pretty(regions).map_err(|source| DetectError::RegionsFormat {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| DetectError::RegionsFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Read back a result list written by [`save_regions`] or `detect --json`
pub fn load_regions(path: &Path) -> Result<Vec<DetectedRegion>> {
    let raw = std::fs::read_to_string(path).map_err(|source| DetectError::RegionsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let regions: Vec<DetectedRegion> =
        serde_json::from_str(&raw).map_err(|source| DetectError::RegionsFormat {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), count = regions.len(), "loaded regions");
    Ok(regions)
}
