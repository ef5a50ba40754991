pub mod contours;
pub mod export;
pub mod filter;
pub mod preprocessing;

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::{DetectError, Result};
use crate::models::{BoundingBox, DetectedRegion, ExportReport, RegionCandidate};
use filter::FilterBounds;

/// Default location for cropped regions
pub const DEFAULT_OUTPUT_DIR: &str = "data/detected_stamps";

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Load a source image, failing if it cannot be decoded
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| DetectError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Main detection pipeline orchestrator
#[derive(Debug, Clone)]
pub struct StampDetector {
    pub bounds: FilterBounds,
    pub output_dir: PathBuf,
    debug_dir: Option<PathBuf>,
}

impl StampDetector {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            bounds: FilterBounds::STAMP,
            output_dir: output_dir.into(),
            debug_dir: None,
        }
    }

    /// Save intermediate images into `dir`.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.exists() {
            if std::fs::read_dir(&dir)?.next().is_some() {
                return Err(DetectError::DebugDirNotEmpty(dir));
            }
        } else {
            std::fs::create_dir_all(&dir)?;
        }
        self.debug_dir = Some(dir);
        Ok(self)
    }

    /// Load the image at `path`, detect regions and write their crops
    pub fn detect(&self, path: &Path) -> Result<ExportReport> {
        tracing::info!(path = %path.display(), "loading image");
        let img = load_image(path)?;
        self.detect_image(&img, path)
    }

    /// Detect regions in an already loaded image and export them.
    ///
    /// `source_path` only contributes the base name of the written files.
    pub fn detect_image(&self, img: &DynamicImage, source_path: &Path) -> Result<ExportReport> {
        let candidates = self.find_candidates(img)?;
        let report = export::export_regions(img, source_path, &candidates, &self.output_dir)?;

        tracing::info!(
            exported = report.regions.len(),
            failed = report.failures.len(),
            output_dir = %self.output_dir.display(),
            "export finished"
        );
        Ok(report)
    }

    /// Run edge detection, contour extraction and filtering without writing anything
    pub fn find_candidates(&self, img: &DynamicImage) -> Result<Vec<RegionCandidate>> {
        let stages = preprocessing::edge_stages(img)?;
        tracing::info!(width = img.width(), height = img.height(), "detecting regions");

        let all_contours = contours::find_outer_contours(&stages.edges);
        tracing::info!(count = all_contours.len(), "found outer contours");

        let candidates = filter::filter_candidates(&all_contours, &self.bounds);
        tracing::info!(
            accepted = candidates.len(),
            total = all_contours.len(),
            "filtered candidates"
        );

        if self.debug_dir.is_some() {
            let boxes: Vec<BoundingBox> = candidates.iter().map(|c| c.bbox).collect();
            self.save_debug("00_input", img)?;
            self.save_debug("01_grayscale", &DynamicImage::ImageLuma8(stages.gray))?;
            self.save_debug("02_gaussian_blur", &DynamicImage::ImageLuma8(stages.blurred))?;
            self.save_debug("03_edge_detection", &DynamicImage::ImageLuma8(stages.edges))?;
            self.save_debug("04_candidates", &draw_boxes(img, &boxes))?;
        }

        Ok(candidates)
    }

    fn save_debug(&self, name: &str, img: &DynamicImage) -> Result<()> {
        let Some(dir) = &self.debug_dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.png", name));
        img.save(&path)
            .map_err(|source| DetectError::DebugImage { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "saved debug image");
        Ok(())
    }
}

/// Outline each detected region on a copy of the original image
pub fn annotate(img: &DynamicImage, regions: &[DetectedRegion]) -> DynamicImage {
    let boxes: Vec<BoundingBox> = regions.iter().map(|r| r.bbox).collect();
    draw_boxes(img, &boxes)
}

fn draw_boxes(img: &DynamicImage, boxes: &[BoundingBox]) -> DynamicImage {
    let mut canvas = img.to_rgb8();
    for bbox in boxes {
        for inset in 0..BOX_THICKNESS {
            let (w, h) = (
                bbox.width.saturating_sub(2 * inset),
                bbox.height.saturating_sub(2 * inset),
            );
            if w == 0 || h == 0 {
                break;
            }
            let (x, y) = (bbox.x.saturating_add(inset), bbox.y.saturating_add(inset));
            let rect = Rect::at(x as i32, y as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }
    DynamicImage::ImageRgb8(canvas)
}
