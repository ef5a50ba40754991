use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use crate::error::{DetectError, Result};

/// Blur sigma, roughly a 5x5 Gaussian kernel
pub const BLUR_SIGMA: f32 = 1.1;
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector (hysteresis between the two thresholds)
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Every intermediate image of one edge map pass
#[derive(Debug, Clone)]
pub struct EdgeStages {
    pub gray: GrayImage,
    pub blurred: GrayImage,
    pub edges: GrayImage,
}

/// Run grayscale, blur and Canny with the fixed constants, keeping each stage
pub fn edge_stages(img: &DynamicImage) -> Result<EdgeStages> {
    ensure_non_empty(img)?;
    let gray = to_grayscale(img);
    let blurred = apply_blur(&gray, BLUR_SIGMA);
    let edges = detect_edges(&blurred, CANNY_LOW, CANNY_HIGH);
    Ok(EdgeStages { gray, blurred, edges })
}

/// Binary edge map of the same size as `img`, built with the fixed constants.
pub fn build_edge_map(img: &DynamicImage) -> Result<GrayImage> {
    edge_stages(img).map(|stages| stages.edges)
}

fn ensure_non_empty(img: &DynamicImage) -> Result<()> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyImage { width, height });
    }
    Ok(())
}
