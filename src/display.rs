//! Mapping between full-resolution image coordinates and a scaled-down view.
//!
//! The same [`DisplayMapping`] must be used to render the scaled image and to
//! build the [`HitMap`], otherwise clicks land on different boxes than the ones
//! drawn on screen.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::{DetectError, Result};
use crate::models::{BoundingBox, DetectedRegion};

/// Size used when the viewport has not been laid out yet
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 600,
    height: 400,
};

/// Available drawing area, in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Whether the viewport size comes from a finished layout pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    /// Before first layout; a 0/1 pixel size is replaced by [`DEFAULT_VIEWPORT`]
    Initial,
    /// After layout; a zero-area viewport is an error
    Settled,
}

/// Uniform fit of an image into a viewport, with the centering offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    pub viewport: Viewport,
    pub image_width: u32,
    pub image_height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl DisplayMapping {
    /// Fit to the viewport width first; if the height overflows, fit to the height instead.
    pub fn fit(image: (u32, u32), viewport: Viewport, phase: LayoutPhase) -> Result<Self> {
        let (image_width, image_height) = image;
        if image_width == 0 || image_height == 0 {
            return Err(DetectError::EmptyImage {
                width: image_width,
                height: image_height,
            });
        }

        let viewport = match phase {
            LayoutPhase::Initial if viewport.width <= 1 || viewport.height <= 1 => DEFAULT_VIEWPORT,
            LayoutPhase::Settled if viewport.width == 0 || viewport.height == 0 => {
                return Err(DetectError::EmptyViewport {
                    width: viewport.width,
                    height: viewport.height,
                });
            }
            _ => viewport,
        };

        // floor(width / aspect) and floor(height * aspect), kept in integers
        let (iw, ih) = (image_width as u64, image_height as u64);
        let mut display_width = viewport.width;
        let mut display_height = (display_width as u64 * ih / iw) as u32;
        if display_height > viewport.height {
            display_height = viewport.height;
            display_width = (display_height as u64 * iw / ih) as u32;
        }
        let display_width = display_width.max(1);
        let display_height = display_height.max(1);

        Ok(Self {
            viewport,
            image_width,
            image_height,
            display_width,
            display_height,
            scale_x: display_width as f64 / image_width as f64,
            scale_y: display_height as f64 / image_height as f64,
            offset_x: centering_offset(viewport.width, display_width),
            offset_y: centering_offset(viewport.height, display_height),
        })
    }

    /// Resize `img` to exactly this mapping's display size
    pub fn render(&self, img: &DynamicImage) -> DynamicImage {
        img.resize_exact(self.display_width, self.display_height, FilterType::Lanczos3)
    }

    /// Map an original-space box onto the displayed image
    pub fn map_box(&self, bbox: &BoundingBox) -> DisplayBox {
        DisplayBox {
            x1: (bbox.x as f64 * self.scale_x) as i32,
            y1: (bbox.y as f64 * self.scale_y) as i32,
            x2: (bbox.right() as f64 * self.scale_x) as i32,
            y2: (bbox.bottom() as f64 * self.scale_y) as i32,
        }
    }

    /// Translate a viewport click into coordinates relative to the displayed image
    pub fn to_image_space(&self, click: (i32, i32)) -> (i32, i32) {
        (click.0 - self.offset_x, click.1 - self.offset_y)
    }
}

fn centering_offset(available: u32, used: u32) -> i32 {
    ((available as i64 - used as i64) / 2) as i32
}

/// Box on the displayed image, inclusive on every edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl DisplayBox {
    pub fn contains(&self, point: (i32, i32)) -> bool {
        self.x1 <= point.0 && point.0 <= self.x2 && self.y1 <= point.1 && point.1 <= self.y2
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    pub display_box: DisplayBox,
    pub region: &'a DetectedRegion,
}

/// Display-space boxes for one render pass, one per detected region
#[derive(Debug, Clone)]
pub struct HitMap<'a> {
    mapping: DisplayMapping,
    records: Vec<HitRecord<'a>>,
}

impl<'a> HitMap<'a> {
    pub fn build(mapping: DisplayMapping, regions: &'a [DetectedRegion]) -> Self {
        let records = regions
            .iter()
            .map(|region| HitRecord {
                display_box: mapping.map_box(&region.bbox),
                region,
            })
            .collect();
        Self { mapping, records }
    }

    pub fn mapping(&self) -> &DisplayMapping {
        &self.mapping
    }

    pub fn records(&self) -> &[HitRecord<'a>] {
        &self.records
    }

    /// Resolve a viewport click to the region drawn under it.
    ///
    /// When several boxes contain the point, the region with the smallest
    /// original-space area wins; equal areas fall back to detection order.
    pub fn resolve(&self, click: (i32, i32)) -> Option<&'a DetectedRegion> {
        let point = self.mapping.to_image_space(click);
        self.records
            .iter()
            .filter(|r| r.display_box.contains(point))
            .min_by_key(|r| r.region.bbox.area())
            .map(|r| r.region)
    }
}
