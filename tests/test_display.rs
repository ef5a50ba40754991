//! Integration tests for display scaling and click resolution.
//!
//! Tests cover:
//! - Fit-by-width then clamp-by-height scaling
//! - Degenerate viewport handling
//! - Click round trips through the mapping
//! - Overlap tie-break

mod common;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use stampscan::display::{DEFAULT_VIEWPORT, DisplayBox};

use common::*;

fn sheet_regions() -> Vec<DetectedRegion> {
    vec![
        region("a.png", 50, 50, 101, 151),
        region("b.png", 200, 80, 151, 101),
    ]
}

#[test]
fn test_fit_by_width() -> anyhow::Result<()> {
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(800, 800), LayoutPhase::Settled)?;

    assert_eq!((mapping.display_width, mapping.display_height), (800, 600));
    assert_eq!(mapping.scale_x, 2.0);
    assert_eq!(mapping.scale_y, 2.0);
    assert_eq!((mapping.offset_x, mapping.offset_y), (0, 100));
    Ok(())
}

#[test]
fn test_height_constrained_fallback() -> anyhow::Result<()> {
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(600, 150), LayoutPhase::Settled)?;

    assert_eq!((mapping.display_width, mapping.display_height), (200, 150));
    assert_eq!(mapping.scale_x, 0.5);
    assert_eq!(mapping.scale_y, 0.5);
    assert_eq!((mapping.offset_x, mapping.offset_y), (200, 0));
    Ok(())
}

#[test]
fn test_initial_degenerate_viewport_uses_default() -> anyhow::Result<()> {
    for viewport in [Viewport::new(1, 1), Viewport::new(0, 0), Viewport::new(1, 500)] {
        let mapping = DisplayMapping::fit((400, 300), viewport, LayoutPhase::Initial)?;
        assert_eq!(mapping.viewport, DEFAULT_VIEWPORT);
        // 600 wide gives 450 high, which overflows 400
        assert_eq!((mapping.display_width, mapping.display_height), (533, 400));
    }
    Ok(())
}

#[test]
fn test_settled_zero_viewport_is_an_error() {
    let result = DisplayMapping::fit((400, 300), Viewport::new(0, 300), LayoutPhase::Settled);
    assert!(matches!(result, Err(DetectError::EmptyViewport { width: 0, height: 300 })));

    // a one pixel viewport is tiny but valid once layout has settled
    let tiny = DisplayMapping::fit((400, 300), Viewport::new(1, 1), LayoutPhase::Settled).unwrap();
    assert_eq!((tiny.display_width, tiny.display_height), (1, 1));
}

#[test]
fn test_zero_area_image_is_an_error() {
    let result = DisplayMapping::fit((0, 300), Viewport::new(600, 400), LayoutPhase::Settled);
    assert!(matches!(result, Err(DetectError::EmptyImage { .. })));
}

#[test]
fn test_render_matches_mapping() -> anyhow::Result<()> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(400, 300, Rgb([10u8, 20, 30])));
    for viewport in [Viewport::new(640, 480), Viewport::new(300, 700), Viewport::new(1000, 120)] {
        let mapping = DisplayMapping::fit(img.dimensions(), viewport, LayoutPhase::Settled)?;
        let rendered = mapping.render(&img);
        assert_eq!(rendered.dimensions(), (mapping.display_width, mapping.display_height));
        assert!(mapping.display_width <= viewport.width);
        assert!(mapping.display_height <= viewport.height);
    }
    Ok(())
}

#[test]
fn test_map_box_scales_corners() -> anyhow::Result<()> {
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(200, 400), LayoutPhase::Settled)?;
    let mapped = mapping.map_box(&BoundingBox::new(50, 50, 101, 151));

    assert_eq!(mapped, DisplayBox { x1: 25, y1: 25, x2: 75, y2: 100 });
    Ok(())
}

#[test]
fn test_map_box_at_coordinate_limit() -> anyhow::Result<()> {
    let far = BoundingBox::new(u32::MAX - 5, u32::MAX - 5, 100, 100);
    assert_eq!((far.right(), far.bottom()), (u32::MAX, u32::MAX));

    let mapping = DisplayMapping::fit((400, 300), Viewport::new(400, 300), LayoutPhase::Settled)?;
    let mapped = mapping.map_box(&far);
    assert!(mapped.x1 <= mapped.x2 && mapped.y1 <= mapped.y2);

    let regions = vec![region("far.png", u32::MAX - 5, u32::MAX - 5, 100, 100)];
    assert_eq!(HitMap::build(mapping, &regions).resolve((10, 10)), None);
    Ok(())
}

#[test]
fn test_hit_records_match_regions() -> anyhow::Result<()> {
    let regions = sheet_regions();
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(600, 400), LayoutPhase::Settled)?;
    let hits = HitMap::build(mapping, &regions);

    assert_eq!(hits.records().len(), regions.len());
    for (record, region) in hits.records().iter().zip(&regions) {
        assert_eq!(record.region, region);
        assert_eq!(record.display_box, mapping.map_box(&region.bbox));
    }
    Ok(())
}

#[test]
fn test_center_click_round_trip() -> anyhow::Result<()> {
    let regions = sheet_regions();

    for width in (50..=1200).step_by(37) {
        for height in (50..=900).step_by(41) {
            let viewport = Viewport::new(width, height);
            let mapping = DisplayMapping::fit((400, 300), viewport, LayoutPhase::Settled)?;
            let hits = HitMap::build(mapping, &regions);

            for record in hits.records() {
                let (cx, cy) = record.display_box.center();
                let click = (cx + mapping.offset_x, cy + mapping.offset_y);
                let resolved = hits.resolve(click);
                assert_eq!(
                    resolved,
                    Some(record.region),
                    "viewport {}x{} click {:?}",
                    width,
                    height,
                    click
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_click_offset_is_subtracted() -> anyhow::Result<()> {
    let regions = sheet_regions();
    // 400x300 in 800x800 displays at 800x600, centered 100 px down
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(800, 800), LayoutPhase::Settled)?;
    let hits = HitMap::build(mapping, &regions);

    // region a covers display y 100..=402, so viewport y 200..=502
    assert_eq!(hits.resolve((200, 210)).map(|r| r.bbox.x), Some(50));
    assert_eq!(hits.resolve((200, 150)), None);
    Ok(())
}

#[test]
fn test_edges_are_inclusive() -> anyhow::Result<()> {
    let regions = vec![region("a.png", 10, 10, 20, 20)];
    let mapping = DisplayMapping::fit((100, 100), Viewport::new(100, 100), LayoutPhase::Settled)?;
    let hits = HitMap::build(mapping, &regions);

    assert!(hits.resolve((10, 10)).is_some());
    assert!(hits.resolve((30, 30)).is_some());
    assert!(hits.resolve((31, 30)).is_none());
    assert!(hits.resolve((9, 20)).is_none());
    Ok(())
}

#[test]
fn test_click_at_origin_misses() -> anyhow::Result<()> {
    let regions = sheet_regions();
    let mapping = DisplayMapping::fit((400, 300), Viewport::new(600, 400), LayoutPhase::Settled)?;
    let hits = HitMap::build(mapping, &regions);

    assert_eq!(hits.resolve((0, 0)), None);
    assert_eq!(hits.resolve((-50, -50)), None);

    let empty: Vec<DetectedRegion> = Vec::new();
    assert_eq!(HitMap::build(mapping, &empty).resolve((300, 200)), None);
    Ok(())
}

#[test]
fn test_overlap_prefers_smallest_region() -> anyhow::Result<()> {
    let regions = vec![
        region("outer.png", 0, 0, 200, 200),
        region("inner.png", 50, 50, 40, 40),
        region("inner_twin.png", 50, 50, 40, 40),
    ];
    let mapping = DisplayMapping::fit((200, 200), Viewport::new(200, 200), LayoutPhase::Settled)?;
    let hits = HitMap::build(mapping, &regions);

    let hit = hits.resolve((60, 60)).expect("click inside both boxes");
    assert_eq!(hit.storage_path.to_str(), Some("inner.png"));

    let hit = hits.resolve((150, 150)).expect("click inside outer box only");
    assert_eq!(hit.storage_path.to_str(), Some("outer.png"));
    Ok(())
}
