use imageproc::geometry::arc_length;
use imageproc::point::Point;
use thiserror::Error;

use crate::models::{BoundingBox, RegionCandidate};

/// Polygon simplification tolerance as a fraction of the contour perimeter
pub const APPROX_EPSILON_FACTOR: f64 = 0.02;

/// Size and shape band a contour must fall into to count as a stamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBounds {
    /// Exclusive lower bound on contour area
    pub min_area: f64,
    /// Exclusive upper bound on contour area
    pub max_area: f64,
    /// Inclusive lower bound on bounding box `w / h`
    pub min_ratio: f64,
    /// Inclusive upper bound on bounding box `w / h`
    pub max_ratio: f64,
}

impl FilterBounds {
    pub const STAMP: FilterBounds = FilterBounds {
        min_area: 1000.0,
        max_area: 50000.0,
        min_ratio: 0.5,
        max_ratio: 2.0,
    };
}

impl Default for FilterBounds {
    fn default() -> Self {
        Self::STAMP
    }
}

/// Why a contour was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Rejection {
    #[error("area {0:.1} outside the accepted band")]
    Area(f64),
    #[error("simplified polygon has {0} vertices")]
    NotQuadrilateral(usize),
    #[error("degenerate bounding box")]
    Degenerate,
    #[error("aspect ratio {0:.3} outside the accepted band")]
    AspectRatio(f64),
}

/// Run a single contour through the area, shape and aspect checks.
///
/// Checks short-circuit in order. An accepted contour is returned verbatim as a
/// candidate carrying the bounding box of its simplified polygon.
pub fn classify(contour: &[Point<i32>], bounds: &FilterBounds) -> Result<RegionCandidate, Rejection> {
    let area = polygon_area(contour);
    if area <= bounds.min_area || area >= bounds.max_area {
        return Err(Rejection::Area(area));
    }

    let perimeter = arc_length(contour, true);
    let simplified = simplify_closed(contour, APPROX_EPSILON_FACTOR * perimeter);
    if simplified.len() != 4 {
        return Err(Rejection::NotQuadrilateral(simplified.len()));
    }

    let bbox = bounding_rect(&simplified).ok_or(Rejection::Degenerate)?;
    let ratio = bbox.aspect_ratio().ok_or(Rejection::Degenerate)?;
    if ratio < bounds.min_ratio || ratio > bounds.max_ratio {
        return Err(Rejection::AspectRatio(ratio));
    }

    Ok(RegionCandidate {
        bbox,
        area,
        vertices: simplified,
    })
}

/// Keep the contours that pass [`classify`], preserving their order
pub fn filter_candidates(contours: &[Vec<Point<i32>>], bounds: &FilterBounds) -> Vec<RegionCandidate> {
    contours
        .iter()
        .enumerate()
        .filter_map(|(i, contour)| match classify(contour, bounds) {
            Ok(candidate) => {
                tracing::debug!(contour = i, bbox = ?candidate.bbox, area = candidate.area, "accepted");
                Some(candidate)
            }
            Err(reason) => {
                tracing::debug!(contour = i, %reason, "rejected");
                None
            }
        })
        .collect()
}

/// Enclosed area of a closed polygon (shoelace formula)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Smallest axis-aligned rectangle covering every point, in whole pixels
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    Some(BoundingBox {
        x: u32::try_from(min_x).ok()?,
        y: u32::try_from(min_y).ok()?,
        width: u32::try_from(max_x - min_x + 1).ok()?,
        height: u32::try_from(max_y - min_y + 1).ok()?,
    })
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The ring is split at two extreme points (the point farthest from the first
/// point, then the point farthest from that one) and each half is simplified as
/// an open chain. The first vertex is not repeated at the end.
pub fn simplify_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        return vec![points[a]];
    }
    let (start, end) = if a < b { (a, b) } else { (b, a) };

    let forward = &points[start..=end];
    let wrapped: Vec<Point<i32>> = points[end..]
        .iter()
        .chain(points[..=start].iter())
        .copied()
        .collect();

    let mut result = simplify_open(forward, epsilon);
    let back = simplify_open(&wrapped, epsilon);
    // `back` starts at points[end] and finishes at points[start]; both are already present
    result.extend_from_slice(&back[1..back.len() - 1]);
    result
}

fn simplify_open(chain: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let last = chain.len() - 1;
    if last < 2 {
        return chain.to_vec();
    }

    let (first, end) = (chain[0], chain[last]);
    let (index, dmax) = chain[1..last]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, segment_distance(*p, first, end)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if dmax > epsilon {
        let mut left = simplify_open(&chain[..=index], epsilon);
        let right = simplify_open(&chain[index..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, end]
    }
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    points
        .iter()
        .enumerate()
        .fold((0, -1i64), |best, (i, p)| {
            let dx = (p.x - origin.x) as i64;
            let dy = (p.y - origin.y) as i64;
            let d = dx * dx + dy * dy;
            if d > best.1 { (i, d) } else { best }
        })
        .0
}

/// Perpendicular distance from `p` to the line through `a` and `b`
fn segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return ((p.x - a.x) as f64).hypot((p.y - a.y) as f64);
    }
    (dy * (p.x - a.x) as f64 - dx * (p.y - a.y) as f64).abs() / len
}
