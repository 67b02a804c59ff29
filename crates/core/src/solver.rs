//! Crop constraint solver.
//!
//! Fits an aspect-locked crop rectangle inside the projected media quad with
//! as little displacement as possible. The edge order and the
//! translate-then-shrink tie-break decide where previously authored crops
//! land, so they are part of the output format.
//!
//! On a rotated quad one round of edge corrections can leave the rect across
//! an edge it already fixed, so rounds repeat until none fires. Should that
//! not converge, the centered default is tried, and as a last resort the
//! largest centered crop that fits.

use crate::error::{ensure_aspect_ratio, ensure_dimension, ensure_finite, CropError, Result};
use crate::geometry::{CropRect, Line, Point, Quadrilateral};
use log::{debug, trace};

/// Allowed drift between a rect's `width / height` and the target ratio.
pub const ASPECT_RATIO_TOLERANCE: f64 = 1e-5;

/// Distance in pixels a solved corner may sit outside an edge.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-5;

/// Slack before a corner counts as past an edge. Keeps a solved crop a fixed
/// point despite rounding in the line evaluation.
const EDGE_EPSILON: f64 = 1e-9;

const MAX_PASSES: usize = 16;
const BISECTION_STEPS: usize = 64;

/// Centered rectangle of the given ratio spanning the full media height
/// (wide media) or full media width (tall media).
pub fn default_crop(aspect_ratio: f64, media_width: f64, media_height: f64) -> CropRect {
    if media_width / media_height > aspect_ratio {
        let width = media_height * aspect_ratio;
        CropRect::new((media_width - width) / 2.0, 0.0, width, media_height)
    } else {
        let height = media_width / aspect_ratio;
        CropRect::new(0.0, (media_height - height) / 2.0, media_width, height)
    }
}

/// Returns a crop of `aspect_ratio` that lies inside `quad`.
///
/// A missing candidate, one larger than the media, or one with the wrong
/// ratio is replaced by [`default_crop`]. The candidate is then checked
/// against the left, top, right and bottom edges in that order; left and top
/// violations translate the rect, right and bottom violations translate it
/// unless that would break the opposite edge, in which case only the violated
/// side moves. Any correction ends with the longer side shrunk back to the
/// ratio, anchored at the corrected top-left, and the checks run again until
/// the rect passes all four edges.
///
/// The result always has positive size, the target ratio, passes
/// [`contains`] with [`CONTAINMENT_TOLERANCE`] and is returned unchanged when
/// solved again.
///
/// # Errors
///
/// Invalid numeric input, or [`CropError::NoFit`] when the quad is degenerate
/// and no crop of positive size fits inside it.
pub fn solve_crop(
    candidate: Option<CropRect>,
    aspect_ratio: f64,
    media_width: f64,
    media_height: f64,
    quad: &Quadrilateral,
) -> Result<CropRect> {
    ensure_aspect_ratio(aspect_ratio)?;
    ensure_dimension("media_width", media_width)?;
    ensure_dimension("media_height", media_height)?;
    if let Some(rect) = &candidate {
        ensure_finite("origin_x", rect.origin_x)?;
        ensure_finite("origin_y", rect.origin_y)?;
        ensure_finite("width", rect.width)?;
        ensure_finite("height", rect.height)?;
    }

    let default = default_crop(aspect_ratio, media_width, media_height);
    let start = match candidate {
        Some(rect)
            if rect.width > 0.0
                && rect.height > 0.0
                && rect.width <= media_width
                && rect.height <= media_height
                && (rect.width / rect.height - aspect_ratio).abs() <= ASPECT_RATIO_TOLERANCE =>
        {
            rect
        }
        rejected => {
            if let Some(rect) = rejected {
                debug!("resetting crop {:?} to the centered default", rect);
            }
            default
        }
    };

    let mut fitted = fit_inside(start, aspect_ratio, quad);
    if fitted.is_none() && start != default {
        debug!("crop {:?} does not settle inside the quad, retrying from the default", start);
        fitted = fit_inside(default, aspect_ratio, quad);
    }
    let solved = match fitted {
        Some(rect) => rect,
        None => {
            debug!("falling back to the largest centered crop");
            centered_inscribed_crop(aspect_ratio, media_width, media_height, quad)?
        }
    };

    debug_assert!(solved.width > 0.0 && solved.height > 0.0, "{:?}", solved);
    debug_assert!(contains(quad, &solved, CONTAINMENT_TOLERANCE), "{:?}", solved);
    if solved != start {
        debug!("crop {:?} corrected to {:?}", start, solved);
    }
    Ok(solved)
}

/// Repeats [`correct_edges`] from `start` until no edge fires. `None` when a
/// correction collapses the rect or the rounds do not converge.
fn fit_inside(start: CropRect, aspect_ratio: f64, quad: &Quadrilateral) -> Option<CropRect> {
    let mut crop = start;
    for _ in 0..MAX_PASSES {
        match correct_edges(&crop, aspect_ratio, quad) {
            None => {
                return contains(quad, &crop, CONTAINMENT_TOLERANCE).then_some(crop);
            }
            Some(next) if next.width > 0.0 && next.height > 0.0 => crop = next,
            Some(next) => {
                trace!("correction of {:?} collapsed to {:?}", crop, next);
                return None;
            }
        }
    }
    trace!("edge corrections from {:?} did not converge", start);
    None
}

/// One round of left, top, right and bottom corrections. `None` when the
/// rect already passes every edge.
fn correct_edges(crop: &CropRect, aspect_ratio: f64, quad: &Quadrilateral) -> Option<CropRect> {
    let mut rect = crop.to_quad();
    let mut changed = false;

    let left = Line::through(quad.top_left, quad.bottom_left);
    if rect.top_left.x < left.x_at(rect.top_left.y) - EDGE_EPSILON
        || rect.bottom_left.x < left.x_at(rect.bottom_left.y) - EDGE_EPSILON
    {
        let x = left
            .x_at(rect.top_left.y)
            .max(left.x_at(rect.bottom_left.y));
        rect.translate_rect_to(x, rect.top_left.y);
        changed = true;
        trace!("left edge violated, moved to x={}", x);
    }

    let top = Line::through(quad.top_right, quad.top_left);
    if rect.top_left.y < top.y_at(rect.top_left.x) - EDGE_EPSILON
        || rect.top_right.y < top.y_at(rect.top_right.x) - EDGE_EPSILON
    {
        let y = top.y_at(rect.top_left.x).max(top.y_at(rect.top_right.x));
        rect.translate_rect_to(rect.top_left.x, y);
        changed = true;
        trace!("top edge violated, moved to y={}", y);
    }

    let right = Line::through(quad.top_right, quad.bottom_right);
    if rect.top_right.x > right.x_at(rect.top_right.y) + EDGE_EPSILON
        || rect.bottom_right.x > right.x_at(rect.bottom_right.y) + EDGE_EPSILON
    {
        let x = right
            .x_at(rect.top_right.y)
            .min(right.x_at(rect.bottom_right.y));
        let delta_x = x - rect.top_right.x;
        if rect.top_left.x + delta_x >= left.x_at(rect.top_left.y) - EDGE_EPSILON
            && rect.bottom_left.x + delta_x >= left.x_at(rect.bottom_left.y) - EDGE_EPSILON
        {
            rect.translate_rect_to(rect.top_left.x + delta_x, rect.top_left.y);
            trace!("right edge violated, translated by {}", delta_x);
        } else {
            rect.top_right.x = x;
            rect.bottom_right.x = x;
            trace!("right edge violated, shrunk to x={}", x);
        }
        changed = true;
    }

    let bottom = Line::through(quad.bottom_left, quad.bottom_right);
    if rect.bottom_right.y > bottom.y_at(rect.bottom_right.x) + EDGE_EPSILON
        || rect.bottom_left.y > bottom.y_at(rect.bottom_left.x) + EDGE_EPSILON
    {
        let y = bottom
            .y_at(rect.bottom_right.x)
            .min(bottom.y_at(rect.bottom_left.x));
        let delta_y = y - rect.bottom_right.y;
        if rect.top_left.y + delta_y >= top.y_at(rect.top_left.x) - EDGE_EPSILON
            && rect.top_right.y + delta_y >= top.y_at(rect.top_right.x) - EDGE_EPSILON
        {
            rect.translate_rect_to(rect.top_left.x, rect.top_left.y + delta_y);
            trace!("bottom edge violated, translated by {}", delta_y);
        } else {
            rect.bottom_right.y = y;
            rect.bottom_left.y = y;
            trace!("bottom edge violated, shrunk to y={}", y);
        }
        changed = true;
    }

    if !changed {
        return None;
    }

    let size = rect.rect_size();
    let (mut width, mut height) = (size.width, size.height);
    if width / height > aspect_ratio {
        width = height * aspect_ratio;
    } else {
        height = width / aspect_ratio;
    }
    Some(CropRect::new(rect.top_left.x, rect.top_left.y, width, height))
}

/// Largest crop of `aspect_ratio` centered on the quad's corner centroid,
/// found by bisecting its height.
fn centered_inscribed_crop(
    aspect_ratio: f64,
    media_width: f64,
    media_height: f64,
    quad: &Quadrilateral,
) -> Result<CropRect> {
    let corners = quad.corners();
    let center = Point::new(
        corners.iter().map(|p| p.x).sum::<f64>() / 4.0,
        corners.iter().map(|p| p.y).sum::<f64>() / 4.0,
    );
    let centered = |height: f64| {
        let width = height * aspect_ratio;
        CropRect::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    };

    let (mut fits, mut escapes) = (0.0, media_height.min(media_width / aspect_ratio));
    for _ in 0..BISECTION_STEPS {
        let mid = (fits + escapes) / 2.0;
        if contains(quad, &centered(mid), 0.0) {
            fits = mid;
        } else {
            escapes = mid;
        }
    }

    if fits > 0.0 {
        Ok(centered(fits))
    } else {
        Err(CropError::NoFit(aspect_ratio))
    }
}

/// Half-plane test of every corner of `rect` against every edge of `quad`.
///
/// The quad is walked clockwise (top-left, top-right, bottom-right,
/// bottom-left); a corner passes an edge when it is on the inner side or
/// within `tolerance` pixels of it.
pub fn contains(quad: &Quadrilateral, rect: &CropRect, tolerance: f64) -> bool {
    let edges = quad.corners();
    let corners = rect.to_quad().corners();
    (0..4).all(|i| {
        let a = edges[i];
        let b = edges[(i + 1) % 4];
        let length = (b.x - a.x).hypot(b.y - a.y);
        if length == 0.0 {
            return true;
        }
        corners.iter().all(|p| {
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            cross / length >= -tolerance
        })
    })
}
