//! Quad projection for rotated media.
//!
//! Turns the media rectangle plus yaw/pitch/roll into the flat quadrilateral
//! the image appears to occupy, together with its (possibly enlarged)
//! bounding size. The camera model is an approximation tuned by eye against
//! the platform renderer; the field of view and rotation pivots below are
//! part of the stored-crop format and must not be "corrected".

use crate::edition::{EditionParameters, Orientation};
use crate::error::{ensure_dimension, ensure_finite, Result};
use crate::geometry::{deg_to_rad, Quadrilateral, Size};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Horizontal field of view, in degrees. Approximates a 28 mm full-frame lens.
pub const FIELD_OF_VIEW_DEGREES: f64 = 77.5;

/// Bounding size and quad of the media after projection, normalized so the
/// bounding box starts at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMedia {
    pub width: f64,
    pub height: f64,
    pub quad: Quadrilateral,
}

impl ProjectedMedia {
    /// Projects media of the given pixel size using stored edition parameters.
    pub fn from_edition(media: Size, params: &EditionParameters) -> Result<Self> {
        project_quad(
            media.width,
            media.height,
            params.orientation(),
            params.yaw,
            params.pitch,
            params.roll,
        )
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Projects the media rectangle through pitch, yaw and roll.
///
/// `media_width`/`media_height` are the raw pixel dimensions; quarter-turn
/// orientations swap them before projecting. Rotations are applied in the
/// fixed order pitch, yaw, roll, followed by a single perspective divide.
/// Without any non-zero angle the axis-aligned rectangle is returned as is.
pub fn project_quad(
    media_width: f64,
    media_height: f64,
    orientation: Orientation,
    yaw: Option<f64>,
    pitch: Option<f64>,
    roll: Option<f64>,
) -> Result<ProjectedMedia> {
    ensure_dimension("media_width", media_width)?;
    ensure_dimension("media_height", media_height)?;
    let yaw = checked_angle("yaw", yaw)?;
    let pitch = checked_angle("pitch", pitch)?;
    let roll = checked_angle("roll", roll)?;

    let (mut width, mut height) = orientation.oriented_size(media_width, media_height);
    let mut quad = Quadrilateral::from_rect(0.0, 0.0, width, height);

    let distance = (deg_to_rad(FIELD_OF_VIEW_DEGREES / 2.0)).tan() * width.max(height);
    let cx = width / 2.0;
    let cy = height / 2.0;
    let cz = distance;

    if let Some(pitch) = pitch {
        let (sin, cos) = deg_to_rad(pitch).sin_cos();
        // The Y pivot is cx, not cy. Stored crops were authored against it.
        for point in quad.corners_mut() {
            let (y, z) = (point.y, point.z);
            point.y = (y - cx) * cos - (z - cz) * sin + cx;
            point.z = (y - cx) * sin + (z - cz) * cos + cz;
        }
    }

    if let Some(yaw) = yaw {
        let (sin, cos) = deg_to_rad(-yaw).sin_cos();
        for point in quad.corners_mut() {
            let (x, z) = (point.x, point.z);
            point.x = (x - cx) * cos - (z - cz) * sin + cx;
            point.z = (x - cx) * sin + (z - cz) * cos + cz;
        }
    }

    if let Some(roll) = roll {
        let (sin, cos) = deg_to_rad(-roll).sin_cos();
        for point in quad.corners_mut() {
            let (x, y) = (point.x, point.y);
            point.x = (x - cx) * cos - (y - cy) * sin + cx;
            point.y = (x - cx) * sin + (y - cy) * cos + cy;
        }
    }

    if yaw.is_some() || pitch.is_some() || roll.is_some() {
        for point in quad.corners_mut() {
            let delta = distance / (distance - point.z);
            point.x = (point.x - cx) * delta + cx;
            point.y = (point.y - cy) * delta + cy;
            point.z = 0.0;
        }

        let min_x = quad.top_left.x.min(quad.bottom_left.x);
        let min_y = quad.top_left.y.min(quad.top_right.y);
        width = quad.top_right.x.max(quad.bottom_right.x) - min_x;
        height = quad.bottom_left.y.max(quad.bottom_right.y) - min_y;
        quad.translate(-min_x, -min_y);

        if !quad.is_convex() {
            warn!(
                "projected quad is not convex (yaw={:?}, pitch={:?}, roll={:?})",
                yaw, pitch, roll
            );
        }
        debug!(
            "projected {}x{} media to {:.3}x{:.3} bounding box",
            media_width, media_height, width, height
        );
    }

    Ok(ProjectedMedia {
        width,
        height,
        quad,
    })
}

/// Treats a missing or zero angle as "no rotation", and rejects NaN/inf.
fn checked_angle(name: &'static str, angle: Option<f64>) -> Result<Option<f64>> {
    match angle {
        Some(a) => Ok(Some(ensure_finite(name, a)?).filter(|a| *a != 0.0)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
        assert_eq!(actual.z, 0.0);
    }

    #[test]
    fn no_rotation_is_identity() {
        let projected = project_quad(640.0, 480.0, Orientation::Up, None, None, None).unwrap();
        assert_eq!(projected.width, 640.0);
        assert_eq!(projected.height, 480.0);
        assert_eq!(projected.quad, Quadrilateral::from_rect(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn zero_angles_behave_like_absent_angles() {
        let projected =
            project_quad(640.0, 480.0, Orientation::Up, Some(0.0), Some(0.0), Some(0.0)).unwrap();
        assert_eq!(projected.quad, Quadrilateral::from_rect(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn quarter_turn_swaps_before_projecting() {
        let projected = project_quad(640.0, 480.0, Orientation::Left, None, None, None).unwrap();
        assert_eq!(projected.size(), Size::new(480.0, 640.0));
    }

    #[test]
    fn roll_on_square_matches_reference_corners() {
        // Pure roll leaves z at 0, so the perspective divide is the identity.
        let projected = project_quad(100.0, 100.0, Orientation::Up, None, None, Some(5.0)).unwrap();
        assert!((projected.width - 108.335_044_083_940_37).abs() < 1e-9);
        assert!((projected.height - 108.335_044_083_940_37).abs() < 1e-9);
        assert_point(projected.quad.top_left, 0.0, 8.715_574_274_765_814);
        assert_point(projected.quad.top_right, 99.619_469_809_174_56, 0.0);
        assert_point(projected.quad.bottom_left, 8.715_574_274_765_814, 108.335_044_083_940_37);
        assert_point(projected.quad.bottom_right, 108.335_044_083_940_37, 99.619_469_809_174_56);
    }

    #[test]
    fn small_roll_never_shrinks_the_bounding_box() {
        for roll in [0.5, 1.0, 3.0, 5.0, 10.0, -5.0] {
            let projected =
                project_quad(100.0, 100.0, Orientation::Up, None, None, Some(roll)).unwrap();
            assert!(projected.width >= 100.0, "roll {roll}: width {}", projected.width);
            assert!(projected.height >= 100.0, "roll {roll}: height {}", projected.height);
        }
    }

    #[test]
    fn yaw_widens_landscape_media() {
        let projected = project_quad(200.0, 100.0, Orientation::Up, Some(10.0), None, None).unwrap();
        assert!((projected.width - 208.737_049_464_697_8).abs() < 1e-6);
        assert!((projected.height - 114.073_579_096_368_46).abs() < 1e-6);
    }

    #[test]
    fn pitch_uses_reference_pivot() {
        let projected = project_quad(200.0, 100.0, Orientation::Up, None, Some(10.0), None).unwrap();
        assert!((projected.width - 203.085_322_377_148_94).abs() < 1e-6);
        assert!((projected.height - 97.928_889_352_799_71).abs() < 1e-6);
    }

    #[test]
    fn projected_quad_is_normalized_to_origin() {
        let projected =
            project_quad(400.0, 300.0, Orientation::Up, Some(5.0), Some(5.0), Some(5.0)).unwrap();
        let quad = projected.quad;
        assert!(quad.top_left.x.min(quad.bottom_left.x).abs() < 1e-9);
        assert!(quad.top_left.y.min(quad.top_right.y).abs() < 1e-9);
        assert!(quad.is_convex());
    }

    #[test]
    fn rejects_bad_dimensions_and_angles() {
        assert!(project_quad(0.0, 10.0, Orientation::Up, None, None, None).is_err());
        assert!(project_quad(10.0, f64::NAN, Orientation::Up, None, None, None).is_err());
        assert!(project_quad(10.0, 10.0, Orientation::Up, Some(f64::INFINITY), None, None).is_err());
    }

    #[test]
    fn from_edition_reads_orientation_and_roll() {
        let params = EditionParameters {
            orientation: Some(Orientation::Right),
            roll: Some(5.0),
            ..Default::default()
        };
        let projected = ProjectedMedia::from_edition(Size::new(100.0, 100.0), &params).unwrap();
        assert!((projected.width - 108.335_044_083_940_37).abs() < 1e-9);
    }
}
