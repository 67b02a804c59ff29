//! Layout mapping between the crop container on screen and media space.
//!
//! The crop preview is letterboxed inside its container at the target aspect
//! ratio. Gesture deltas arrive in container pixels, so converting them to
//! media pixels needs the displayed size computed here.

use crate::error::{ensure_aspect_ratio, ensure_dimension, Result};
use crate::geometry::{CropRect, Point, Quadrilateral, Size};

/// Largest size of `aspect_ratio` that fits in `container`.
///
/// A container wider than the ratio is filled vertically, otherwise
/// horizontally.
pub fn fit_to_container(container: Size, aspect_ratio: f64) -> Result<Size> {
    ensure_dimension("container_width", container.width)?;
    ensure_dimension("container_height", container.height)?;
    ensure_aspect_ratio(aspect_ratio)?;

    if container.width / container.height > aspect_ratio {
        Ok(Size::new(aspect_ratio * container.height, container.height))
    } else {
        Ok(Size::new(container.width, container.width / aspect_ratio))
    }
}

/// Screen pixels per media pixel for a crop shown at `displayed` size.
///
/// Wide media is matched on height and tall media on width, the same axis
/// [`fit_to_container`] fills.
pub fn display_scale(media: Size, displayed: Size, aspect_ratio: f64, crop: &CropRect) -> f64 {
    if media.width / media.height > aspect_ratio {
        displayed.height / crop.height
    } else {
        displayed.width / crop.width
    }
}

/// Where the crop preview sits inside its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLayout {
    pub container: Size,
    pub displayed: Size,
    /// Top-left of the displayed area, relative to the container.
    pub offset: Point,
}

impl DisplayLayout {
    pub fn new(container: Size, aspect_ratio: f64) -> Result<Self> {
        let displayed = fit_to_container(container, aspect_ratio)?;
        Ok(Self {
            container,
            displayed,
            offset: Point::new(
                (container.width - displayed.width) / 2.0,
                (container.height - displayed.height) / 2.0,
            ),
        })
    }

    /// Maps a media-space quad into container coordinates, as seen through
    /// `crop` at `scale` screen pixels per media pixel. Used to draw the
    /// projected media outline over the crop grid.
    pub fn quad_to_display(&self, quad: &Quadrilateral, crop: &CropRect, scale: f64) -> Quadrilateral {
        let mut mapped = *quad;
        for point in mapped.corners_mut() {
            point.x = (point.x - crop.origin_x) * scale + self.offset.x;
            point.y = (point.y - crop.origin_y) * scale + self.offset.y;
        }
        mapped
    }
}
