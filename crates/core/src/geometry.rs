//! Geometry primitives shared by projection, solving and gestures.
//!
//! All coordinates are in media pixel space after orientation normalization,
//! with the origin at the top-left of the media bounding box and `y` growing
//! downward.

use serde::{Deserialize, Serialize};

/// A point in media space. `z` is only meaningful during projection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Four named corners, clockwise from top-left.
///
/// The names are labels, not a guarantee of screen position: once the media
/// has been rotated, `top_left` is simply the corner that started there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quadrilateral {
    /// Builds the axis-aligned quad of the rectangle `(x, y, width, height)`.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top_left: Point::new(x, y),
            top_right: Point::new(x + width, y),
            bottom_left: Point::new(x, y + height),
            bottom_right: Point::new(x + width, y + height),
        }
    }

    /// Corners in clockwise order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    pub fn corners_mut(&mut self) -> [&mut Point; 4] {
        [
            &mut self.top_left,
            &mut self.top_right,
            &mut self.bottom_right,
            &mut self.bottom_left,
        ]
    }

    /// Size read from the top edge and the left edge. Only meaningful for
    /// axis-aligned quads.
    pub fn rect_size(&self) -> Size {
        Size::new(
            self.top_right.x - self.top_left.x,
            self.bottom_left.y - self.top_left.y,
        )
    }

    /// Moves an axis-aligned quad so its top-left lands on `(x, y)`, keeping
    /// its size.
    pub fn translate_rect_to(&mut self, x: f64, y: f64) {
        let size = self.rect_size();
        *self = Self::from_rect(x, y, size.width, size.height);
    }

    /// Shifts every corner by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for point in self.corners_mut() {
            point.x += dx;
            point.y += dy;
        }
    }

    /// Whether the four corners, walked clockwise, form a convex polygon.
    ///
    /// Diagnostic only: nothing in the engine changes behavior based on it.
    pub fn is_convex(&self) -> bool {
        let corners = self.corners();
        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let c = corners[(i + 2) % 4];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// An axis-aligned crop rectangle.
///
/// Serialized with the field names used by stored edition parameters
/// (`originX`, `originY`, `width`, `height`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRect {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub const fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin_x + self.width / 2.0,
            self.origin_y + self.height / 2.0,
        )
    }

    pub fn to_quad(&self) -> Quadrilateral {
        Quadrilateral::from_rect(self.origin_x, self.origin_y, self.width, self.height)
    }

    /// Largest-absolute-difference distance between two rects, over all four
    /// scalar properties.
    pub fn max_delta(&self, other: &CropRect) -> f64 {
        (self.origin_x - other.origin_x)
            .abs()
            .max((self.origin_y - other.origin_y).abs())
            .max((self.width - other.width).abs())
            .max((self.height - other.height).abs())
    }
}

/// A line through two points, as `y = slope * x + intercept`.
///
/// Vertical lines carry their constant `x` instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Line {
    Vertical { x: f64 },
    Sloped { slope: f64, intercept: f64 },
}

impl Line {
    pub fn through(p1: Point, p2: Point) -> Self {
        let slope = (p2.y - p1.y) / (p2.x - p1.x);
        if !slope.is_finite() {
            return Line::Vertical { x: p1.x };
        }
        Line::Sloped {
            slope,
            intercept: p1.y - slope * p1.x,
        }
    }

    /// The `x` of the line at height `y`.
    pub fn x_at(&self, y: f64) -> f64 {
        match *self {
            Line::Vertical { x } => x,
            Line::Sloped { slope, intercept } => (y - intercept) / slope,
        }
    }

    /// The `y` of the line at abscissa `x`.
    ///
    /// A vertical line has no single `y`; it yields 0, which only a collapsed
    /// top or bottom edge ever asks for.
    pub fn y_at(&self, x: f64) -> f64 {
        match *self {
            Line::Vertical { .. } => 0.0,
            Line::Sloped { slope, intercept } => slope * x + intercept,
        }
    }
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    std::f64::consts::PI * degrees / 180.0
}
