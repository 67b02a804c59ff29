//! Edition parameters read from the media editor.
//!
//! Only the fields the crop engine consumes are modelled; the rest of the
//! edition payload (brightness, contrast, filters...) is ignored when
//! deserializing.

use crate::geometry::CropRect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Discrete base orientation applied before any free rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::Left,
        Orientation::Right,
        Orientation::UpMirrored,
        Orientation::DownMirrored,
        Orientation::LeftMirrored,
        Orientation::RightMirrored,
    ];

    /// Whether this orientation is a quarter turn, so the displayed media has
    /// its width and height exchanged.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Left
                | Orientation::Right
                | Orientation::LeftMirrored
                | Orientation::RightMirrored
        )
    }

    /// Media size as displayed under this orientation.
    pub fn oriented_size(self, width: f64, height: f64) -> (f64, f64) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "UP" => Ok(Orientation::Up),
            "DOWN" => Ok(Orientation::Down),
            "LEFT" => Ok(Orientation::Left),
            "RIGHT" => Ok(Orientation::Right),
            "UP_MIRRORED" => Ok(Orientation::UpMirrored),
            "DOWN_MIRRORED" => Ok(Orientation::DownMirrored),
            "LEFT_MIRRORED" => Ok(Orientation::LeftMirrored),
            "RIGHT_MIRRORED" => Ok(Orientation::RightMirrored),
            _ => Err(format!("unknown orientation '{}'", s)),
        }
    }
}

/// The subset of the editor's edition parameters that shapes the crop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionParameters {
    #[serde(default)]
    pub orientation: Option<Orientation>,
    /// Rotation around the vertical axis, in degrees.
    #[serde(default)]
    pub yaw: Option<f64>,
    /// Rotation around the horizontal axis, in degrees.
    #[serde(default)]
    pub pitch: Option<f64>,
    /// In-plane rotation, in degrees.
    #[serde(default)]
    pub roll: Option<f64>,
    /// Crop previously applied to the media, if any.
    #[serde(default)]
    pub crop_data: Option<CropRect>,
}

impl EditionParameters {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads parameters from a JSON file, e.g. an exported editor draft.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.unwrap_or_default()
    }

    /// True when any of yaw, pitch or roll is set to a non-zero angle.
    pub fn is_rotated(&self) -> bool {
        [self.yaw, self.pitch, self.roll]
            .iter()
            .any(|angle| angle.is_some_and(|a| a != 0.0))
    }
}

/// Slider range of a numeric edition parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

/// Range the editor offers for roll, in degrees.
pub const ROLL_RANGE: ParameterRange = ParameterRange {
    min: -20.0,
    max: 20.0,
};

impl ParameterRange {
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_swap_dimensions() {
        let swapping: Vec<_> = Orientation::ALL
            .into_iter()
            .filter(|o| o.swaps_dimensions())
            .collect();
        assert_eq!(
            swapping,
            vec![
                Orientation::Left,
                Orientation::Right,
                Orientation::LeftMirrored,
                Orientation::RightMirrored
            ]
        );
        assert_eq!(Orientation::Right.oriented_size(400.0, 300.0), (300.0, 400.0));
        assert_eq!(Orientation::Down.oriented_size(400.0, 300.0), (400.0, 300.0));
    }

    #[test]
    fn missing_parameter_file_is_an_io_error() {
        let err = EditionParameters::from_file("/nonexistent/quadcrop/params.json").unwrap_err();
        assert!(matches!(err, crate::CropError::Io(_)));
    }

    #[test]
    fn parses_stored_edition_payload() {
        let json = r#"{
            "orientation": "LEFT_MIRRORED",
            "roll": 4.5,
            "brightness": 0.2,
            "cropData": {"originX": 10, "originY": 20, "width": 100, "height": 50}
        }"#;
        let params = EditionParameters::from_json(json).unwrap();
        assert_eq!(params.orientation(), Orientation::LeftMirrored);
        assert_eq!(params.roll, Some(4.5));
        assert_eq!(params.yaw, None);
        assert_eq!(params.crop_data, Some(CropRect::new(10.0, 20.0, 100.0, 50.0)));
        assert!(params.is_rotated());
    }

    #[test]
    fn zero_angles_are_not_a_rotation() {
        let params = EditionParameters {
            yaw: Some(0.0),
            roll: Some(0.0),
            ..Default::default()
        };
        assert!(!params.is_rotated());
        assert_eq!(params.orientation(), Orientation::Up);
    }

    #[test]
    fn orientation_from_str_is_lenient_on_case() {
        assert_eq!("right-mirrored".parse::<Orientation>(), Ok(Orientation::RightMirrored));
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn roll_range_matches_editor_slider() {
        assert!(ROLL_RANGE.contains(-20.0) && ROLL_RANGE.contains(20.0));
        assert!(!ROLL_RANGE.contains(20.5));
        assert_eq!(ROLL_RANGE.clamp(-27.0), -20.0);
        assert_eq!(ROLL_RANGE.clamp(3.4), 3.4);
    }
}
