use std::env;
use std::time::Duration;
use crate::error::{CropError, Result};
use dotenvy::dotenv;

/// Default duration of the settle animation played after a gesture ends.
pub const DEFAULT_SETTLE_DURATION: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Duration of each property transition toward the settled crop.
    pub settle_duration: Duration,
    /// Clamp pinch results to the media size, for compositors that cannot
    /// downscale below the source resolution.
    pub clamp_pinch_to_media: bool,
    /// Aspect ratio used when the caller does not supply one.
    pub aspect_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_duration: DEFAULT_SETTLE_DURATION,
            clamp_pinch_to_media: false,
            aspect_ratio: 1.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let mut builder = Self::builder();

        if let Ok(raw) = env::var("QUADCROP_SETTLE_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                CropError::config(format!("QUADCROP_SETTLE_MS must be an integer, got '{}'", raw))
            })?;
            builder = builder.with_settle_duration(Duration::from_millis(millis));
        }

        if let Ok(raw) = env::var("QUADCROP_CLAMP_PINCH") {
            builder = builder.with_clamp_pinch(parse_flag("QUADCROP_CLAMP_PINCH", &raw)?);
        }

        if let Ok(raw) = env::var("QUADCROP_ASPECT_RATIO") {
            let ratio = parse_ratio(&raw).ok_or_else(|| {
                CropError::config(format!(
                    "QUADCROP_ASPECT_RATIO must be a number or W:H, got '{}'",
                    raw
                ))
            })?;
            builder = builder.with_aspect_ratio(ratio);
        }

        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`], used when settings come from code rather than the
/// environment.
#[derive(Default, Debug, Clone)]
pub struct ConfigBuilder {
    settle_duration: Option<Duration>,
    clamp_pinch_to_media: Option<bool>,
    aspect_ratio: Option<f64>,
}

impl ConfigBuilder {
    pub fn with_settle_duration(mut self, duration: Duration) -> Self {
        self.settle_duration = Some(duration);
        self
    }

    pub fn with_clamp_pinch(mut self, clamp: bool) -> Self {
        self.clamp_pinch_to_media = Some(clamp);
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let aspect_ratio = self.aspect_ratio.unwrap_or(defaults.aspect_ratio);
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(CropError::config(format!(
                "aspect ratio must be finite and > 0, got {}",
                aspect_ratio
            )));
        }

        Ok(Config {
            settle_duration: self.settle_duration.unwrap_or(defaults.settle_duration),
            clamp_pinch_to_media: self
                .clamp_pinch_to_media
                .unwrap_or(defaults.clamp_pinch_to_media),
            aspect_ratio,
        })
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CropError::config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

/// Parses an aspect ratio written either as a decimal (`1.5`) or as `W:H`
/// (`16:9`).
pub fn parse_ratio(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let ratio = match raw.split_once(':') {
        Some((w, h)) => w.trim().parse::<f64>().ok()? / h.trim().parse::<f64>().ok()?,
        None => raw.parse::<f64>().ok()?,
    };
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_editor_behavior() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.settle_duration, Duration::from_millis(100));
        assert!(!config.clamp_pinch_to_media);
        assert_eq!(config.aspect_ratio, 1.0);
    }

    #[test]
    fn builder_rejects_non_positive_ratio() {
        let err = Config::builder().with_aspect_ratio(0.0).build().unwrap_err();
        assert!(matches!(err, CropError::Config(_)));
    }

    #[test]
    fn ratio_accepts_decimal_and_colon_forms() {
        assert_eq!(parse_ratio("1.5"), Some(1.5));
        assert_eq!(parse_ratio(" 16:9 "), Some(16.0 / 9.0));
        assert_eq!(parse_ratio("4:0"), None);
        assert_eq!(parse_ratio("-2"), None);
        assert_eq!(parse_ratio("square"), None);
    }

    #[test]
    fn flags_parse_common_spellings() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(parse_flag("X", "1").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
