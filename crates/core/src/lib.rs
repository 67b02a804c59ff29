//! quadcrop Core Library
//!
//! This library provides the crop engine behind the media editor: it works
//! out where a rotated photo or video frame lands on screen, fits an
//! aspect-locked crop inside it, and drives that crop from pan and pinch
//! gestures.
//!
//! # Overview
//!
//! - **Projection**: yaw/pitch/roll to an on-screen quad via [`projection`]
//! - **Solving**: aspect-locked crop inside the quad via [`solver`]
//! - **Gestures**: live pan/pinch and settle animations via [`gesture`]
//! - **Layout**: fitting the preview in its container via [`layout`]
//!
//! # Quick Start
//!
//! ```ignore
//! use quadcrop_core::{CropEngine, EditionParameters, Size};
//!
//! let engine = CropEngine::new()?;
//! let params = EditionParameters::from_json(stored_json)?;
//! let media = engine.project(Size::new(4032.0, 3024.0), &params)?;
//! let crop = engine.solve(&media, params.crop_data, 1.0)?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and management
//! - [`edition`]: Edition parameters and orientations
//! - [`error`]: Error types and result aliases
//! - [`geometry`]: Points, quads, lines and crop rectangles
//! - [`gesture`]: Gesture functions and the crop controller
//! - [`layout`]: Container fitting and display mapping
//! - [`projection`]: Quad projection
//! - [`solver`]: Crop constraint solver

pub mod config;
pub mod edition;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod projection;
pub mod solver;

// Re-export primary types for convenience
pub use config::Config;
pub use edition::{EditionParameters, Orientation};
pub use error::{CropError, Result};
pub use geometry::{CropRect, Line, Point, Quadrilateral, Size};
pub use gesture::{
    begin_gesture, end_gesture, update_pan, update_pinch, CropController, CropDataChange,
    CropProperty, GestureKind, GestureSession, SettleOutcome, Transition,
};
pub use layout::{fit_to_container, DisplayLayout};
pub use projection::{project_quad, ProjectedMedia};
pub use solver::solve_crop;

/// Main entry point for embedding the crop engine.
///
/// Holds the loaded [`Config`] and wires projection, solving and the gesture
/// controller together so callers do not have to pass settings around.
///
/// # Example
///
/// ```ignore
/// use quadcrop_core::CropEngine;
///
/// let engine = CropEngine::new()?;
/// let controller = engine.controller(media, 16.0 / 9.0, container, previous_crop)?;
/// ```
pub struct CropEngine {
    config: Config,
}

impl CropEngine {
    /// Creates an engine with configuration loaded from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::Config`] if an environment variable holds an
    /// invalid value.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self { config })
    }

    /// Creates an engine with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Projects media of `media_size` raw pixels with the given edition
    /// parameters.
    pub fn project(&self, media_size: Size, params: &EditionParameters) -> Result<ProjectedMedia> {
        ProjectedMedia::from_edition(media_size, params)
    }

    /// Solves `candidate` against projected media.
    pub fn solve(
        &self,
        media: &ProjectedMedia,
        candidate: Option<CropRect>,
        aspect_ratio: f64,
    ) -> Result<CropRect> {
        solve_crop(candidate, aspect_ratio, media.width, media.height, &media.quad)
    }

    /// Builds a gesture controller using this engine's settle settings.
    pub fn controller(
        &self,
        media: ProjectedMedia,
        aspect_ratio: f64,
        container: Size,
        initial: Option<CropRect>,
    ) -> Result<CropController> {
        CropController::new(media, aspect_ratio, container, &self.config, initial)
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Loads `.env` files if present. Call once at startup before reading
/// configuration.
pub fn init() {
    let _ = dotenvy::dotenv();
}
