//! Interactive pan/pinch handling for the crop rectangle.
//!
//! During a gesture the crop follows the pointer with only loose bounds, so
//! it may leave the media quad for a moment. When the gesture ends the
//! solver produces the settled crop, and the controller asks an external
//! animation driver to move each changed property there. One
//! [`CropDataChange`] is emitted per gesture end, once every transition has
//! reported back.
//!
//! # Example
//!
//! ```ignore
//! let mut controller = CropController::new(media, 1.0, container, &config, None)?;
//! controller.begin_gesture(GestureKind::Pinch)?;
//! controller.pinch(1.4)?;
//! match controller.end_gesture()? {
//!     SettleOutcome::Settled(change) => publish(change.rect),
//!     SettleOutcome::Animating { generation, transitions, .. } => {
//!         for t in transitions {
//!             driver.animate(t); // later: controller.transition_finished(generation, t.property)
//!         }
//!     }
//! }
//! ```

use crate::config::Config;
use crate::error::{ensure_aspect_ratio, ensure_dimension, ensure_finite, CropError, Result};
use crate::geometry::{CropRect, Point, Quadrilateral, Size};
use crate::layout::{display_scale, DisplayLayout};
use crate::projection::ProjectedMedia;
use crate::solver::solve_crop;
use log::{debug, trace, warn};
use std::time::Duration;

/// Which gesture is driving the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Single pointer translation.
    Pan,
    /// Two pointer scale.
    Pinch,
}

/// Crop snapshot taken when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub kind: GestureKind,
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_width: f64,
    pub offset_height: f64,
}

impl GestureSession {
    pub fn offset(&self) -> CropRect {
        CropRect::new(
            self.offset_x,
            self.offset_y,
            self.offset_width,
            self.offset_height,
        )
    }
}

pub fn begin_gesture(kind: GestureKind, current: CropRect) -> GestureSession {
    GestureSession {
        kind,
        offset_x: current.origin_x,
        offset_y: current.origin_y,
        offset_width: current.width,
        offset_height: current.height,
    }
}

/// Live crop for a pan of `translation` screen pixels since the gesture
/// started.
///
/// The translation is converted to media pixels with the display scale and
/// subtracted from the snapshot origin. The origin may range from a quarter
/// of the width (half of the height) before the media up to three quarters
/// of the crop past its far edge; containment is only restored at gesture
/// end.
pub fn update_pan(
    session: &GestureSession,
    translation: Point,
    media: Size,
    displayed: Size,
    aspect_ratio: f64,
) -> Result<CropRect> {
    ensure_finite("translation_x", translation.x)?;
    ensure_finite("translation_y", translation.y)?;
    ensure_dimension("media_width", media.width)?;
    ensure_dimension("media_height", media.height)?;
    ensure_dimension("displayed_width", displayed.width)?;
    ensure_dimension("displayed_height", displayed.height)?;
    ensure_aspect_ratio(aspect_ratio)?;

    let offset = session.offset();
    let scale = display_scale(media, displayed, aspect_ratio, &offset);

    let origin_x = clamp_lenient(
        offset.origin_x - translation.x / scale,
        -offset.width / 4.0,
        media.width - 3.0 * offset.width / 4.0,
    );
    let origin_y = clamp_lenient(
        offset.origin_y - translation.y / scale,
        -offset.height / 2.0,
        media.height - 3.0 * offset.height / 4.0,
    );

    Ok(CropRect::new(origin_x, origin_y, offset.width, offset.height))
}

/// Live crop for a pinch of `scale` since the gesture started.
///
/// Spreading the fingers (`scale > 1`) shrinks the crop, which zooms in. The
/// crop center stays put. With `clamp_to_media`, each dimension is capped at
/// the media size for compositors that cannot downscale below the source.
pub fn update_pinch(
    session: &GestureSession,
    scale: f64,
    media: Size,
    clamp_to_media: bool,
) -> Result<CropRect> {
    ensure_dimension("pinch_scale", scale)?;
    ensure_dimension("media_width", media.width)?;
    ensure_dimension("media_height", media.height)?;

    let offset = session.offset();
    let mut width = offset.width / scale;
    let mut height = offset.height / scale;
    if clamp_to_media {
        width = width.min(media.width);
        height = height.min(media.height);
    }

    Ok(CropRect::new(
        offset.origin_x - (width - offset.width) / 2.0,
        offset.origin_y - (height - offset.height) / 2.0,
        width,
        height,
    ))
}

/// Settled target for the live crop at gesture end.
pub fn end_gesture(
    live: CropRect,
    aspect_ratio: f64,
    media_width: f64,
    media_height: f64,
    quad: &Quadrilateral,
) -> Result<CropRect> {
    solve_crop(Some(live), aspect_ratio, media_width, media_height, quad)
}

/// Like `f64::clamp` but tolerant of `lower > upper`: the upper bound is
/// applied first, then the lower one wins.
fn clamp_lenient(value: f64, lower: f64, upper: f64) -> f64 {
    value.min(upper).max(lower)
}

/// One of the four animated scalar properties of the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropProperty {
    OriginX,
    OriginY,
    Width,
    Height,
}

impl CropProperty {
    pub const ALL: [CropProperty; 4] = [
        CropProperty::OriginX,
        CropProperty::OriginY,
        CropProperty::Width,
        CropProperty::Height,
    ];

    pub fn get(self, rect: &CropRect) -> f64 {
        match self {
            CropProperty::OriginX => rect.origin_x,
            CropProperty::OriginY => rect.origin_y,
            CropProperty::Width => rect.width,
            CropProperty::Height => rect.height,
        }
    }

    pub fn set(self, rect: &mut CropRect, value: f64) {
        match self {
            CropProperty::OriginX => rect.origin_x = value,
            CropProperty::OriginY => rect.origin_y = value,
            CropProperty::Width => rect.width = value,
            CropProperty::Height => rect.height = value,
        }
    }
}

/// Timing curve of a settle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cubic ease-out.
    #[default]
    EaseOut,
}

impl Easing {
    /// Maps linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// A request for the animation driver to move one property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Settle phase this transition belongs to.
    pub generation: u64,
    pub property: CropProperty,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl Transition {
    /// Interpolated value `elapsed` into the transition.
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

/// Notification that the crop has settled on a new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropDataChange {
    pub rect: CropRect,
}

/// Result of ending a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// Nothing to animate; the notification is delivered right away.
    Settled(CropDataChange),
    /// The driver must run `transitions` and report each completion through
    /// [`CropController::transition_finished`].
    Animating {
        generation: u64,
        target: CropRect,
        transitions: Vec<Transition>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    Idle,
    Active(GestureKind),
    Settling {
        generation: u64,
        target: CropRect,
        pending: Vec<CropProperty>,
    },
}

/// Owns the live crop and drives it through gestures and settling.
///
/// Gesture callbacks must arrive in order and never overlap; the controller
/// is not reentrant.
#[derive(Debug, Clone)]
pub struct CropController {
    media: ProjectedMedia,
    aspect_ratio: f64,
    layout: DisplayLayout,
    settle_duration: Duration,
    clamp_pinch_to_media: bool,
    live: CropRect,
    committed: CropRect,
    session: Option<GestureSession>,
    state: ControllerState,
    generation: u64,
}

impl CropController {
    /// Creates a controller over `media`, displayed in a container of
    /// `container` screen pixels. `initial` is the previously stored crop, if
    /// any; it is solved before use.
    pub fn new(
        media: ProjectedMedia,
        aspect_ratio: f64,
        container: Size,
        config: &Config,
        initial: Option<CropRect>,
    ) -> Result<Self> {
        let layout = DisplayLayout::new(container, aspect_ratio)?;
        let committed = solve_crop(initial, aspect_ratio, media.width, media.height, &media.quad)?;
        Ok(Self {
            media,
            aspect_ratio,
            layout,
            settle_duration: config.settle_duration,
            clamp_pinch_to_media: config.clamp_pinch_to_media,
            live: committed,
            committed,
            session: None,
            state: ControllerState::Idle,
            generation: 0,
        })
    }

    /// The crop as currently displayed, possibly mid-gesture or mid-settle.
    pub fn live(&self) -> CropRect {
        self.live
    }

    /// The last settled crop.
    pub fn committed(&self) -> CropRect {
        self.committed
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn layout(&self) -> &DisplayLayout {
        &self.layout
    }

    pub fn media(&self) -> &ProjectedMedia {
        &self.media
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Starts a gesture from the live crop. A settle still in progress is
    /// superseded: its late completions will be ignored.
    pub fn begin_gesture(&mut self, kind: GestureKind) -> Result<GestureSession> {
        match self.state {
            ControllerState::Active(active) => {
                return Err(CropError::gesture(format!(
                    "cannot start {:?} while {:?} is active",
                    kind, active
                )));
            }
            ControllerState::Settling { generation, .. } => {
                debug!("{:?} gesture supersedes settle generation {}", kind, generation);
            }
            ControllerState::Idle => {}
        }

        let session = begin_gesture(kind, self.live);
        self.session = Some(session);
        self.state = ControllerState::Active(kind);
        Ok(session)
    }

    pub fn pan(&mut self, translation: Point) -> Result<CropRect> {
        let session = self.active_session(GestureKind::Pan)?;
        self.live = update_pan(
            &session,
            translation,
            self.media.size(),
            self.layout.displayed,
            self.aspect_ratio,
        )?;
        trace!("pan {:?} -> {:?}", translation, self.live);
        Ok(self.live)
    }

    pub fn pinch(&mut self, scale: f64) -> Result<CropRect> {
        let session = self.active_session(GestureKind::Pinch)?;
        self.live = update_pinch(&session, scale, self.media.size(), self.clamp_pinch_to_media)?;
        trace!("pinch {} -> {:?}", scale, self.live);
        Ok(self.live)
    }

    /// Ends the active gesture and computes the settled crop.
    pub fn end_gesture(&mut self) -> Result<SettleOutcome> {
        if !matches!(self.state, ControllerState::Active(_)) {
            return Err(CropError::gesture("no active gesture to end"));
        }
        self.session = None;

        let target = end_gesture(
            self.live,
            self.aspect_ratio,
            self.media.width,
            self.media.height,
            &self.media.quad,
        )?;
        self.generation += 1;
        let generation = self.generation;

        let transitions: Vec<Transition> = CropProperty::ALL
            .into_iter()
            .filter(|property| property.get(&self.live) != property.get(&target))
            .map(|property| Transition {
                generation,
                property,
                from: property.get(&self.live),
                to: property.get(&target),
                duration: self.settle_duration,
                easing: Easing::EaseOut,
            })
            .collect();

        if transitions.is_empty() {
            self.finish_settle(target);
            return Ok(SettleOutcome::Settled(CropDataChange { rect: target }));
        }

        debug!(
            "settle generation {}: {} transition(s) toward {:?}",
            generation,
            transitions.len(),
            target
        );
        self.state = ControllerState::Settling {
            generation,
            target,
            pending: transitions.iter().map(|t| t.property).collect(),
        };
        Ok(SettleOutcome::Animating {
            generation,
            target,
            transitions,
        })
    }

    /// Writes an interpolated value from the animation driver into the live
    /// crop. Returns `false` when the value belongs to a superseded settle.
    pub fn apply_animated_value(&mut self, generation: u64, property: CropProperty, value: f64) -> bool {
        match &self.state {
            ControllerState::Settling {
                generation: current,
                pending,
                ..
            } if *current == generation && pending.contains(&property) => {
                property.set(&mut self.live, value);
                true
            }
            _ => false,
        }
    }

    /// Reports that the driver finished animating `property`.
    ///
    /// Returns the single [`CropDataChange`] once every transition of the
    /// settle has completed, in whatever order they arrive. Completions from
    /// a superseded settle, or repeated completions, return `None`.
    pub fn transition_finished(
        &mut self,
        generation: u64,
        property: CropProperty,
    ) -> Option<CropDataChange> {
        let ControllerState::Settling {
            generation: current,
            target,
            pending,
        } = &mut self.state
        else {
            debug!("ignoring {:?} completion outside of a settle", property);
            return None;
        };

        if *current != generation {
            debug!(
                "ignoring {:?} completion from generation {} (current {})",
                property, generation, current
            );
            return None;
        }

        let Some(index) = pending.iter().position(|p| *p == property) else {
            warn!("{:?} completed twice in generation {}", property, generation);
            return None;
        };

        pending.remove(index);
        let target = *target;
        property.set(&mut self.live, property.get(&target));

        if pending.is_empty() {
            self.finish_settle(target);
            Some(CropDataChange { rect: target })
        } else {
            None
        }
    }

    /// Replaces the projected media (new orientation or rotation) and
    /// re-solves the settled crop against it. Any gesture or settle in
    /// progress is dropped. Returns a change when the crop moved.
    pub fn update_media(&mut self, media: ProjectedMedia) -> Result<Option<CropDataChange>> {
        let solved = solve_crop(
            Some(self.committed),
            self.aspect_ratio,
            media.width,
            media.height,
            &media.quad,
        )?;
        self.media = media;
        Ok(self.reset_to(solved))
    }

    /// Changes the target aspect ratio and re-solves the settled crop.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) -> Result<Option<CropDataChange>> {
        let layout = DisplayLayout::new(self.layout.container, aspect_ratio)?;
        let solved = solve_crop(
            Some(self.committed),
            aspect_ratio,
            self.media.width,
            self.media.height,
            &self.media.quad,
        )?;
        self.aspect_ratio = aspect_ratio;
        self.layout = layout;
        Ok(self.reset_to(solved))
    }

    /// Records a new container size after a layout pass.
    pub fn set_container_size(&mut self, container: Size) -> Result<()> {
        self.layout = DisplayLayout::new(container, self.aspect_ratio)?;
        Ok(())
    }

    fn active_session(&self, kind: GestureKind) -> Result<GestureSession> {
        match (&self.state, self.session) {
            (ControllerState::Active(active), Some(session)) if *active == kind => Ok(session),
            (state, _) => Err(CropError::gesture(format!(
                "{:?} update received in state {:?}",
                kind, state
            ))),
        }
    }

    fn finish_settle(&mut self, target: CropRect) {
        self.live = target;
        self.committed = target;
        self.state = ControllerState::Idle;
    }

    fn reset_to(&mut self, solved: CropRect) -> Option<CropDataChange> {
        if !matches!(self.state, ControllerState::Idle) {
            // Bump so stragglers from the dropped settle are ignored.
            self.generation += 1;
        }
        self.session = None;
        self.state = ControllerState::Idle;
        self.live = solved;
        let changed = solved != self.committed;
        self.committed = solved;
        changed.then_some(CropDataChange { rect: solved })
    }
}
