use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use quadcrop_core::{
    config::parse_ratio, edition::ROLL_RANGE, init, CropEngine, CropRect, EditionParameters,
    GestureKind, Orientation, Point, ProjectedMedia, SettleOutcome, Size,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

/// Interval used to step settle animations when simulating a gesture.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the projected quad and bounding size of rotated media
    Project {
        #[command(flatten)]
        media: MediaArgs,
    },
    /// Solve a crop of the given aspect ratio inside the projected media
    Solve {
        #[command(flatten)]
        media: MediaArgs,

        #[command(flatten)]
        crop: CropArgs,
    },
    /// Simulate one pan or pinch gesture and its settle animation
    Gesture {
        #[command(flatten)]
        media: MediaArgs,

        #[command(flatten)]
        crop: CropArgs,

        /// Size of the crop container on screen, as WIDTHxHEIGHT
        #[arg(long, default_value = "400x400", value_parser = parse_size)]
        container: Size,

        /// Pan translation in screen pixels, as DX,DY
        #[arg(long, value_parser = parse_point, conflicts_with = "pinch", allow_hyphen_values = true)]
        pan: Option<Point>,

        /// Pinch scale (> 1 zooms in)
        #[arg(long)]
        pinch: Option<f64>,

        /// Settle animation duration in milliseconds (defaults to QUADCROP_SETTLE_MS)
        #[arg(long)]
        settle_ms: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct MediaArgs {
    /// Media width in pixels
    #[arg(long)]
    width: Option<f64>,

    /// Media height in pixels
    #[arg(long)]
    height: Option<f64>,

    /// Read the media size from an image file instead of --width/--height
    #[arg(long, conflicts_with_all = ["width", "height"])]
    image: Option<PathBuf>,

    /// Edition parameters JSON (orientation, yaw, pitch, roll, cropData)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Override the base orientation (UP, LEFT, RIGHT_MIRRORED, ...)
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Override yaw, in degrees
    #[arg(long, allow_hyphen_values = true)]
    yaw: Option<f64>,

    /// Override pitch, in degrees
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<f64>,

    /// Override roll, in degrees
    #[arg(long, allow_hyphen_values = true)]
    roll: Option<f64>,
}

#[derive(Args, Debug)]
struct CropArgs {
    /// Target aspect ratio, as a number or W:H (defaults to QUADCROP_ASPECT_RATIO)
    #[arg(long, value_parser = parse_aspect_ratio)]
    ratio: Option<f64>,

    /// Starting crop as X,Y,WIDTH,HEIGHT (overrides cropData from --params)
    #[arg(long, value_parser = parse_crop, allow_hyphen_values = true)]
    crop: Option<CropRect>,
}

fn main() -> Result<()> {
    // Setup
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut engine = CropEngine::new().context("Failed to load configuration")?;

    match cli.command {
        Command::Project { media } => {
            let (size, params) = media.resolve()?;
            let projected = engine.project(size, &params)?;
            print_json(&json!(projected))?;
        }
        Command::Solve { media, crop } => {
            let (size, params) = media.resolve()?;
            let projected = engine.project(size, &params)?;
            let ratio = crop.ratio.unwrap_or(engine.config().aspect_ratio);
            let candidate = crop.crop.or(params.crop_data);

            let solved = engine.solve(&projected, candidate, ratio)?;
            info!("solved {:?} -> {:?}", candidate, solved);
            print_json(&json!({
                "media": { "width": projected.width, "height": projected.height },
                "cropData": solved,
            }))?;
        }
        Command::Gesture {
            media,
            crop,
            container,
            pan,
            pinch,
            settle_ms,
        } => {
            if let Some(ms) = settle_ms {
                engine.config_mut().settle_duration = Duration::from_millis(ms);
            }
            let (size, params) = media.resolve()?;
            let projected = engine.project(size, &params)?;
            let ratio = crop.ratio.unwrap_or(engine.config().aspect_ratio);
            let initial = crop.crop.or(params.crop_data);
            simulate_gesture(&engine, projected, ratio, container, initial, pan, pinch)?;
        }
    }

    Ok(())
}

impl MediaArgs {
    /// Works out the raw media size and the effective edition parameters.
    fn resolve(&self) -> Result<(Size, EditionParameters)> {
        let mut params = match &self.params {
            Some(path) => EditionParameters::from_file(path)
                .with_context(|| format!("Failed to load edition parameters from {}", path.display()))?,
            None => EditionParameters::default(),
        };

        if let Some(orientation) = self.orientation {
            params.orientation = Some(orientation);
        }
        params.yaw = self.yaw.or(params.yaw);
        params.pitch = self.pitch.or(params.pitch);
        params.roll = self.roll.or(params.roll).map(|roll| {
            if !ROLL_RANGE.contains(roll) {
                warn!(
                    "roll {} is outside the editor range {}..={}, clamping",
                    roll, ROLL_RANGE.min, ROLL_RANGE.max
                );
            }
            ROLL_RANGE.clamp(roll)
        });

        let size = match (&self.image, self.width, self.height) {
            (Some(path), _, _) => {
                let (width, height) = image::image_dimensions(path)
                    .with_context(|| format!("Failed to read image size of {}", path.display()))?;
                debug!("{} is {}x{}", path.display(), width, height);
                Size::new(width as f64, height as f64)
            }
            (None, Some(width), Some(height)) => Size::new(width, height),
            _ => bail!("Provide either --image or both --width and --height"),
        };

        Ok((size, params))
    }
}

fn simulate_gesture(
    engine: &CropEngine,
    media: ProjectedMedia,
    ratio: f64,
    container: Size,
    initial: Option<CropRect>,
    pan: Option<Point>,
    pinch: Option<f64>,
) -> Result<()> {
    let mut controller = engine.controller(media, ratio, container, initial)?;
    let start = controller.committed();

    let live = match (pan, pinch) {
        (Some(translation), None) => {
            controller.begin_gesture(GestureKind::Pan)?;
            controller.pan(translation)?
        }
        (None, Some(scale)) => {
            controller.begin_gesture(GestureKind::Pinch)?;
            controller.pinch(scale)?
        }
        _ => bail!("Provide exactly one of --pan or --pinch"),
    };

    let mut frames = 0usize;
    let mut transitions_report = Vec::new();
    let notification = match controller.end_gesture()? {
        SettleOutcome::Settled(change) => Some(change),
        SettleOutcome::Animating {
            generation,
            transitions,
            ..
        } => {
            for t in &transitions {
                transitions_report.push(json!({
                    "property": format!("{:?}", t.property),
                    "from": t.from,
                    "to": t.to,
                    "durationMs": t.duration.as_millis() as u64,
                }));
            }

            let mut elapsed = Duration::ZERO;
            let mut notification = None;
            let mut finished = vec![false; transitions.len()];
            while finished.iter().any(|done| !done) {
                elapsed += FRAME_INTERVAL;
                frames += 1;
                for (t, done) in transitions.iter().zip(finished.iter_mut()) {
                    if *done {
                        continue;
                    }
                    controller.apply_animated_value(generation, t.property, t.value_at(elapsed));
                    if t.is_finished(elapsed) {
                        *done = true;
                        if let Some(change) = controller.transition_finished(generation, t.property) {
                            notification = Some(change);
                        }
                    }
                }
            }
            notification
        }
    };

    let Some(change) = notification else {
        bail!("Settle finished without a crop notification");
    };

    print_json(&json!({
        "start": start,
        "live": live,
        "transitions": transitions_report,
        "frames": frames,
        "cropData": change.rect,
    }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_numbers<const N: usize>(raw: &str) -> Result<[f64; N], String> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", raw, e))?;
    values
        .try_into()
        .map_err(|_| format!("expected {} comma-separated numbers, got '{}'", N, raw))
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(raw)?;
    Ok(Point::new(x, y))
}

fn parse_crop(raw: &str) -> Result<CropRect, String> {
    let [x, y, width, height] = parse_numbers::<4>(raw)?;
    Ok(CropRect::new(x, y, width, height))
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", raw))?;
    let width = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Size::new(width, height))
}

fn parse_aspect_ratio(raw: &str) -> Result<f64, String> {
    parse_ratio(raw).ok_or_else(|| format!("invalid aspect ratio '{}'", raw))
}
