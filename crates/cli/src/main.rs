use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facelens_core::detection::domain::detector_options::{DetectorOptions, DetectorVariant};
use facelens_core::detection::infrastructure::detector_factory::{create_detector, ExpressionModel};
use facelens_core::overlay::domain::overlay_renderer::OverlayRenderer;
use facelens_core::overlay::domain::overlay_style::OverlayStyle;
use facelens_core::overlay::infrastructure::raster_surface::RasterSurface;
use facelens_core::playback::domain::video_source::VideoSource;
use facelens_core::playback::frame_loop::{LoopExit, LoopParts, Pacing};
use facelens_core::playback::frame_loop_logger::SummaryFrameLoopLogger;
use facelens_core::playback::infrastructure::annotating_sink::AnnotatingSink;
use facelens_core::playback::player_session::PlayerSession;
use facelens_core::shared::constants::{DEFAULT_DISPLAY_SIZE, VIDEO_EXTENSIONS};
use facelens_core::shared::dimensions::Dimensions;
use facelens_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facelens_core::video::infrastructure::png_sequence_writer::PngSequenceWriter;

/// Plays a video through face detection and writes the annotated result.
#[derive(Parser)]
#[command(name = "facelens")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Write each annotated frame as a PNG into this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write detections as JSON lines (one object per frame) to this file.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Face detector: yolo or blazeface.
    #[arg(long, default_value = "yolo")]
    model_variant: DetectorVariant,

    /// Face detection model file (required for blazeface).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Expression model file (defaults to the downloaded FER+ model).
    #[arg(long)]
    expression_model: Option<PathBuf>,

    /// Skip expression classification.
    #[arg(long)]
    no_expressions: bool,

    /// TrueType font for overlay labels (labels become score bars without one).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Side of the square box the video is fitted into.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_SIZE)]
    display_size: u32,

    /// Pace playback at the video's frame rate, skipping frames when
    /// detection falls behind.
    #[arg(long)]
    realtime: bool,

    /// Thicker, high-contrast overlay.
    #[arg(long)]
    high_contrast: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let options = DetectorOptions {
        variant: cli.model_variant,
        score_threshold: cli.confidence,
        model_path: cli.model.clone(),
        ..DetectorOptions::default()
    };
    let detector = create_detector(
        &options,
        &expression_model(&cli),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let parts = LoopParts {
        source: VideoSource::new(
            Box::new(FfmpegReader::new()),
            Dimensions::new(cli.display_size, cli.display_size),
        ),
        detector: Box::new(detector),
        sink: Box::new(build_sink(&cli)?),
        logger: Box::new(SummaryFrameLoopLogger::default()),
    };
    let pacing = if cli.realtime {
        Pacing::RealTime
    } else {
        Pacing::Unpaced
    };

    let mut session = PlayerSession::new(parts, pacing);
    session.select_file(&cli.input)?;
    session.toggle_play_pause()?;

    match session.wait()? {
        Some(LoopExit::Failed(reason)) => Err(reason.into()),
        Some(exit) => {
            log::info!("Playback finished ({exit:?})");
            if let Some(dir) = &cli.output_dir {
                log::info!("Annotated frames written to {}", dir.display());
            }
            Ok(())
        }
        None => Ok(()),
    }
}

fn build_sink(cli: &Cli) -> Result<AnnotatingSink, Box<dyn std::error::Error>> {
    let style = if cli.high_contrast {
        OverlayStyle::high_contrast()
    } else {
        OverlayStyle::default()
    };

    let mut surface = RasterSurface::new(Dimensions::new(0, 0));
    if let Some(path) = &cli.font {
        surface = surface.with_font(RasterSurface::load_font(path)?);
    }

    let mut sink = AnnotatingSink::new(surface, OverlayRenderer::new(style));
    if let Some(dir) = &cli.output_dir {
        sink = sink.with_frame_writer(Box::new(PngSequenceWriter::new(dir)?));
    }
    if let Some(path) = &cli.detections {
        let file = File::create(path)
            .map_err(|e| format!("Cannot create {}: {e}", path.display()))?;
        sink = sink.with_detection_log(Box::new(BufWriter::new(file)));
    }
    Ok(sink)
}

fn expression_model(cli: &Cli) -> ExpressionModel {
    if cli.no_expressions {
        ExpressionModel::Disabled
    } else if let Some(path) = &cli.expression_model {
        ExpressionModel::Path(path.clone())
    } else {
        ExpressionModel::Default
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_video(&cli.input) {
        log::warn!(
            "{} does not have a known video extension ({}); trying anyway",
            cli.input.display(),
            VIDEO_EXTENSIONS.join(", ")
        );
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.display_size == 0 {
        return Err("Display size must be positive".into());
    }
    if cli.no_expressions && cli.expression_model.is_some() {
        return Err("--no-expressions and --expression-model are mutually exclusive".into());
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(format!("Font file not found: {}", font.display()).into());
        }
    }
    Ok(())
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
