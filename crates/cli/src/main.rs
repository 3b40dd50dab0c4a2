use std::path::PathBuf;
use std::process;

use clap::Parser;

use mot_core::config::settings::PersistedConfig;
use mot_core::pipeline::track_pipeline::Pipeline;
use mot_core::shared::frame::Image;
use mot_core::tracking::domain::bounding_box::BoundingBox;
use mot_core::tracking::domain::detector::{Detect, DetectionCandidate};
use mot_core::tracking::domain::feature_extractor::Extract;
use mot_core::tracking::domain::labeled_frame::LabeledFrame;
use mot_core::tracking::infrastructure::image_dir_source::ImageDirSource;

/// Drives the tracking pipeline over a directory of images.
#[derive(Parser)]
#[command(name = "mot")]
struct Cli {
    /// Directory of sorted image frames to track over.
    input: PathBuf,

    /// YAML config file (`engine`/`recorder`/`visualizer` groups). Falls
    /// back to the platform config directory, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Informational frame rate reported by the demo frame source.
    #[arg(long, default_value = "30.0")]
    sample_fps: f64,

    /// Print every emitted object instead of just the per-frame count.
    #[arg(long)]
    verbose: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let persisted = load_config(&cli.config)?;
    persisted.engine.validate()?;

    let source = Box::new(ImageDirSource::open(&cli.input, cli.sample_fps)?);
    let detector = Box::new(CenterBoxDetector);
    let extractor = Box::new(MeanColorExtractor);

    let mut pipeline = Pipeline::new(source, detector, extractor, &persisted.engine)?;

    let mut out = LabeledFrame::default();
    let mut frames_processed = 0u64;
    let mut objects_emitted = 0u64;
    while pipeline.next(&mut out)? {
        frames_processed += 1;
        objects_emitted += out.objects.len() as u64;
        if cli.verbose {
            for obj in &out.objects {
                println!(
                    "frame {} id={} bbox=({},{},{},{}) class={} score={:.2}",
                    out.frame_index, obj.id, obj.x, obj.y, obj.w, obj.h, obj.class_id, obj.score
                );
            }
        } else {
            println!("frame {}: {} objects", out.frame_index, out.objects.len());
        }
    }

    log::info!("processed {frames_processed} frames, emitted {objects_emitted} objects total");
    Ok(())
}

fn load_config(path: &Option<PathBuf>) -> std::result::Result<PersistedConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(PersistedConfig::load_from(p)?),
        None => Ok(PersistedConfig::load()),
    }
}

fn validate(cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input.display()).into());
    }
    if cli.sample_fps <= 0.0 {
        return Err(format!("sample-fps must be positive, got {}", cli.sample_fps).into());
    }
    Ok(())
}

/// Stand-in detector for the demo binary: always reports one box
/// covering the central half of the frame. A real adapter (ONNX,
/// TensorRT, ...) implements `Detect` the same way outside this crate.
struct CenterBoxDetector;

impl Detect for CenterBoxDetector {
    fn detect(
        &mut self,
        image: &Image,
        _frame_index: u64,
    ) -> std::result::Result<Vec<DetectionCandidate>, Box<dyn std::error::Error + Send + Sync>> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let bbox = BoundingBox::new(w * 0.25, h * 0.25, w * 0.5, h * 0.5);
        Ok(vec![DetectionCandidate::new(bbox, 0, 1.0)])
    }
}

/// Stand-in extractor for the demo binary: reduces a patch to its
/// per-channel mean byte value, giving a deterministic, cheap
/// appearance signature with no model dependency.
struct MeanColorExtractor;

impl Extract for MeanColorExtractor {
    fn extract(&mut self, patch: &Image) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let channels = patch.channels() as usize;
        if channels == 0 {
            return Ok(vec![1.0]);
        }
        let mut sums = vec![0f64; channels];
        let mut count = 0usize;
        for pixel in patch.data().chunks_exact(channels) {
            for (c, &byte) in pixel.iter().enumerate() {
                sums[c] += byte as f64;
            }
            count += 1;
        }
        if count == 0 {
            return Ok(vec![1.0; channels]);
        }
        Ok(sums.into_iter().map(|s| (s / count as f64) as f32).collect())
    }
}
