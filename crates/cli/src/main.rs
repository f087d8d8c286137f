use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use facefinder_core::annotation::infrastructure::rectangle_annotator::RectangleAnnotator;
use facefinder_core::detection::domain::detection_params::{DetectionParameters, SharedParameters};
use facefinder_core::detection::domain::face_detector::FaceDetector;
use facefinder_core::detection::infrastructure::rustface_detector::RustfaceDetector;
use facefinder_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facefinder_core::pipeline::frame_pipeline::{FramePipeline, PipelineEvent};
use facefinder_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facefinder_core::settings::settings_store::SettingsStore;
use facefinder_core::shared::constants::{SEETA_MODEL_NAME, SEETA_MODEL_URL};
use facefinder_core::shared::model_resolver;
use facefinder_core::shared::video_source::VideoSource;
use facefinder_core::video::infrastructure::image_file_reader::ImageFileReader;
use facefinder_core::video::infrastructure::image_file_writer::ImageFileWriter;
use facefinder_core::video::infrastructure::reader_factory::reader_for;

/// Face detection for images, cameras and video files.
#[derive(Parser)]
#[command(name = "facefinder")]
struct Cli {
    /// Settings file (defaults to face_detection_settings.json in the working directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect faces in a still image.
    Detect {
        /// Input image file.
        input: PathBuf,

        /// Where to write the annotated image (format from extension).
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Run live detection on a camera index or a video file.
    Watch {
        /// Camera index (e.g. 0) or path to a video file.
        source: String,

        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<usize>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Show or save the persisted detection settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the settings currently in effect.
    Show,
    /// Merge the given values into the settings file.
    Save {
        #[command(flatten)]
        overrides: ParamOverrides,
    },
}

#[derive(Args, Default)]
struct ParamOverrides {
    /// Pyramid step between detection scales (> 1.0).
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Sensitivity; higher keeps fewer, stronger detections.
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Minimum face width and height in pixels.
    #[arg(long)]
    min_size: Option<u32>,
}

impl ParamOverrides {
    fn apply(&self, base: DetectionParameters) -> Result<DetectionParameters, String> {
        let params = DetectionParameters {
            scale_factor: self.scale_factor.unwrap_or(base.scale_factor),
            min_neighbors: self.min_neighbors.unwrap_or(base.min_neighbors),
            min_size: self.min_size.unwrap_or(base.min_size),
        };
        if !params.is_valid() {
            return Err(format!(
                "Scale factor must be greater than 1.0, got {}",
                params.scale_factor
            ));
        }
        Ok(params)
    }
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
    let store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::in_working_dir(),
    };

    match cli.command {
        Command::Detect {
            input,
            output,
            overrides,
        } => {
            let params = overrides.apply(store.load())?;
            run_detect(&input, output.as_deref(), &params)
        }
        Command::Watch {
            source,
            max_frames,
            overrides,
        } => {
            let params = overrides.apply(store.load())?;
            run_watch(VideoSource::parse(&source), max_frames, params)
        }
        Command::Settings { action } => match action {
            SettingsAction::Show => {
                print_params(&store.load());
                Ok(())
            }
            SettingsAction::Save { overrides } => {
                let params = overrides.apply(store.load())?;
                store.save(&params)?;
                print_params(&params);
                Ok(())
            }
        },
    }
}

fn run_detect(
    input: &Path,
    output: Option<&Path>,
    params: &DetectionParameters,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    let use_case = DetectImageUseCase::new(build_detector()?, Arc::new(RectangleAnnotator::default()));
    let result = use_case.execute_file(
        &ImageFileReader::new(),
        &ImageFileWriter::new(),
        input,
        output,
        params,
    )?;

    println!("{} face(s) found", result.faces.len());
    for face in &result.faces {
        println!("  {face}");
    }
    if let Some(path) = output {
        log::info!("Output written to {}", path.display());
    }
    Ok(())
}

fn run_watch(
    source: VideoSource,
    max_frames: Option<usize>,
    params: DetectionParameters,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = FramePipeline::new(build_detector()?, Arc::new(SharedParameters::new(params)))
        .with_logger(|| Box::new(StdoutPipelineLogger::default()));

    let reader = reader_for(&source);
    let events = pipeline.start(source, reader)?;

    let mut frames = 0usize;
    for event in events.iter() {
        match event {
            PipelineEvent::Frame(annotated) => {
                frames += 1;
                log::info!(
                    "Frame {}: {} face(s)",
                    annotated.frame.index(),
                    annotated.faces.len()
                );
                if max_frames.is_some_and(|max| frames >= max) {
                    break;
                }
            }
            PipelineEvent::Ended => break,
        }
    }

    pipeline.stop();
    log::info!("Watched {frames} frames");
    Ok(())
}

fn build_detector() -> Result<Arc<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {SEETA_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        SEETA_MODEL_NAME,
        SEETA_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    Ok(Arc::new(RustfaceDetector::from_path(&model_path)?))
}

fn print_params(params: &DetectionParameters) {
    println!("scale_factor:  {}", params.scale_factor);
    println!("min_neighbors: {}", params.min_neighbors);
    println!("min_size:      {}", params.min_size);
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
