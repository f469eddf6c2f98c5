use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use face_anonymizer_core::detection::infrastructure::model_source::ModelSource;
use face_anonymizer_core::detection::infrastructure::msr_face_detector::{
    build_msr_detector, DetectorConfig, DEFAULT_NMS_THRESHOLD, DEFAULT_SCORE_THRESHOLD,
    DEFAULT_TOP_K,
};
use face_anonymizer_core::diagnostics::pixel_dump::{dump_pixels, dump_subpicture, parse_pixel_dump};
use face_anonymizer_core::image_io::domain::image_writer::ImageWriter;
use face_anonymizer_core::image_io::infrastructure::image_file_reader::ImageFileReader;
use face_anonymizer_core::image_io::infrastructure::image_file_writer::ImageFileWriter;
use face_anonymizer_core::pipeline::anonymize_image_use_case::AnonymizeImageUseCase;
use face_anonymizer_core::pipeline::anonymizer::Anonymizer;
use face_anonymizer_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use face_anonymizer_core::shared::constants::{DEFAULT_TASK_WAIT_MS, IMAGE_EXTENSIONS};
use face_anonymizer_core::shared::frame::Frame;
use face_anonymizer_core::shared::region::Region;
use face_anonymizer_core::transform::infrastructure::transform_factory::{
    create_transform, TransformKind,
};

/// Detects faces in images and anonymizes them.
#[derive(Parser)]
#[command(name = "face-anonymizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect faces in an image and black out, blur or pixelate them.
    Anonymize(AnonymizeArgs),
    /// Rebuild an image from a pixel dump captured in a log.
    DecodeDump(DecodeDumpArgs),
}

#[derive(clap::Args)]
struct AnonymizeArgs {
    /// Input image file.
    input: PathBuf,

    /// Output image file (format from extension).
    output: PathBuf,

    /// Anonymization method: black, blur or pixelate.
    #[arg(long, default_value_t = TransformKind::Pixelate)]
    method: TransformKind,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_SCORE_THRESHOLD)]
    confidence: f32,

    /// IoU above which overlapping detections are merged (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_NMS_THRESHOLD)]
    nms_threshold: f32,

    /// Maximum number of faces to anonymize.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Detection model file (default: the bundled model).
    #[arg(long, conflicts_with = "model_url")]
    model: Option<PathBuf>,

    /// Download the model from this URL into the user cache if not present.
    #[arg(long)]
    model_url: Option<String>,

    /// Feed RGB to the model instead of BGR.
    #[arg(long)]
    no_rgb_swap: bool,

    /// Milliseconds to wait for detection before reporting it as slow.
    #[arg(long, default_value_t = DEFAULT_TASK_WAIT_MS)]
    wait_ms: u64,

    /// Print a hex dump of the whole anonymized image to stdout.
    #[arg(long)]
    dump_pixels: bool,

    /// Print a hex dump of a sub-rectangle to stdout: x1,y1,x2,y2.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    dump_region: Option<Vec<i32>>,
}

#[derive(clap::Args)]
struct DecodeDumpArgs {
    /// Log file containing a ===PIXELS_START=== / ===PIXELS_END=== block.
    log: PathBuf,

    /// Output image file.
    output: PathBuf,

    /// Image width in pixels.
    #[arg(long)]
    width: u32,

    /// Image height in pixels.
    #[arg(long)]
    height: u32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Anonymize(args) => run_anonymize(args),
        Command::DecodeDump(args) => run_decode_dump(args),
    }
}

fn run_anonymize(args: AnonymizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate(&args)?;

    let config = detector_config(&args);
    let source = model_source(&args);
    let detector = build_msr_detector(&config, &source)?;
    let anonymizer = Anonymizer::new(create_transform(args.method));

    let mut use_case = AnonymizeImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(detector),
        anonymizer,
        Box::new(StdoutPipelineLogger::new()),
    )
    .with_wait(Duration::from_millis(args.wait_ms));

    let report = use_case.execute(&args.input, &args.output)?;
    log::info!(
        "Anonymized {} face(s), output written to {}",
        report.detections.len(),
        args.output.display()
    );

    write_dumps(&mut io::stdout().lock(), &args, &report.frame)?;

    use_case.logger().summary();
    Ok(())
}

/// Writes the dumps requested by `--dump-pixels` / `--dump-region`.
fn write_dumps(out: &mut impl Write, args: &AnonymizeArgs, frame: &Frame) -> io::Result<()> {
    if args.dump_pixels {
        writeln!(out)?;
        out.write_all(dump_pixels(frame).as_bytes())?;
    }
    if let Some(coords) = &args.dump_region {
        let region = Region::new(coords[0], coords[1], coords[2], coords[3]);
        writeln!(out)?;
        out.write_all(dump_subpicture(frame, &region).as_bytes())?;
    }
    out.flush()
}

fn run_decode_dump(args: DecodeDumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.log)
        .map_err(|e| format!("Cannot read {}: {e}", args.log.display()))?;
    let frame = parse_pixel_dump(&text, args.width, args.height)?;
    ImageFileWriter::new().write(&args.output, &frame)?;
    log::info!(
        "Decoded {}x{} image to {}",
        args.width,
        args.height,
        args.output.display()
    );
    Ok(())
}

fn detector_config(args: &AnonymizeArgs) -> DetectorConfig {
    let mut config = DetectorConfig {
        score_threshold: args.confidence,
        nms_threshold: args.nms_threshold,
        top_k: args.top_k,
        ..Default::default()
    };
    config.preprocess.rgb_swap = !args.no_rgb_swap;
    config
}

fn model_source(args: &AnonymizeArgs) -> ModelSource {
    match (&args.model, &args.model_url) {
        (Some(path), _) => ModelSource::File(path.clone()),
        (None, Some(url)) => ModelSource::Cached { url: url.clone() },
        (None, None) => ModelSource::default(),
    }
}

fn validate(args: &AnonymizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }
    if !is_image(&args.input) {
        return Err(format!(
            "Unsupported input format: {} (expected one of {})",
            args.input.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    if !is_image(&args.output) {
        return Err(format!(
            "Unsupported output format: {}",
            args.output.display()
        )
        .into());
    }
    if let Some(coords) = &args.dump_region {
        if coords.len() != 4 {
            return Err("--dump-region expects x1,y1,x2,y2".into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
