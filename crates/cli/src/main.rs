use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use watermark_blur_core::blurring::infrastructure::blurrer_factory::{create_blurrer, BlurMode};
use watermark_blur_core::geometry::domain::region_geometry::RegionLayout;
use watermark_blur_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use watermark_blur_core::pipeline::remove_watermark_use_case::RemoveWatermarkUseCase;
use watermark_blur_core::scheduling::domain::position_schedule::PositionSchedule;
use watermark_blur_core::shared::constants::{
    DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, DEFAULT_CYCLE_INTERVAL_SECS,
};
use watermark_blur_core::shared::error::WatermarkError;
use watermark_blur_core::shared::video_metadata::VideoMetadata;
use watermark_blur_core::shared::watermark_config::WatermarkConfig;
use watermark_blur_core::video::infrastructure::ffmpeg_audio_remuxer::FfmpegAudioRemuxer;
use watermark_blur_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use watermark_blur_core::video::infrastructure::ffmpeg_writer::{FfmpegWriter, DEFAULT_CRF};

/// Blurs a watermark that cycles between three fixed positions out of a video.
#[derive(Parser)]
#[command(name = "watermark-blur", version)]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output file (required unless --info is used).
    output: Option<PathBuf>,

    /// Gaussian blur kernel size (positive, odd).
    #[arg(
        short = 'b',
        long,
        default_value_t = DEFAULT_BLUR_KERNEL_SIZE as i64,
        allow_negative_numbers = true
    )]
    blur_intensity: i64,

    /// Only process the first SECONDS of the input.
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true)]
    preview: Option<f64>,

    /// Blur mode: standard or edge-aware.
    #[arg(long, default_value = "standard")]
    mode: String,

    /// Shorthand for --mode edge-aware.
    #[arg(short, long)]
    advanced: bool,

    /// Watermark box width in pixels.
    #[arg(long, default_value_t = DEFAULT_BOX_WIDTH as i64, allow_negative_numbers = true)]
    box_width: i64,

    /// Watermark box height in pixels.
    #[arg(long, default_value_t = DEFAULT_BOX_HEIGHT as i64, allow_negative_numbers = true)]
    box_height: i64,

    /// Seconds the watermark stays at one position.
    #[arg(long, default_value_t = DEFAULT_CYCLE_INTERVAL_SECS, allow_negative_numbers = true)]
    cycle_interval: f64,

    /// Position schedule: interval (time based) or frame-pattern (66/80/81 frames).
    #[arg(long, default_value = "interval")]
    schedule: String,

    /// JSON file overriding the region margins.
    #[arg(long, value_name = "JSON")]
    layout: Option<PathBuf>,

    /// H.264 CRF quality (0=lossless, 51=worst, default 18).
    #[arg(long)]
    quality: Option<u32>,

    /// Threads used for blurring.
    #[arg(long, default_value_t = default_workers())]
    workers: usize,

    /// Print video information and exit.
    #[arg(short, long)]
    info: bool,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        let watermark_error = e.downcast_ref::<WatermarkError>();
        if let Some(WatermarkError::Remux {
            video_only: Some(path),
            ..
        }) = watermark_error
        {
            eprintln!(
                "Video processing succeeded; the output without audio was kept at {}",
                path.display()
            );
        }
        let code = match watermark_error {
            Some(err) if err.is_config() => 2,
            _ => 1,
        };
        process::exit(code);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.info {
        let metadata = probe(&cli.input)?;
        print_info(&cli.input, &metadata, &schedule(&cli)?);
        return Ok(());
    }

    let output = cli
        .output
        .as_deref()
        .ok_or_else(|| WatermarkError::Config("output file is required".into()))?;
    let mode = blur_mode(&cli)?;
    let config = build_config(&cli)?;

    let metadata = probe(&cli.input)?;
    metadata.validate()?;
    print_summary(&cli, output, &metadata, mode, &config);

    let writer = FfmpegWriter::new().with_crf(cli.quality.unwrap_or(DEFAULT_CRF));
    let blurrer = create_blurrer(mode, config.blur_kernel_size());

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            eprint!("\rProcessing frame {current}/{total} ({pct:.1}%)");
        } else {
            eprint!("\rProcessing frame {current}");
        }
        true
    });

    let mut use_case = RemoveWatermarkUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(writer),
        blurrer,
        Box::new(FfmpegAudioRemuxer::new()),
        Box::new(ThreadedPipelineExecutor::new()),
        config,
    )
    .with_workers(cli.workers)
    .with_progress(progress);
    if let Some(seconds) = cli.preview {
        use_case = use_case.with_preview(seconds)?;
    }

    let result = use_case.execute(&cli.input, output);
    eprintln!();
    let report = result?;

    println!(
        "Done: {} frames written to {}",
        report.frames_written,
        output.display()
    );
    Ok(())
}

fn probe(input: &Path) -> Result<VideoMetadata, WatermarkError> {
    FfmpegReader::probe(input)
        .map_err(|e| WatermarkError::resource(&format!("Failed to open {}", input.display()), e))
}

fn validate(cli: &Cli) -> Result<(), WatermarkError> {
    if !cli.input.exists() {
        return Err(WatermarkError::Config(format!(
            "input file not found: {}",
            cli.input.display()
        )));
    }
    if !cli.info && cli.output.is_none() {
        return Err(WatermarkError::Config(
            "output file is required unless --info is used".into(),
        ));
    }
    if let Some(q) = cli.quality {
        if q > 51 {
            return Err(WatermarkError::Config(format!(
                "quality must be between 0 and 51, got {q}"
            )));
        }
    }
    if let Some(seconds) = cli.preview {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(WatermarkError::Config(format!(
                "preview must be a positive number of seconds, got {seconds}"
            )));
        }
    }
    if cli.workers == 0 {
        return Err(WatermarkError::Config("workers must be at least 1".into()));
    }
    Ok(())
}

fn blur_mode(cli: &Cli) -> Result<BlurMode, WatermarkError> {
    if cli.advanced {
        return Ok(BlurMode::EdgeAware);
    }
    cli.mode.parse().map_err(WatermarkError::Config)
}

fn schedule(cli: &Cli) -> Result<PositionSchedule, WatermarkError> {
    match cli.schedule.as_str() {
        "interval" => Ok(PositionSchedule::interval(cli.cycle_interval)),
        "frame-pattern" => Ok(PositionSchedule::frame_pattern()),
        other => Err(WatermarkError::Config(format!(
            "schedule must be 'interval' or 'frame-pattern', got '{other}'"
        ))),
    }
}

/// Validates every numeric option before any frame is read.
fn build_config(cli: &Cli) -> Result<WatermarkConfig, WatermarkError> {
    let mut config = WatermarkConfig::new(
        cli.box_width,
        cli.box_height,
        cli.blur_intensity,
        cli.cycle_interval,
    )?
    .with_schedule(schedule(cli)?)?;

    if let Some(path) = &cli.layout {
        config = config.with_layout(RegionLayout::from_json_file(path)?);
    }
    Ok(config)
}

fn print_info(input: &Path, metadata: &VideoMetadata, schedule: &PositionSchedule) {
    println!("File:        {}", input.display());
    println!(
        "Resolution:  {}x{} ({})",
        metadata.width,
        metadata.height,
        metadata.orientation()
    );
    println!("Frame rate:  {:.2} fps", metadata.fps);
    println!("Duration:    {:.2} s", metadata.duration_secs());
    println!("Frames:      {}", metadata.total_frames);
    println!("Codec:       {}", metadata.codec);
    println!("Watermark:   moves {}", schedule.describe());
}

fn print_summary(
    cli: &Cli,
    output: &Path,
    metadata: &VideoMetadata,
    mode: BlurMode,
    config: &WatermarkConfig,
) {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.display().to_string())
    };
    eprintln!("Input:       {}", name(&cli.input));
    eprintln!("Output:      {}", name(output));
    eprintln!(
        "Resolution:  {}x{} @ {:.2} fps",
        metadata.width, metadata.height, metadata.fps
    );
    eprintln!("Duration:    {:.2} s", metadata.duration_secs());
    eprintln!("Mode:        {mode}");
    eprintln!("Blur kernel: {}", config.blur_kernel_size());
    eprintln!(
        "Watermark:   {}x{}, moves {}",
        config.box_width(),
        config.box_height(),
        config.schedule().describe()
    );
    if let Some(seconds) = cli.preview {
        eprintln!("Preview:     first {seconds} s");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["watermark-blur"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_build_valid_config() {
        let cli = parse(&["in.mp4", "out.mp4"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config, WatermarkConfig::default());
        assert_eq!(blur_mode(&cli).unwrap(), BlurMode::Standard);
    }

    #[test]
    fn test_even_kernel_is_config_error() {
        let cli = parse(&["in.mp4", "out.mp4", "-b", "50"]);
        assert!(build_config(&cli).unwrap_err().is_config());
    }

    #[test]
    fn test_negative_kernel_is_config_error() {
        let cli = parse(&["in.mp4", "out.mp4", "--blur-intensity", "-3"]);
        assert!(build_config(&cli).unwrap_err().is_config());
    }

    #[test]
    fn test_advanced_flag_selects_edge_aware() {
        let cli = parse(&["in.mp4", "out.mp4", "-a"]);
        assert_eq!(blur_mode(&cli).unwrap(), BlurMode::EdgeAware);

        let cli = parse(&["in.mp4", "out.mp4", "--mode", "edge-aware"]);
        assert_eq!(blur_mode(&cli).unwrap(), BlurMode::EdgeAware);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let cli = parse(&["in.mp4", "out.mp4", "--mode", "sharpen"]);
        assert!(blur_mode(&cli).unwrap_err().is_config());
    }

    #[test]
    fn test_frame_pattern_schedule() {
        let cli = parse(&["in.mp4", "out.mp4", "--schedule", "frame-pattern"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.schedule(), &PositionSchedule::frame_pattern());
    }

    #[test]
    fn test_unknown_schedule_rejected() {
        let cli = parse(&["in.mp4", "out.mp4", "--schedule", "random"]);
        assert!(build_config(&cli).unwrap_err().is_config());
    }

    #[test]
    fn test_output_required_without_info() {
        let input = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        let input_arg = input.path().to_string_lossy().into_owned();

        let cli = parse(&[input_arg.as_str()]);
        assert!(validate(&cli).unwrap_err().is_config());

        let cli = parse(&[input_arg.as_str(), "--info"]);
        assert!(validate(&cli).is_ok());

        let cli = parse(&[input_arg.as_str(), "out.mp4", "--preview", "0"]);
        assert!(validate(&cli).unwrap_err().is_config());

        let cli = parse(&[input_arg.as_str(), "out.mp4", "--quality", "60"]);
        assert!(validate(&cli).unwrap_err().is_config());
    }

    #[test]
    fn test_missing_input_rejected() {
        let cli = parse(&["/nonexistent/in.mp4", "out.mp4"]);
        assert!(validate(&cli).unwrap_err().is_config());
    }
}
