use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::blurring::domain::region_blurrer::RegionBlurrer;
use crate::shared::error::WatermarkError;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::watermark_config::WatermarkConfig;
use crate::video::domain::audio_remuxer::AudioRemuxer;
use crate::video::domain::video_reader::{ClosingReader, VideoReader};
use crate::video::domain::video_writer::VideoWriter;

use super::frame_processor::FrameProcessor;
use super::pipeline_executor::{PipelineConfig, PipelineExecutor};

/// Outcome of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub metadata: VideoMetadata,
    pub frames_written: usize,
    pub frame_limit: Option<usize>,
}

/// Orchestrates a full watermark removal run:
/// probe → blur every frame into a scratch file → remux source audio.
///
/// This is a single-use struct: `execute` consumes the owned reader,
/// writer and blurrer, so calling it twice will fail.
pub struct RemoveWatermarkUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    blurrer: Option<Box<dyn RegionBlurrer>>,
    remuxer: Box<dyn AudioRemuxer>,
    executor: Box<dyn PipelineExecutor>,
    config: WatermarkConfig,
    preview_secs: Option<f64>,
    workers: usize,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl RemoveWatermarkUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        blurrer: Box<dyn RegionBlurrer>,
        remuxer: Box<dyn AudioRemuxer>,
        executor: Box<dyn PipelineExecutor>,
        config: WatermarkConfig,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            blurrer: Some(blurrer),
            remuxer,
            executor,
            config,
            preview_secs: None,
            workers: 1,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Limits processing to the first `seconds` of the source.
    pub fn with_preview(mut self, seconds: f64) -> Result<Self, WatermarkError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(WatermarkError::Config(format!(
                "preview length must be a positive number of seconds, got {seconds}"
            )));
        }
        self.preview_secs = Some(seconds);
        Ok(self)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, on_progress: Box<dyn Fn(usize, usize) -> bool + Send>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn execute(&mut self, input: &Path, output: &Path) -> Result<RunReport, WatermarkError> {
        let already_run = || WatermarkError::Resource("Pipeline already executed".into());
        let mut reader = ClosingReader::new(self.reader.take().ok_or_else(already_run)?);
        let writer = self.writer.take().ok_or_else(already_run)?;
        let blurrer: Arc<dyn RegionBlurrer> =
            Arc::from(self.blurrer.take().ok_or_else(already_run)?);

        let metadata = reader.open(input).map_err(|e| {
            WatermarkError::resource(&format!("Failed to open {}", input.display()), e)
        })?;
        metadata.validate()?;

        let frame_limit = match self.preview_secs {
            Some(seconds) => {
                let frames = metadata.frames_in(seconds);
                if frames == 0 {
                    return Err(WatermarkError::Config(format!(
                        "preview of {seconds}s is shorter than one frame at {:.3} fps",
                        metadata.fps
                    )));
                }
                Some(frames)
            }
            None => None,
        };

        let processor = Arc::new(FrameProcessor::new(
            &metadata,
            &self.config,
            blurrer,
            frame_limit,
        )?);

        let scratch = create_scratch_file(output)?;
        log::info!("Writing video pass to {}", scratch.path().display());

        let pipeline_config = PipelineConfig {
            workers: self.workers,
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };
        let frames_written = self.executor.execute(
            reader,
            writer,
            processor.clone(),
            &metadata,
            scratch.path(),
            pipeline_config,
        )?;

        if frames_written == 0 {
            return Err(WatermarkError::InvalidSource(format!(
                "{} yielded no decodable frames",
                input.display()
            )));
        }

        if let Err(e) = self.remuxer.remux(scratch.path(), input, output) {
            let message = e.to_string();
            log::warn!("Audio remux failed: {message}");
            if output.exists() {
                let _ = std::fs::remove_file(output);
            }
            let keep_path = video_only_path(output);
            let video_only = match scratch.persist(&keep_path) {
                Ok(_) => {
                    log::info!("Kept processed video at {}", keep_path.display());
                    Some(keep_path)
                }
                Err(persist_err) => {
                    log::warn!("Could not keep processed video: {persist_err}");
                    None
                }
            };
            return Err(WatermarkError::Remux {
                message,
                video_only,
            });
        }
        log::info!("Wrote {} frames to {}", frames_written, output.display());

        Ok(RunReport {
            metadata,
            frames_written,
            frame_limit: processor.frame_limit(),
        })
    }
}

fn output_extension(output: &Path) -> &str {
    output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4")
}

/// Scratch file beside `output`, removed when dropped unless persisted.
/// The extension is kept so the muxer picks the same container.
fn create_scratch_file(output: &Path) -> Result<tempfile::NamedTempFile, WatermarkError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    tempfile::Builder::new()
        .prefix(&format!(".{stem}."))
        .suffix(&format!(".{}", output_extension(output)))
        .tempfile_in(dir)
        .map_err(|e| {
            WatermarkError::resource(&format!("Failed to create scratch file in {}", dir.display()), e)
        })
}

/// `<stem>.video-only.<ext>` next to `output`.
pub fn video_only_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output.with_file_name(format!("{stem}.video-only.{}", output_extension(output)))
}
