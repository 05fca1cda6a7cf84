use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::shared::error::WatermarkError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::ClosingReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_processor::FrameProcessor;

/// Configuration for a pipeline execution run.
pub struct PipelineConfig {
    /// Threads running the blur stage. Clamped to at least one.
    pub workers: usize,
    /// Called after each frame is handed to the writer, in index order.
    /// Returning `false` cancels the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Abstracts how the read → blur → write pipeline is executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations. The reader arrives already opened; the
/// executor opens and closes the writer. Returns the number of frames
/// written.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        reader: ClosingReader,
        writer: Box<dyn VideoWriter>,
        processor: Arc<FrameProcessor>,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<usize, WatermarkError>;
}
