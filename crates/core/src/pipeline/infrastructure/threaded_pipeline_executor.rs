use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::ClosingReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type FrameResult = Result<Frame, WatermarkError>;

/// Executes the pipeline with dedicated threads for I/O and a worker pool
/// for blurring.
///
/// Layout: `reader → workers[N] → main [reorder/progress] → writer`
///
/// Workers finish frames in any order. The main thread holds early
/// arrivals in a reorder buffer and releases them to the writer strictly by
/// index, so the encoder always sees a monotonic stream.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller cancellation plus an internal flag raised when the run fails,
/// so every thread winds down between frames.
#[derive(Clone)]
struct StopFlags {
    cancelled: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
}

impl StopFlags {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn should_stop(&self) -> bool {
        self.is_cancelled() || self.failed.load(Ordering::Relaxed)
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::Relaxed);
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: ClosingReader,
        mut writer: Box<dyn VideoWriter>,
        processor: Arc<FrameProcessor>,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<usize, WatermarkError> {
        writer
            .open(output_path, metadata)
            .map_err(|e| WatermarkError::resource("Failed to create encoder", e))?;

        let workers = config.workers.max(1);
        let cap = self.channel_capacity.max(workers * 2);
        let stop = StopFlags {
            cancelled: config.cancelled.clone(),
            failed: Arc::new(AtomicBool::new(false)),
        };
        log::debug!("Running pipeline with {workers} blur workers");

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<FrameResult>(cap);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<FrameResult>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, processor.clone(), frame_tx, stop.clone());
        let worker_handles: Vec<_> = (0..workers)
            .map(|_| {
                spawn_worker(
                    processor.clone(),
                    frame_rx.clone(),
                    done_tx.clone(),
                    stop.clone(),
                )
            })
            .collect();
        drop(frame_rx);
        drop(done_tx);
        let writer_handle = spawn_writer(writer, write_rx);

        let outcome = run_reorder_loop(done_rx, &write_tx, processor.total(), &config, &stop);
        if outcome.is_err() {
            stop.fail();
        }

        drop(write_tx);

        join_threads(reader_handle, worker_handles, writer_handle, outcome)
    }
}

fn spawn_reader(
    mut reader: ClosingReader,
    processor: Arc<FrameProcessor>,
    frame_tx: Sender<FrameResult>,
    stop: StopFlags,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (index, frame_result) in reader.frames().enumerate() {
            if processor.is_complete(index) || stop.should_stop() {
                break;
            }
            let item = frame_result
                .map(|frame| frame.with_index(index))
                .map_err(|e| WatermarkError::resource(&format!("Failed to decode frame {index}"), e));
            let failed = item.is_err();
            if frame_tx.send(item).is_err() || failed {
                break;
            }
        }
        // Dropping the guard closes the source.
        drop(reader);
    })
}

fn spawn_worker(
    processor: Arc<FrameProcessor>,
    frame_rx: Receiver<FrameResult>,
    done_tx: Sender<FrameResult>,
    stop: StopFlags,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for item in frame_rx {
            if stop.should_stop() {
                break;
            }
            let result =
                item.and_then(|mut frame| processor.process_frame(&mut frame).map(|()| frame));
            if done_tx.send(result).is_err() {
                break;
            }
        }
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: Receiver<Frame>,
) -> JoinHandle<Result<Box<dyn VideoWriter>, SendError>> {
    std::thread::spawn(move || {
        for frame in write_rx {
            writer
                .write(&frame)
                .map_err(|e| -> SendError { format!("frame {}: {e}", frame.index()).into() })?;
        }
        Ok(writer)
    })
}

/// Receives blurred frames, restores index order, forwards them to the
/// writer and reports progress. Returns the number of frames forwarded.
fn run_reorder_loop(
    done_rx: Receiver<FrameResult>,
    write_tx: &Sender<Frame>,
    total: usize,
    config: &PipelineConfig,
    stop: &StopFlags,
) -> Result<usize, WatermarkError> {
    let mut pending: BTreeMap<usize, Frame> = BTreeMap::new();
    let mut next_index = 0usize;

    for result in done_rx {
        if stop.is_cancelled() {
            return Err(WatermarkError::Cancelled);
        }

        let frame = result?;
        pending.insert(frame.index(), frame);

        while let Some(frame) = pending.remove(&next_index) {
            if write_tx.send(frame).is_err() {
                // The writer failed; its error is reported on join.
                stop.fail();
                return Ok(next_index);
            }
            next_index += 1;

            if let Some(ref callback) = config.on_progress {
                if !callback(next_index, total) {
                    return Err(WatermarkError::Cancelled);
                }
            }
        }
    }

    if stop.is_cancelled() {
        return Err(WatermarkError::Cancelled);
    }
    if let Some(&missing_after) = pending.keys().next() {
        return Err(WatermarkError::Resource(format!(
            "frame {next_index} never arrived (next available: {missing_after})"
        )));
    }

    Ok(next_index)
}

/// Joins all pipeline threads and coalesces the first error encountered.
fn join_threads(
    reader_handle: JoinHandle<()>,
    worker_handles: Vec<JoinHandle<()>>,
    writer_handle: JoinHandle<Result<Box<dyn VideoWriter>, SendError>>,
    outcome: Result<usize, WatermarkError>,
) -> Result<usize, WatermarkError> {
    let mut first_error: Option<WatermarkError> = None;
    let mut set_if_none = |err: WatermarkError| {
        if first_error.is_none() {
            first_error = Some(err);
        }
    };

    let written = match outcome {
        Ok(n) => n,
        Err(e) => {
            set_if_none(e);
            0
        }
    };

    if reader_handle.join().is_err() {
        set_if_none(WatermarkError::Resource("Reader thread panicked".into()));
    }

    for handle in worker_handles {
        if handle.join().is_err() {
            set_if_none(WatermarkError::Resource("Blur worker panicked".into()));
        }
    }

    match writer_handle.join() {
        Ok(Ok(mut w)) => {
            if let Err(e) = w.close() {
                set_if_none(WatermarkError::resource("Failed to finalize output", e));
            }
        }
        Ok(Err(e)) => set_if_none(WatermarkError::resource("Failed to encode", e)),
        Err(_) => set_if_none(WatermarkError::Resource("Writer thread panicked".into())),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(written),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::region_blurrer::{BlurError, RegionBlurrer};
    use crate::shared::rectangle::Rectangle;
    use crate::shared::watermark_config::WatermarkConfig;
    use crate::video::domain::video_reader::VideoReader;
    use std::sync::Mutex;
    use std::time::Duration;

    const W: u32 = 32;
    const H: u32 = 24;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        fail_at: Option<usize>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Frame::rgb(vec![(i % 256) as u8; (W * H * 3) as usize], W, H, 0))
                .collect();
            Self {
                frames,
                fail_at: None,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(metadata(self.frames.len()))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new(self.frames.drain(..).enumerate().map(move |(i, f)| {
                if Some(i) == fail_at {
                    Err("corrupt packet".into())
                } else {
                    Ok(f)
                }
            }))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<usize>>>,
        closed: Arc<Mutex<bool>>,
        fail_open: bool,
        fail_at: Option<usize>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
                fail_open: false,
                fail_at: None,
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("no encoder".into());
            }
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            if Some(frame.index()) == self.fail_at {
                return Err("disk full".into());
            }
            self.written.lock().unwrap().push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Later frames in each group of four finish first.
    struct ScramblingBlurrer;

    impl RegionBlurrer for ScramblingBlurrer {
        fn blur_region(&self, frame: &mut Frame, _region: &Rectangle) -> Result<(), BlurError> {
            let delay = 3 - (frame.index() % 4) as u64;
            std::thread::sleep(Duration::from_millis(delay * 2));
            Ok(())
        }
    }

    fn metadata(total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: W,
            height: H,
            fps: 30.0,
            total_frames,
            codec: "stub".to_string(),
        }
    }

    fn processor(total_frames: usize, frame_limit: Option<usize>) -> Arc<FrameProcessor> {
        Arc::new(
            FrameProcessor::new(
                &metadata(total_frames),
                &WatermarkConfig::default(),
                Arc::new(ScramblingBlurrer),
                frame_limit,
            )
            .unwrap(),
        )
    }

    fn run(
        reader: StubReader,
        writer: StubWriter,
        processor: Arc<FrameProcessor>,
        config: PipelineConfig,
    ) -> Result<usize, WatermarkError> {
        let meta = metadata(reader.frames.len());
        ThreadedPipelineExecutor::new().execute(
            ClosingReader::new(Box::new(reader)),
            Box::new(writer),
            processor,
            &meta,
            Path::new("/tmp/unused.mp4"),
            config,
        )
    }

    #[test]
    fn test_parallel_workers_preserve_index_order() {
        let reader = StubReader::new(40);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let progress_sink = progress.clone();
        let config = PipelineConfig {
            workers: 4,
            on_progress: Some(Box::new(move |current, total| {
                progress_sink.lock().unwrap().push((current, total));
                true
            })),
            ..PipelineConfig::default()
        };

        let count = run(reader, writer, processor(40, None), config).unwrap();

        assert_eq!(count, 40);
        assert_eq!(*written.lock().unwrap(), (0..40).collect::<Vec<_>>());
        let progress = progress.lock().unwrap();
        assert_eq!(*progress, (1..=40).map(|i| (i, 40)).collect::<Vec<_>>());
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_frame_limit_stops_reading() {
        let reader = StubReader::new(300);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let config = PipelineConfig {
            workers: 3,
            ..PipelineConfig::default()
        };
        let count = run(reader, writer, processor(300, Some(150)), config).unwrap();

        assert_eq!(count, 150);
        assert_eq!(*written.lock().unwrap(), (0..150).collect::<Vec<_>>());
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_short_source_writes_what_it_has() {
        let reader = StubReader::new(12);
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let count = run(reader, writer, processor(300, None), PipelineConfig::default()).unwrap();

        assert_eq!(count, 12);
        assert_eq!(written.lock().unwrap().len(), 12);
    }

    #[test]
    fn test_stops_at_reported_frame_count() {
        let reader = StubReader::new(12);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let progress_sink = progress.clone();
        let config = PipelineConfig {
            workers: 2,
            on_progress: Some(Box::new(move |current, total| {
                progress_sink.lock().unwrap().push((current, total));
                true
            })),
            ..PipelineConfig::default()
        };

        let count = run(reader, writer, processor(10, None), config).unwrap();

        assert_eq!(count, 10);
        assert_eq!(*written.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(progress.lock().unwrap().last(), Some(&(10, 10)));
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_progress_returning_false_cancels_and_closes() {
        let reader = StubReader::new(100);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let writer_closed = writer.closed.clone();

        let config = PipelineConfig {
            workers: 2,
            on_progress: Some(Box::new(|current, _| current < 5)),
            ..PipelineConfig::default()
        };
        let result = run(reader, writer, processor(100, None), config);

        assert!(matches!(result, Err(WatermarkError::Cancelled)));
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_preset_cancel_flag_writes_nothing() {
        let reader = StubReader::new(50);
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let config = PipelineConfig::default();
        config.cancelled.store(true, Ordering::Relaxed);
        let result = run(reader, writer, processor(50, None), config);

        assert!(matches!(result, Err(WatermarkError::Cancelled)));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reader_error_is_fatal() {
        let mut reader = StubReader::new(20);
        reader.fail_at = Some(7);
        let reader_closed = reader.closed.clone();

        let result = run(
            reader,
            StubWriter::new(),
            processor(20, None),
            PipelineConfig::default(),
        );

        match result {
            Err(WatermarkError::Resource(message)) => {
                assert!(message.contains("frame 7"), "{message}");
                assert!(message.contains("corrupt packet"), "{message}");
            }
            other => panic!("expected resource error, got {other:?}"),
        }
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_writer_error_surfaces() {
        let mut writer = StubWriter::new();
        writer.fail_at = Some(3);

        let config = PipelineConfig {
            workers: 2,
            ..PipelineConfig::default()
        };
        let result = run(StubReader::new(20), writer, processor(20, None), config);

        match result {
            Err(WatermarkError::Resource(message)) => assert!(message.contains("disk full")),
            other => panic!("expected resource error, got {other:?}"),
        }
    }

    #[test]
    fn test_writer_open_failure_is_resource_error() {
        let reader = StubReader::new(5);
        let reader_closed = reader.closed.clone();
        let mut writer = StubWriter::new();
        writer.fail_open = true;

        let result = run(reader, writer, processor(5, None), PipelineConfig::default());

        assert!(matches!(result, Err(WatermarkError::Resource(_))));
        assert!(*reader_closed.lock().unwrap());
    }
}
