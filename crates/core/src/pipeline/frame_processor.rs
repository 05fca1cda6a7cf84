use std::sync::Arc;

use crate::blurring::domain::region_blurrer::RegionBlurrer;
use crate::scheduling::domain::position_schedule::PositionSchedule;
use crate::shared::constants::POSITION_COUNT;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::watermark_config::WatermarkConfig;

/// Per-frame watermark removal: pick the active region for a frame index,
/// then blur it.
///
/// Regions are computed once, since frame size is fixed for the stream. The
/// work done for frame `i` depends only on `i` and that frame's pixels, so
/// one processor can be shared across worker threads.
pub struct FrameProcessor {
    blurrer: Arc<dyn RegionBlurrer>,
    regions: [Rectangle; POSITION_COUNT],
    schedule: PositionSchedule,
    fps: f64,
    width: u32,
    height: u32,
    total: usize,
    frame_limit: Option<usize>,
}

impl FrameProcessor {
    pub fn new(
        metadata: &VideoMetadata,
        config: &WatermarkConfig,
        blurrer: Arc<dyn RegionBlurrer>,
        frame_limit: Option<usize>,
    ) -> Result<Self, WatermarkError> {
        metadata.validate()?;
        if frame_limit == Some(0) {
            return Err(WatermarkError::Config(
                "frame limit must be positive".to_string(),
            ));
        }

        let regions = config.layout().compute_regions(
            metadata.width,
            metadata.height,
            config.box_width(),
            config.box_height(),
        );
        log::info!(
            "Watermark regions for {}x{}: {:?}",
            metadata.width,
            metadata.height,
            regions
        );

        // A container without a frame count reports 0; the limit alone
        // bounds the run then.
        let frame_limit = frame_limit.map(|limit| match metadata.total_frames {
            0 => limit,
            known => limit.min(known),
        });
        let total = frame_limit.unwrap_or(metadata.total_frames);
        if let Some(limit) = frame_limit {
            log::info!("Processing limited to the first {limit} frames");
        }

        Ok(Self {
            blurrer,
            regions,
            schedule: config.schedule().clone(),
            fps: metadata.fps,
            width: metadata.width,
            height: metadata.height,
            total,
            frame_limit,
        })
    }

    /// Expected number of output frames, as reported to progress sinks.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn frame_limit(&self) -> Option<usize> {
        self.frame_limit
    }

    pub fn regions(&self) -> &[Rectangle; POSITION_COUNT] {
        &self.regions
    }

    /// True once `processed` frames reach the expected total. With no
    /// frame count and no limit the run only ends when the source does.
    pub fn is_complete(&self, processed: usize) -> bool {
        self.total > 0 && processed >= self.total
    }

    pub fn region_for(&self, frame_index: usize) -> Rectangle {
        self.regions[self.schedule.active_index(frame_index, self.fps)]
    }

    /// Blurs the active region of `frame` in place, keyed by its index.
    pub fn process_frame(&self, frame: &mut Frame) -> Result<(), WatermarkError> {
        if !frame.fits_stream(self.width, self.height) {
            return Err(WatermarkError::InvalidSource(format!(
                "frame {} is {}x{} with {} channels, stream is {}x{} RGB",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )));
        }

        let index = frame.index();
        let region = self.region_for(index);
        self.blurrer
            .blur_region(frame, &region)
            .map_err(|e| WatermarkError::resource(&format!("Blur failed on frame {index}"), e))
    }

    /// Sequential reference pipeline.
    ///
    /// Frames are indexed by arrival position. Stops after `total` frames
    /// or when `frames` runs dry, whichever comes first. A progress sink
    /// returning `false` cancels the run.
    pub fn process<I>(
        &self,
        frames: I,
        on_progress: Option<&dyn Fn(usize, usize) -> bool>,
    ) -> Result<Vec<Frame>, WatermarkError>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut output = Vec::with_capacity(self.total);

        for (index, frame) in frames.into_iter().enumerate() {
            if self.is_complete(index) {
                break;
            }
            let mut frame = frame.with_index(index);
            self.process_frame(&mut frame)?;
            output.push(frame);

            if let Some(cb) = on_progress {
                if !cb(index + 1, self.total) {
                    return Err(WatermarkError::Cancelled);
                }
            }
        }

        Ok(output)
    }
}
