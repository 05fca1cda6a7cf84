use crate::geometry::domain::region_geometry::RegionLayout;
use crate::scheduling::domain::position_schedule::PositionSchedule;

use super::constants::{
    DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, DEFAULT_CYCLE_INTERVAL_SECS,
};
use super::error::WatermarkError;

/// Per-run watermark settings, validated at construction.
///
/// A value of this type always holds a positive odd kernel, a non-empty
/// box and a usable schedule, so processing never starts on a bad config.
#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkConfig {
    box_width: u32,
    box_height: u32,
    blur_kernel_size: usize,
    schedule: PositionSchedule,
    layout: RegionLayout,
}

impl WatermarkConfig {
    /// Signed inputs so that raw user values can be rejected with a
    /// configuration error instead of failing to parse.
    pub fn new(
        box_width: i64,
        box_height: i64,
        blur_kernel_size: i64,
        cycle_interval_secs: f64,
    ) -> Result<Self, WatermarkError> {
        let box_width = positive_dimension("box width", box_width)?;
        let box_height = positive_dimension("box height", box_height)?;
        let blur_kernel_size = validate_kernel_size(blur_kernel_size)?;
        let schedule = PositionSchedule::interval(cycle_interval_secs);
        validate_schedule(&schedule)?;

        Ok(Self {
            box_width,
            box_height,
            blur_kernel_size,
            schedule,
            layout: RegionLayout::default(),
        })
    }

    pub fn with_schedule(mut self, schedule: PositionSchedule) -> Result<Self, WatermarkError> {
        validate_schedule(&schedule)?;
        self.schedule = schedule;
        Ok(self)
    }

    pub fn with_layout(mut self, layout: RegionLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn box_width(&self) -> u32 {
        self.box_width
    }

    pub fn box_height(&self) -> u32 {
        self.box_height
    }

    pub fn blur_kernel_size(&self) -> usize {
        self.blur_kernel_size
    }

    pub fn schedule(&self) -> &PositionSchedule {
        &self.schedule
    }

    pub fn layout(&self) -> &RegionLayout {
        &self.layout
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            box_width: DEFAULT_BOX_WIDTH,
            box_height: DEFAULT_BOX_HEIGHT,
            blur_kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
            schedule: PositionSchedule::interval(DEFAULT_CYCLE_INTERVAL_SECS),
            layout: RegionLayout::default(),
        }
    }
}

/// Accepts only positive odd kernel sizes.
pub fn validate_kernel_size(kernel_size: i64) -> Result<usize, WatermarkError> {
    if kernel_size < 1 || kernel_size % 2 == 0 {
        return Err(WatermarkError::Config(format!(
            "blur kernel size must be a positive odd integer, got {kernel_size}"
        )));
    }
    usize::try_from(kernel_size)
        .map_err(|_| WatermarkError::Config(format!("blur kernel size {kernel_size} is too large")))
}

fn positive_dimension(name: &str, value: i64) -> Result<u32, WatermarkError> {
    if value < 1 {
        return Err(WatermarkError::Config(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| WatermarkError::Config(format!("{name} {value} is too large")))
}

fn validate_schedule(schedule: &PositionSchedule) -> Result<(), WatermarkError> {
    match schedule {
        PositionSchedule::Interval {
            cycle_interval_secs,
        } => {
            if !cycle_interval_secs.is_finite() || *cycle_interval_secs <= 0.0 {
                return Err(WatermarkError::Config(format!(
                    "cycle interval must be a positive number of seconds, got {cycle_interval_secs}"
                )));
            }
        }
        PositionSchedule::FramePattern {
            frames_per_position,
        } => {
            if frames_per_position.iter().any(|&n| n == 0) {
                return Err(WatermarkError::Config(
                    "every position in a frame pattern needs at least one frame".to_string(),
                ));
            }
        }
    }
    Ok(())
}
