use crate::shared::constants::{FRAME_PATTERN, POSITION_COUNT};

/// Index of the watermark position active at `frame_number`.
///
/// `floor(frame_number / fps / cycle_interval) mod 3`. Pure: the answer is
/// re-derived from the frame number alone, so frames may be queried in any
/// order. `fps` and `cycle_interval` must be positive; callers validate
/// both before the first frame.
pub fn active_index(frame_number: usize, fps: f64, cycle_interval: f64) -> usize {
    debug_assert!(fps > 0.0, "fps must be positive");
    debug_assert!(cycle_interval > 0.0, "cycle interval must be positive");
    let timestamp = frame_number as f64 / fps;
    let cycle = (timestamp / cycle_interval).floor() as u64;
    (cycle % POSITION_COUNT as u64) as usize
}

/// Policy deciding which of the three positions is active for a frame.
///
/// The two policies disagree on variable or non-integral frame rates, so
/// a run uses exactly one of them.
#[derive(Clone, Debug, PartialEq)]
pub enum PositionSchedule {
    /// Time based: each position lasts `cycle_interval_secs` seconds.
    Interval { cycle_interval_secs: f64 },
    /// Frame based: position `i` lasts `frames_per_position[i]` frames,
    /// then the pattern repeats. Ignores the frame rate.
    FramePattern {
        frames_per_position: [usize; POSITION_COUNT],
    },
}

impl PositionSchedule {
    pub fn interval(cycle_interval_secs: f64) -> Self {
        PositionSchedule::Interval {
            cycle_interval_secs,
        }
    }

    /// The 66/80/81 split of a 227-frame cycle.
    pub fn frame_pattern() -> Self {
        PositionSchedule::FramePattern {
            frames_per_position: FRAME_PATTERN,
        }
    }

    pub fn active_index(&self, frame_number: usize, fps: f64) -> usize {
        match self {
            PositionSchedule::Interval {
                cycle_interval_secs,
            } => active_index(frame_number, fps, *cycle_interval_secs),
            PositionSchedule::FramePattern {
                frames_per_position,
            } => {
                let cycle: usize = frames_per_position.iter().sum();
                if cycle == 0 {
                    return 0;
                }
                let mut offset = frame_number % cycle;
                for (index, &len) in frames_per_position.iter().enumerate() {
                    if offset < len {
                        return index;
                    }
                    offset -= len;
                }
                POSITION_COUNT - 1
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PositionSchedule::Interval {
                cycle_interval_secs,
            } => format!("every {cycle_interval_secs}s"),
            PositionSchedule::FramePattern {
                frames_per_position,
            } => {
                let cycle: usize = frames_per_position.iter().sum();
                format!(
                    "{}/{}/{} frames of a {cycle}-frame cycle",
                    frames_per_position[0], frames_per_position[1], frames_per_position[2]
                )
            }
        }
    }
}
