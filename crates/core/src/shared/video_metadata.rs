use std::fmt;

use super::error::WatermarkError;

/// Stream properties reported by the probe before processing starts.
///
/// Read-only for the lifetime of one run; the frame geometry and schedule
/// are both derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Landscape => write!(f, "Landscape"),
            Orientation::Portrait => write!(f, "Portrait"),
            Orientation::Square => write!(f, "Square"),
        }
    }
}

impl VideoMetadata {
    /// Rejects streams the pipeline has no recovery for.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.width == 0 || self.height == 0 {
            return Err(WatermarkError::InvalidSource(format!(
                "frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(WatermarkError::InvalidSource(format!(
                "frame rate must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => Orientation::Square,
        }
    }

    /// Number of frames covering the first `seconds` of the stream.
    pub fn frames_in(&self, seconds: f64) -> usize {
        (seconds * self.fps).floor().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn meta(width: u32, height: u32, fps: f64, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: "h264".to_string(),
        }
    }

    #[test]
    fn test_duration_is_frames_over_fps() {
        assert_relative_eq!(meta(1920, 1080, 30.0, 300).duration_secs(), 10.0);
    }

    #[test]
    fn test_duration_zero_without_fps() {
        assert_relative_eq!(meta(1920, 1080, 0.0, 300).duration_secs(), 0.0);
    }

    #[rstest]
    #[case::landscape(1920, 1080, Orientation::Landscape)]
    #[case::portrait(1080, 1920, Orientation::Portrait)]
    #[case::square(720, 720, Orientation::Square)]
    fn test_orientation(#[case] w: u32, #[case] h: u32, #[case] expected: Orientation) {
        assert_eq!(meta(w, h, 30.0, 1).orientation(), expected);
    }

    #[test]
    fn test_frames_in_floors() {
        let m = meta(1920, 1080, 29.97, 300);
        assert_eq!(m.frames_in(5.0), 149);
        assert_eq!(meta(1920, 1080, 30.0, 300).frames_in(5.0), 150);
    }

    #[rstest]
    #[case::zero_fps(meta(1920, 1080, 0.0, 10))]
    #[case::negative_fps(meta(1920, 1080, -30.0, 10))]
    #[case::nan_fps(meta(1920, 1080, f64::NAN, 10))]
    #[case::zero_width(meta(0, 1080, 30.0, 10))]
    #[case::zero_height(meta(1920, 0, 30.0, 10))]
    fn test_validate_rejects(#[case] m: VideoMetadata) {
        assert!(matches!(
            m.validate(),
            Err(WatermarkError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_validate_accepts_normal_stream() {
        assert!(meta(1920, 1080, 30.0, 0).validate().is_ok());
    }
}
