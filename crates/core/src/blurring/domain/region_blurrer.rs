use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;

pub type BlurError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for destroying the contents of one rectangle of a frame.
///
/// Implementations modify the frame in place, clamp `region` to the frame
/// themselves, and leave every pixel outside the clamped rectangle
/// untouched. A rectangle with no area left after clamping is a no-op.
/// `Sync` so one instance can serve a pool of worker threads.
pub trait RegionBlurrer: Send + Sync {
    fn blur_region(&self, frame: &mut Frame, region: &Rectangle) -> Result<(), BlurError>;
}
