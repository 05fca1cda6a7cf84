use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Reads frames from a video source.
///
/// Implementations handle I/O details (codec, container format, etc.)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types. `open` doubles as the metadata probe.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order, indexed from 0.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader. Must be idempotent.
    fn close(&mut self);
}

/// Owns an opened reader and closes it when dropped, whether the run
/// finished, failed, or was cancelled.
pub struct ClosingReader {
    inner: Box<dyn VideoReader>,
}

impl ClosingReader {
    pub fn new(inner: Box<dyn VideoReader>) -> Self {
        Self { inner }
    }
}

impl Deref for ClosingReader {
    type Target = dyn VideoReader;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ClosingReader {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ClosingReader {
    fn drop(&mut self) {
        self.inner.close();
    }
}
