use std::path::Path;

/// Combines a processed, video-only file with the audio of the original
/// source into the final output.
///
/// A source without an audio track is not an error: the output then
/// carries the video alone.
pub trait AudioRemuxer: Send {
    fn remux(
        &self,
        video_only: &Path,
        audio_source: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
