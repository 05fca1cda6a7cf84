use std::path::Path;

use crate::video::domain::audio_remuxer::AudioRemuxer;

/// Stream-copies the video of a processed file and the best audio stream of
/// the original source into a new container. Nothing is re-encoded.
///
/// Audio packets that start after the last video frame ends are dropped, so
/// a preview never carries the full soundtrack of its source.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegAudioRemuxer;

impl FfmpegAudioRemuxer {
    pub fn new() -> Self {
        Self
    }
}

fn add_copy_stream(
    octx: &mut ffmpeg_next::format::context::Output,
    parameters: ffmpeg_next::codec::Parameters,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
    ost.set_parameters(parameters);
    // Let the muxer pick a tag valid for the output container.
    unsafe {
        (*ost.parameters().as_mut_ptr()).codec_tag = 0;
    }
    Ok(ost.index())
}

impl AudioRemuxer for FfmpegAudioRemuxer {
    fn remux(
        &self,
        video_only: &Path,
        audio_source: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx_video = ffmpeg_next::format::input(video_only)
            .map_err(|e| format!("Cannot open processed video {}: {e}", video_only.display()))?;
        let mut ictx_source = ffmpeg_next::format::input(audio_source)
            .map_err(|e| format!("Cannot open audio source {}: {e}", audio_source.display()))?;

        let mut octx = ffmpeg_next::format::output(output)
            .map_err(|e| format!("Cannot create output {}: {e}", output.display()))?;

        let mut video_stream_map: Vec<Option<usize>> = vec![None; ictx_video.nb_streams() as usize];
        for stream in ictx_video.streams() {
            if stream.parameters().medium() == ffmpeg_next::media::Type::Video {
                video_stream_map[stream.index()] =
                    Some(add_copy_stream(&mut octx, stream.parameters())?);
            }
        }
        if video_stream_map.iter().all(Option::is_none) {
            return Err(format!("{} contains no video stream", video_only.display()).into());
        }

        let audio = match ictx_source.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => {
                let ost_index = add_copy_stream(&mut octx, stream.parameters())?;
                Some((stream.index(), stream.time_base(), ost_index))
            }
            None => {
                log::info!("Source has no audio track, output will be video only");
                None
            }
        };

        octx.write_header()?;

        let video_time_bases: Vec<_> = ictx_video.streams().map(|s| s.time_base()).collect();
        let mut video_end_secs = 0.0_f64;

        for (stream, mut packet) in ictx_video.packets() {
            let ist_idx = stream.index();
            let Some(ost_idx) = video_stream_map[ist_idx] else {
                continue;
            };
            let ist_time_base = video_time_bases[ist_idx];
            if let Some(pts) = packet.pts() {
                let end = (pts + packet.duration()) as f64 * f64::from(ist_time_base);
                video_end_secs = video_end_secs.max(end);
            }
            let ost_time_base = octx
                .stream(ost_idx)
                .ok_or("Output video stream missing")?
                .time_base();
            packet.rescale_ts(ist_time_base, ost_time_base);
            packet.set_position(-1);
            packet.set_stream(ost_idx);
            packet.write_interleaved(&mut octx)?;
        }

        if let Some((ist_idx, ist_time_base, ost_idx)) = audio {
            let ost_time_base = octx
                .stream(ost_idx)
                .ok_or("Output audio stream missing")?
                .time_base();
            let mut dropped = 0usize;

            for (stream, mut packet) in ictx_source.packets() {
                if stream.index() != ist_idx {
                    continue;
                }
                if let Some(pts) = packet.pts() {
                    if pts as f64 * f64::from(ist_time_base) >= video_end_secs {
                        dropped += 1;
                        continue;
                    }
                }
                packet.rescale_ts(ist_time_base, ost_time_base);
                packet.set_position(-1);
                packet.set_stream(ost_idx);
                packet.write_interleaved(&mut octx)?;
            }

            if dropped > 0 {
                log::debug!("Dropped {dropped} audio packets past the end of the video ({video_end_secs:.2}s)");
            }
        }

        octx.write_trailer()?;
        Ok(())
    }
}
