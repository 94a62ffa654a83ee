use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::{Packet, Rational};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Rate used when the source reports none.
const FALLBACK_FPS: i32 = 30;

/// Encodes RGB frames into a video container via ffmpeg-next.
///
/// The container is picked from the output file extension. MPEG-4 Part 2 is
/// the default encoder because it ships with every ffmpeg build; another
/// encoder can be chosen by name.
pub struct FfmpegWriter {
    codec_name: Option<String>,
    session: Option<EncodeSession>,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            codec_name: None,
            session: None,
        }
    }

    /// Use the ffmpeg encoder registered under `name` (e.g. `libx264`).
    pub fn with_codec(mut self, name: impl Into<String>) -> Self {
        self.codec_name = Some(name.into());
        self
    }

    fn find_codec(&self) -> Result<ffmpeg_next::Codec, Box<dyn std::error::Error>> {
        match &self.codec_name {
            Some(name) => ffmpeg_next::encoder::find_by_name(name)
                .ok_or_else(|| format!("Encoder '{name}' not found").into()),
            None => ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
                .ok_or_else(|| "MPEG4 encoder not found".into()),
        }
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let fps = encoder_fps(metadata.fps);
        let codec = self.find_codec()?;
        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let mut ost = octx.add_stream(Some(codec))?;
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        octx.write_header()?;

        let stream_time_base = octx
            .stream(0)
            .ok_or("Output stream missing after header")?
            .time_base();

        let scaler = scaling::Context::get(
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            Pixel::YUV420P,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Encoding {} ({}x{} at {fps} fps)",
            path.display(),
            metadata.width,
            metadata.height
        );
        self.session = Some(EncodeSession {
            octx,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            fps,
            stream_time_base,
            frames_written: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let session = self.session.as_mut().ok_or("FfmpegWriter: not opened")?;
        session.encode(frame)
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut session) = self.session.take() {
            session.finish()?;
        }
        Ok(())
    }
}

struct EncodeSession {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    fps: i32,
    stream_time_base: Rational,
    frames_written: usize,
}

impl EncodeSession {
    fn encode(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(format!(
                "Frame {} is {}x{}x{}, encoder expects {}x{}x3",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb = VideoFrame::new(Pixel::RGB24, self.width, self.height);
        let stride = rgb.stride(0);
        let row_bytes = self.width as usize * 3;
        let dst = rgb.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(src);
        }

        let mut yuv = VideoFrame::empty();
        self.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.frames_written as i64));

        self.encoder.send_frame(&yuv)?;
        self.drain_packets()?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.encoder.send_eof()?;
        self.drain_packets()?;
        self.octx.write_trailer()?;
        log::debug!("Encoder closed after {} frames", self.frames_written);
        Ok(())
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut encoded = Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(Rational(1, self.fps), self.stream_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

/// Integer encoder rate; unusable source rates fall back to 30.
fn encoder_fps(fps: f64) -> i32 {
    let rounded = fps.round();
    if rounded.is_finite() && rounded >= 1.0 {
        rounded as i32
    } else {
        FALLBACK_FPS
    }
}
