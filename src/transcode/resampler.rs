//! Audio resampler for both pipelines
//!
//! Converts between packed s16 and the codec's native sample format. Both
//! pipelines keep the sample rate and channel layout unchanged, so this is a
//! format-only conversion, but the context accepts any combination.

use crate::error::{FfmpegError, Result, TranscodeError};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::Sample;

/// One side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub format: Sample,
    pub layout: ChannelLayout,
    pub rate: u32,
}

impl AudioSpec {
    pub fn new(format: Sample, layout: ChannelLayout, rate: u32) -> Self {
        Self {
            format,
            layout,
            rate,
        }
    }

    /// Same layout and rate, different sample format.
    pub fn with_format(self, format: Sample) -> Self {
        Self { format, ..self }
    }
}

/// Audio resampler wrapping FFmpeg's `SwrContext`
///
/// Filter history carries over between consecutive `convert` calls and is
/// dropped with the resampler.
pub struct AudioResampler {
    context: resampling::Context,
    source: AudioSpec,
    target: AudioSpec,
}

impl AudioResampler {
    pub fn new(source: AudioSpec, target: AudioSpec) -> Result<Self> {
        if source.format == Sample::None {
            return Err(TranscodeError::Ffmpeg(FfmpegError::ResamplerCreate(
                "source sample format is unknown".into(),
            )));
        }

        let context = resampling::Context::get(
            source.format,
            source.layout,
            source.rate,
            target.format,
            target.layout,
            target.rate,
        )
        .map_err(|e| {
            TranscodeError::Ffmpeg(FfmpegError::ResamplerCreate(format!(
                "{} {}Hz -> {} {}Hz: {}",
                source.format.name(),
                source.rate,
                target.format.name(),
                target.rate,
                e
            )))
        })?;

        tracing::debug!(
            from = source.format.name(),
            to = target.format.name(),
            rate = target.rate,
            channels = target.layout.channels(),
            "resampler configured"
        );

        Ok(Self {
            context,
            source,
            target,
        })
    }

    /// Convert `input` into `output`.
    ///
    /// When `output` already has buffers (the encoder frame) they are filled
    /// in place, up to their capacity. When it is empty, buffers sized for
    /// `input` are allocated.
    pub fn convert(
        &mut self,
        input: &ffmpeg::util::frame::Audio,
        output: &mut ffmpeg::util::frame::Audio,
    ) -> Result<()> {
        self.context.run(input, output).map_err(|e| {
            TranscodeError::Ffmpeg(FfmpegError::Resample(format!(
                "{} -> {} ({} samples): {}",
                self.source.format.name(),
                self.target.format.name(),
                input.samples(),
                e
            )))
        })?;
        Ok(())
    }
}
