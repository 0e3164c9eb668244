//! Transcoder configuration
//!
//! The encode parameters are fixed: there is no configuration file and no
//! environment override. `EncodeConfig::default()` is the only configuration
//! the encode pipeline ever sees.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::Sample;
use serde::Serialize;

/// Output sample rate of the encoder, in Hz
pub const AAC_SAMPLE_RATE: u32 = 44_100;
/// Output channel count (stereo)
pub const AAC_CHANNELS: u16 = 2;
/// Target bitrate in bits per second
pub const AAC_BIT_RATE: usize = 96_000;
/// `AV_PROFILE_AAC_LOW`
pub const AAC_PROFILE_LOW: i32 = 1;
/// Bytes per interleaved sample of the raw input (signed 16-bit)
pub const PCM_BYTES_PER_SAMPLE: usize = 2;

/// Sample format the AAC encoder consumes
pub const ENCODER_SAMPLE_FMT: Sample = Sample::F32(ffmpeg::util::format::sample::Type::Planar);
/// Sample format of the raw PCM on both ends of the pipelines
pub const PCM_SAMPLE_FMT: Sample = Sample::I16(ffmpeg::util::format::sample::Type::Packed);

/// Codec configuration for the encode pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeConfig {
    /// Codec name as registered with FFmpeg
    pub codec: &'static str,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bitrate in bits per second
    pub bit_rate: usize,
    /// FFmpeg profile identifier
    pub profile: i32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            codec: "aac",
            sample_rate: AAC_SAMPLE_RATE,
            channels: AAC_CHANNELS,
            bit_rate: AAC_BIT_RATE,
            profile: AAC_PROFILE_LOW,
        }
    }
}

impl EncodeConfig {
    pub fn codec_id(&self) -> ffmpeg::codec::Id {
        ffmpeg::codec::Id::AAC
    }

    pub fn channel_layout(&self) -> ChannelLayout {
        ChannelLayout::STEREO
    }

    pub fn sample_format(&self) -> Sample {
        ENCODER_SAMPLE_FMT
    }

    /// Codec and stream time base: one tick per sample.
    pub fn time_base(&self) -> ffmpeg::Rational {
        ffmpeg::Rational::new(1, self.sample_rate as i32)
    }

    /// Size in bytes of the raw interleaved s16 chunk that fills one
    /// encoder frame of `frame_size` samples.
    pub fn chunk_bytes(&self, frame_size: usize) -> usize {
        frame_size * PCM_BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Size in bytes of one interleaved s16 sample frame (all channels).
    pub fn pcm_frame_bytes(&self) -> usize {
        PCM_BYTES_PER_SAMPLE * self.channels as usize
    }
}

/// Log output format for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}
