//! AAC encoder for the encode pipeline
//!
//! Wraps an FFmpeg `AVCodecContext` to encode planar float PCM frames
//! (44.1 kHz, stereo) to AAC-LC packets.

use crate::config::EncodeConfig;
use crate::error::{FfmpegError, Result, TranscodeError};
use crate::ffmpeg_utils::helpers;
use crate::transcode::engine::{CodecEngine, Drained};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;
use serde::Serialize;

/// AAC frame size used when the encoder does not report one
pub const AAC_FRAME_SIZE: usize = 1024;

/// AAC encoder backed by a real FFmpeg codec context
pub struct AacEncoder {
    encoder: ffmpeg::encoder::Audio,
    frame_size: usize,
    time_base: ffmpeg::Rational,
}

impl AacEncoder {
    /// Open an AAC encoder with the given configuration.
    ///
    /// `global_header` must be set when the container stores codec extradata
    /// out of band (MP4), and left unset for self-describing streams (ADTS).
    pub fn open(config: &EncodeConfig, global_header: bool) -> Result<Self> {
        let codec = codec::encoder::find(config.codec_id()).ok_or_else(|| {
            TranscodeError::Ffmpeg(FfmpegError::EncoderNotFound(format!(
                "{} encoder not found in this FFmpeg build",
                config.codec
            )))
        })?;

        match EncoderCapabilities::of(&codec) {
            Ok(caps) => tracing::debug!(
                encoder = %caps.name,
                sample_formats = ?caps.sample_formats,
                sample_rates = ?caps.sample_rates,
                channel_layouts = ?caps.channel_layouts,
                "encoder capabilities"
            ),
            Err(e) => tracing::debug!("cannot list encoder capabilities: {}", e),
        }

        // Build context and configure the audio encoder BEFORE opening
        let mut context = codec::Context::new_with_codec(codec);
        context.set_time_base(config.time_base());
        helpers::codec_context_set_profile(&mut context, config.profile);
        if global_header {
            context.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut audio_enc = context.encoder().audio().map_err(|e| {
            TranscodeError::Ffmpeg(FfmpegError::EncoderCreate(format!(
                "Cannot get audio encoder handle: {}",
                e
            )))
        })?;

        audio_enc.set_rate(config.sample_rate as i32);
        audio_enc.set_format(config.sample_format());
        audio_enc.set_channel_layout(config.channel_layout());
        audio_enc.set_bit_rate(config.bit_rate);

        let encoder = audio_enc.open_as(codec).map_err(|e| {
            TranscodeError::Ffmpeg(FfmpegError::EncoderCreate(format!(
                "Failed to open {} encoder: {}",
                config.codec, e
            )))
        })?;

        let frame_size = match encoder.frame_size() as usize {
            0 => AAC_FRAME_SIZE,
            n => n,
        };

        tracing::info!(
            codec = config.codec,
            sample_rate = config.sample_rate,
            channels = config.channels,
            bit_rate = config.bit_rate,
            frame_size,
            "encoder opened"
        );

        Ok(Self {
            encoder,
            frame_size,
            time_base: config.time_base(),
        })
    }

    /// The number of samples per channel the encoder expects per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Time base of the packets the encoder emits (1 / sample_rate).
    pub fn time_base(&self) -> ffmpeg::Rational {
        self.time_base
    }

    /// Codec parameters for the encoded stream (for muxer stream setup).
    pub fn codec_parameters(&self) -> Result<ffmpeg::codec::Parameters> {
        Ok(helpers::encoder_codec_parameters(&self.encoder)?)
    }
}

impl CodecEngine for AacEncoder {
    type Input = ffmpeg::util::frame::Audio;
    type Output = ffmpeg::Packet;

    fn send(&mut self, frame: Option<&ffmpeg::util::frame::Audio>) -> Result<()> {
        let sent = match frame {
            Some(frame) => self.encoder.send_frame(frame),
            None => self.encoder.send_eof(),
        };
        sent.map_err(|e| {
            TranscodeError::Ffmpeg(FfmpegError::SendFrame(format!(
                "AAC encoder {}: {}",
                if frame.is_some() { "send_frame" } else { "send_eof" },
                e
            )))
        })
    }

    fn receive(&mut self, packet: &mut ffmpeg::Packet) -> Result<Drained> {
        match self.encoder.receive_packet(packet) {
            Ok(()) => Ok(Drained::Ready),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                Ok(Drained::WouldBlock)
            }
            Err(ffmpeg::Error::Eof) => Ok(Drained::EndOfStream),
            Err(e) => Err(TranscodeError::Ffmpeg(FfmpegError::ReceivePacket(format!(
                "AAC encoder receive_packet error: {}",
                e
            )))),
        }
    }

    fn release(packet: &mut ffmpeg::Packet) {
        helpers::packet_unref(packet);
    }
}

/// What an encoder accepts, as advertised by the codec library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncoderCapabilities {
    pub name: String,
    pub long_name: String,
    /// Sample format names, empty when the codec does not advertise them
    pub sample_formats: Vec<String>,
    /// Sample rates in Hz, empty when any rate is accepted
    pub sample_rates: Vec<i32>,
    /// Channel layout descriptions, empty when any layout is accepted
    pub channel_layouts: Vec<String>,
}

impl EncoderCapabilities {
    /// Capabilities of the AAC encoder of this FFmpeg build.
    pub fn probe() -> Result<Self> {
        let codec = codec::encoder::find(codec::Id::AAC).ok_or_else(|| {
            TranscodeError::Ffmpeg(FfmpegError::EncoderNotFound(
                "AAC encoder not found in this FFmpeg build".into(),
            ))
        })?;
        Self::of(&codec)
    }

    fn of(codec: &ffmpeg::Codec) -> Result<Self> {
        let sample_formats = helpers::codec_sample_formats(codec)?
            .into_iter()
            .map(|f| f.name().to_string())
            .collect();
        let sample_rates = helpers::codec_sample_rates(codec)?;
        let channel_layouts = helpers::codec_channel_layouts(codec)?;

        Ok(Self {
            name: codec.name().to_string(),
            long_name: codec.description().to_string(),
            sample_formats,
            sample_rates,
            channel_layouts,
        })
    }

    /// Whether `rate` is accepted; an empty list accepts anything.
    pub fn supports_rate(&self, rate: u32) -> bool {
        self.sample_rates.is_empty() || self.sample_rates.contains(&(rate as i32))
    }
}

/// Check whether the FFmpeg build includes an AAC encoder.
pub fn is_aac_encoder_available() -> bool {
    codec::encoder::find(codec::Id::AAC).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENCODER_SAMPLE_FMT;
    use crate::transcode::engine::submit;
    use ffmpeg_next::util::channel_layout::ChannelLayout;

    #[test]
    fn test_aac_encoder_creation() {
        crate::ffmpeg_utils::init().unwrap();
        if !is_aac_encoder_available() {
            return;
        }
        let enc = AacEncoder::open(&EncodeConfig::default(), false);
        assert!(enc.is_ok(), "AAC encoder should open: {:?}", enc.err());
        let enc = enc.unwrap();
        assert_eq!(enc.frame_size(), AAC_FRAME_SIZE);
        assert_eq!(enc.time_base(), ffmpeg::Rational::new(1, 44100));
    }

    #[test]
    fn test_capabilities_accept_configured_rate() {
        crate::ffmpeg_utils::init().unwrap();
        if !is_aac_encoder_available() {
            return;
        }
        let caps = EncoderCapabilities::probe().unwrap();
        assert_eq!(caps.name, "aac");
        assert!(caps.supports_rate(44_100));
        assert!(caps.channel_layouts.iter().any(|l| l == "stereo"));
        if !caps.sample_formats.is_empty() {
            assert!(caps.sample_formats.iter().any(|f| f == "fltp"));
        }
    }

    #[test]
    fn test_supports_rate_empty_list() {
        let caps = EncoderCapabilities {
            name: "x".into(),
            long_name: "x".into(),
            sample_formats: vec![],
            sample_rates: vec![],
            channel_layouts: vec![],
        };
        assert!(caps.supports_rate(12_345));
    }

    #[test]
    fn test_encoder_delay_and_flush() {
        crate::ffmpeg_utils::init().unwrap();
        if !is_aac_encoder_available() {
            return;
        }
        let config = EncodeConfig::default();
        let mut enc = AacEncoder::open(&config, false).unwrap();

        let mut frame =
            ffmpeg::util::frame::Audio::new(ENCODER_SAMPLE_FMT, 1024, ChannelLayout::STEREO);
        frame.set_rate(config.sample_rate);
        for ch in 0..2 {
            helpers::audio_plane_data_mut(&mut frame, ch).fill(0);
        }

        let mut packet = ffmpeg::Packet::empty();
        let mut produced = 0;
        for i in 0..5 {
            frame.set_pts(Some(i * 1024));
            let stats = submit(&mut enc, Some(&frame), &mut packet, |_| Ok(())).unwrap();
            assert_eq!(stats.failed, 0);
            produced += stats.produced;
        }
        let flush = submit(&mut enc, None, &mut packet, |_| Ok(())).unwrap();
        assert!(flush.reached_eof);

        // Priming delay holds back at least one packet until the flush.
        assert!(produced < 5);
        assert!(produced + flush.produced >= 5);
    }
}
