//! Audio decoder for the decode pipeline
//!
//! Wraps an FFmpeg `AVCodecContext` to decode compressed audio packets
//! (AAC, MP3, Opus, FLAC, …) into raw PCM `AVFrame`s.

use crate::error::{FfmpegError, Result, TranscodeError};
use crate::ffmpeg_utils::{helpers, layout_or_default};
use crate::transcode::engine::{CodecEngine, Drained};
use ffmpeg_next as ffmpeg;

/// Real audio decoder backed by a FFmpeg codec context
pub struct AudioDecoder {
    /// The FFmpeg decoder context
    decoder: ffmpeg::decoder::Audio,
    /// Stream index in the source file
    stream_index: usize,
}

impl AudioDecoder {
    /// Open a decoder for the given stream.
    ///
    /// Uses the stream's own codec parameters to initialise the context so no
    /// external configuration is needed.
    pub fn open(stream: &ffmpeg::format::stream::Stream) -> Result<Self> {
        let stream_index = stream.index();
        let codec_id = stream.parameters().id();
        let codec = ffmpeg::codec::decoder::find(codec_id).ok_or_else(|| {
            TranscodeError::Ffmpeg(FfmpegError::DecoderNotFound(format!("{:?}", codec_id)))
        })?;

        let context =
            ffmpeg::codec::Context::from_parameters(stream.parameters()).map_err(|e| {
                TranscodeError::Ffmpeg(FfmpegError::DecoderCreate(format!(
                    "Failed to create codec context for stream {}: {}",
                    stream_index, e
                )))
            })?;

        let decoder = context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.audio())
            .map_err(|e| {
                TranscodeError::Ffmpeg(FfmpegError::DecoderCreate(format!(
                    "Failed to open audio decoder for stream {}: {}",
                    stream_index, e
                )))
            })?;

        tracing::info!(
            stream_index,
            codec = codec.name(),
            profile = helpers::codec_context_profile(&decoder),
            "decoder opened"
        );

        Ok(Self {
            decoder,
            stream_index,
        })
    }

    /// Name of the codec being decoded.
    pub fn codec_name(&self) -> String {
        self.decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| format!("{:?}", self.decoder.id()))
    }

    /// Sample rate of decoded frames.
    pub fn sample_rate(&self) -> u32 {
        self.decoder.rate()
    }

    /// Channel count of decoded frames.
    pub fn channels(&self) -> u16 {
        self.decoder.channels()
    }

    /// Sample format of decoded frames.
    pub fn format(&self) -> ffmpeg::util::format::sample::Sample {
        self.decoder.format()
    }

    /// Channel layout of decoded frames, defaulted from the channel count
    /// when the stream leaves it unset.
    pub fn channel_layout(&self) -> ffmpeg::util::channel_layout::ChannelLayout {
        layout_or_default(self.decoder.channel_layout(), self.decoder.channels())
    }

    /// Human readable channel layout, e.g. `"stereo"`.
    pub fn layout_name(&self) -> String {
        helpers::codec_context_layout_name(&self.decoder)
    }
}

impl CodecEngine for AudioDecoder {
    type Input = ffmpeg::Packet;
    type Output = ffmpeg::util::frame::Audio;

    /// `None` sends the empty packet that puts the decoder in draining mode.
    fn send(&mut self, packet: Option<&ffmpeg::Packet>) -> Result<()> {
        let sent = match packet {
            Some(packet) => self.decoder.send_packet(packet),
            None => self.decoder.send_eof(),
        };
        match sent {
            Ok(()) => Ok(()),
            // Already drained; the receive side reports end of stream.
            Err(ffmpeg::Error::Eof) if packet.is_none() => Ok(()),
            Err(e) => Err(TranscodeError::Ffmpeg(FfmpegError::SendPacket(format!(
                "send_packet error on stream {}: {}",
                self.stream_index, e
            )))),
        }
    }

    fn receive(&mut self, frame: &mut ffmpeg::util::frame::Audio) -> Result<Drained> {
        match self.decoder.receive_frame(frame) {
            Ok(()) => Ok(Drained::Ready),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                Ok(Drained::WouldBlock)
            }
            Err(ffmpeg::Error::Eof) => Ok(Drained::EndOfStream),
            Err(e) => Err(TranscodeError::Ffmpeg(FfmpegError::ReceiveFrame(format!(
                "receive_frame error on stream {}: {}",
                self.stream_index, e
            )))),
        }
    }

    fn release(frame: &mut ffmpeg::util::frame::Audio) {
        helpers::frame_unref(frame);
    }
}
