//! Decode pipeline
//!
//! `ContainerReader` → `AudioDecoder` → `AudioResampler` → raw file. The
//! first audio stream of the input is decoded and written as interleaved
//! s16 at its own sample rate and channel layout.

use ffmpeg_next as ffmpeg;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::PCM_SAMPLE_FMT;
use crate::container::ContainerReader;
use crate::error::{Result, TranscodeError};
use crate::ffmpeg_utils::helpers;
use crate::transcode::engine::submit;
use crate::transcode::{AudioDecoder, AudioResampler, AudioSpec};
use crate::types::DecodeSummary;

/// Decodes one input file to raw PCM.
#[derive(Debug, Default)]
pub struct DecodePipeline {
    /// Set once the first frame of the current run has been described.
    decoder_info_logged: bool,
}

impl DecodePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `input` into `output`.
    ///
    /// `output` is only created once the input, its audio stream, the
    /// decoder and the resampler are all set up, so a failed setup leaves
    /// nothing behind. Locals are declared in acquisition order and dropped
    /// in reverse: sink, resampler, frames, packet, decoder, input.
    pub fn run(&mut self, input: &Path, output: &Path) -> Result<DecodeSummary> {
        self.decoder_info_logged = false;

        // ── 1. Open and probe the input ────────────────────────────────────
        let mut reader = ContainerReader::open(input)?;
        let stream_index = reader.first_audio_stream()?;

        // ── 2. Open the decoder ────────────────────────────────────────────
        let mut decoder = {
            let stream = reader.stream(stream_index).ok_or_else(|| {
                TranscodeError::NoAudioStream(format!("{:?}: stream {}", input, stream_index))
            })?;
            AudioDecoder::open(&stream)?
        };

        let mut packet = ffmpeg::Packet::empty();
        let mut decoded = ffmpeg::util::frame::Audio::empty();
        let mut converted = ffmpeg::util::frame::Audio::empty();

        // ── 3. Resampler: native format → packed s16, same rate and layout ─
        let native = AudioSpec::new(
            decoder.format(),
            decoder.channel_layout(),
            decoder.sample_rate(),
        );
        let mut resampler = AudioResampler::new(native, native.with_format(PCM_SAMPLE_FMT))?;

        // ── 4. Output sink ─────────────────────────────────────────────────
        let mut sink = BufWriter::new(File::create(output)?);

        let mut summary = DecodeSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            codec: decoder.codec_name(),
            stream_index,
            sample_rate: decoder.sample_rate(),
            channels: decoder.channels(),
            ..Default::default()
        };
        let layout_name = decoder.layout_name();

        tracing::info!(
            input = ?input,
            stream_index,
            codec = %summary.codec,
            "decoding"
        );

        // ── 5. Read loop ───────────────────────────────────────────────────
        while reader.read_packet(&mut packet) {
            if packet.stream() == stream_index {
                summary.packets_read += 1;
                let stats = submit(&mut decoder, Some(&packet), &mut decoded, |frame| {
                    self.write_frame(
                        frame,
                        &layout_name,
                        &mut resampler,
                        &mut converted,
                        &mut sink,
                        &mut summary,
                    )
                })?;
                summary.decode_errors += stats.failed;
            }
            helpers::packet_unref(&mut packet);
        }

        // ── 6. Flush ───────────────────────────────────────────────────────
        let stats = submit(&mut decoder, None, &mut decoded, |frame| {
            self.write_frame(
                frame,
                &layout_name,
                &mut resampler,
                &mut converted,
                &mut sink,
                &mut summary,
            )
        })?;
        summary.decode_errors += stats.failed;

        sink.flush()?;

        tracing::info!(
            output = ?summary.output,
            frames = summary.frames_decoded,
            bytes = summary.bytes_written,
            errors = summary.decode_errors,
            duration_secs = summary.duration_secs(),
            "decode complete"
        );

        Ok(summary)
    }

    /// Convert one decoded frame to packed s16 and append it to the sink.
    ///
    /// A conversion failure loses that frame only; a write failure is fatal.
    fn write_frame<W: Write>(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
        layout_name: &str,
        resampler: &mut AudioResampler,
        converted: &mut ffmpeg::util::frame::Audio,
        sink: &mut W,
        summary: &mut DecodeSummary,
    ) -> Result<()> {
        summary.frames_decoded += 1;

        if !self.decoder_info_logged {
            tracing::info!(
                layout = layout_name,
                format = frame.format().name(),
                sample_rate = frame.rate(),
                "decoder output"
            );
            self.decoder_info_logged = true;
        }

        helpers::frame_unref(converted);
        if let Err(e) = resampler.convert(frame, converted) {
            tracing::warn!(frame = summary.frames_decoded, "dropping frame: {}", e);
            summary.decode_errors += 1;
            return Ok(());
        }

        let bytes = helpers::packed_audio_bytes(converted);
        sink.write_all(bytes)?;
        summary.samples_written += converted.samples() as u64;
        summary.bytes_written += bytes.len() as u64;

        tracing::trace!(
            frame = summary.frames_decoded,
            samples = converted.samples(),
            "frame written"
        );
        Ok(())
    }

    /// Whether the last run described its decoder output, which happens on
    /// its first decoded frame.
    pub fn decoder_info_logged(&self) -> bool {
        self.decoder_info_logged
    }
}
