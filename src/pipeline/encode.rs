//! Encode pipeline
//!
//! Raw interleaved s16 PCM → `AudioResampler` → `AacEncoder` →
//! `ContainerWriter`. The input is cut into encoder-sized chunks, the last
//! one zero-padded, and every chunk becomes one encoder frame.

use ffmpeg_next as ffmpeg;
use std::path::Path;

use crate::config::{EncodeConfig, PCM_SAMPLE_FMT};
use crate::container::ContainerWriter;
use crate::error::Result;
use crate::ffmpeg_utils::helpers;
use crate::source::{PcmChunker, PcmSource};
use crate::transcode::engine::{submit, CodecEngine, DrainStats};
use crate::transcode::{AacEncoder, AudioResampler, AudioSpec};
use crate::types::EncodeSummary;

/// Runs PCM sources through the AAC encoder into container files.
#[derive(Debug, Clone, Default)]
pub struct EncodePipeline {
    config: EncodeConfig,
}

impl EncodePipeline {
    pub fn new(config: EncodeConfig) -> Self {
        Self { config }
    }

    /// Encode everything `source` holds into `dest`.
    ///
    /// Setup failures abort before the destination is opened. Once the
    /// header is written, per-chunk failures are logged and counted, the
    /// encoder is flushed once and the trailer is always attempted.
    pub fn run<S: PcmSource + ?Sized>(&self, source: &mut S, dest: &Path) -> Result<EncodeSummary> {
        let config = &self.config;

        // ── 1. Load the raw input ──────────────────────────────────────────
        let data = source.load()?;
        let pcm_frame_bytes = config.pcm_frame_bytes();
        if data.len() % pcm_frame_bytes != 0 {
            tracing::warn!(
                bytes = data.len(),
                pcm_frame_bytes,
                "input is not a whole number of sample frames, the tail is zero-padded"
            );
        }

        // ── 2. Configure the encoder and the output stream ─────────────────
        let mut writer = ContainerWriter::create(dest)?;
        let mut encoder = AacEncoder::open(config, writer.needs_global_header())?;
        writer.add_audio_stream(&encoder)?;

        // ── 3. Working buffers ─────────────────────────────────────────────
        let frame_size = encoder.frame_size();
        let chunk_bytes = config.chunk_bytes(frame_size);
        let layout = config.channel_layout();

        let mut frame = ffmpeg::util::frame::Audio::new(config.sample_format(), frame_size, layout);
        frame.set_rate(config.sample_rate);
        let mut scratch = ffmpeg::util::frame::Audio::new(PCM_SAMPLE_FMT, frame_size, layout);
        scratch.set_rate(config.sample_rate);

        let pcm_spec = AudioSpec::new(PCM_SAMPLE_FMT, layout, config.sample_rate);
        let mut resampler =
            AudioResampler::new(pcm_spec, pcm_spec.with_format(config.sample_format()))?;
        let mut packet = ffmpeg::Packet::empty();

        let mut chunker = PcmChunker::new(data, chunk_bytes)?;
        let mut summary = EncodeSummary {
            source: source.describe(),
            output: dest.to_path_buf(),
            container: writer.format_name(),
            sample_rate: config.sample_rate,
            channels: config.channels,
            bit_rate: config.bit_rate,
            frame_size,
            chunk_bytes,
            input_bytes: chunker.remaining(),
            ..Default::default()
        };

        tracing::info!(
            source = %summary.source,
            bytes = summary.input_bytes,
            frame_size,
            chunk_bytes,
            chunks = chunker.chunk_count(),
            "encoding"
        );

        // ── 4. Header, strictly after every parameter is final ─────────────
        writer.write_header()?;

        // ── 5. Frame loop ──────────────────────────────────────────────────
        let codec_time_base = encoder.time_base();
        let mut write_failures = 0;
        let mut drained = DrainStats::default();
        let mut pts: i64 = 0;

        while let Some(copied) = chunker.next_chunk(helpers::audio_plane_data_mut(&mut scratch, 0)) {
            let chunk = chunker.emitted();
            tracing::debug!(chunk, copied, remaining = chunker.remaining(), "chunk read");

            if let Err(e) = convert_chunk(&mut resampler, &scratch, &mut frame) {
                tracing::warn!(chunk, "skipping chunk: {}", e);
                summary.failed_units += 1;
                continue;
            }

            frame.set_pts(Some(pts));
            pts += frame.samples() as i64;
            summary.frames_submitted += 1;

            let stats = drain_to_writer(
                &mut encoder,
                Some(&frame),
                &mut packet,
                &mut writer,
                codec_time_base,
                &mut write_failures,
            );
            drained.merge(stats);
        }

        // ── 6. Flush, exactly once ─────────────────────────────────────────
        let stats = drain_to_writer(
            &mut encoder,
            None,
            &mut packet,
            &mut writer,
            codec_time_base,
            &mut write_failures,
        );
        tracing::debug!(
            packets = stats.produced,
            reached_eof = stats.reached_eof,
            "encoder flushed"
        );
        drained.merge(stats);

        // ── 7. Trailer ─────────────────────────────────────────────────────
        writer.write_trailer()?;

        summary.samples = pts as u64;
        summary.packets_written = writer.packets_written();
        summary.failed_units += drained.failed + write_failures;

        tracing::info!(
            output = ?summary.output,
            frames = summary.frames_submitted,
            packets = summary.packets_written,
            failed = summary.failed_units,
            duration_secs = summary.duration_secs(),
            "encode complete"
        );

        Ok(summary)
    }
}

/// Refill the encoder frame from the packed s16 scratch frame.
fn convert_chunk(
    resampler: &mut AudioResampler,
    scratch: &ffmpeg::util::frame::Audio,
    frame: &mut ffmpeg::util::frame::Audio,
) -> Result<()> {
    // The encoder may still reference the previous frame's buffers.
    helpers::frame_make_writable(frame)?;
    resampler.convert(scratch, frame)
}

/// Submit `input` and write every packet it yields.
///
/// A failed write ends this drain pass: it is logged and counted, and
/// packets still queued in the encoder come out on the next pass.
fn drain_to_writer<E>(
    encoder: &mut E,
    input: Option<&E::Input>,
    packet: &mut ffmpeg::Packet,
    writer: &mut ContainerWriter,
    codec_time_base: ffmpeg::Rational,
    write_failures: &mut usize,
) -> DrainStats
where
    E: CodecEngine<Output = ffmpeg::Packet>,
{
    let mut retrieved = 0;
    let result = submit(encoder, input, packet, |packet| {
        retrieved += 1;
        writer.write_packet(packet, codec_time_base)
    });
    match result {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!("dropping packet, ending this drain pass: {}", e);
            *write_failures += 1;
            DrainStats {
                produced: retrieved,
                attempts: retrieved,
                ..Default::default()
            }
        }
    }
}
