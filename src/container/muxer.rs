//! Output container for the encode pipeline

use crate::container::WriterState;
use crate::error::{FfmpegError, Result};
use crate::ffmpeg_utils::helpers;
use crate::transcode::AacEncoder;
use ffmpeg_next as ffmpeg;
use std::path::{Path, PathBuf};

/// Writes one audio stream to a file.
///
/// The container format is guessed from the destination's extension when
/// the writer is created; the file itself is only opened by
/// [`write_header`](Self::write_header).
pub struct ContainerWriter {
    output: ffmpeg::format::context::Output,
    path: PathBuf,
    state: WriterState,
    stream_index: usize,
    stream_time_base: ffmpeg::Rational,
    packets_written: usize,
}

impl ContainerWriter {
    /// Allocate the output context for `path` without touching the file.
    pub fn create(path: &Path) -> Result<Self> {
        let output = helpers::alloc_output_context(path)?;
        tracing::debug!(
            path = ?path,
            format = %helpers::output_format_name(&output),
            "allocated output container"
        );
        Ok(Self {
            output,
            path: path.to_path_buf(),
            state: WriterState::Allocated,
            stream_index: 0,
            stream_time_base: ffmpeg::Rational::new(0, 1),
            packets_written: 0,
        })
    }

    /// Whether the container wants codec extradata in a global header.
    pub fn needs_global_header(&self) -> bool {
        self.output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER)
    }

    /// Add the audio stream fed by `encoder`.
    ///
    /// The stream time base is set before the codec parameters are copied.
    pub fn add_audio_stream(&mut self, encoder: &AacEncoder) -> Result<usize> {
        self.state.check_add_stream()?;
        let params = encoder.codec_parameters()?;

        let mut out_stream = self
            .output
            .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::AAC))
            .map_err(|e| FfmpegError::StreamConfig(format!("Failed to add audio stream: {}", e)))?;

        out_stream.set_time_base(encoder.time_base());
        out_stream.set_parameters(params);

        self.stream_index = out_stream.index();
        self.stream_time_base = encoder.time_base();

        tracing::debug!(
            stream_index = self.stream_index,
            time_base = %self.stream_time_base,
            "added audio stream"
        );
        Ok(self.stream_index)
    }

    /// Open the destination file and write the container header.
    ///
    /// The muxer may replace the stream time base; the value it settles on is
    /// what packets are rescaled to afterwards.
    pub fn write_header(&mut self) -> Result<()> {
        self.state.check_header()?;
        helpers::open_output_io(&mut self.output, &self.path)?;
        self.output
            .write_header()
            .map_err(|e| FfmpegError::WriteHeader(format!("{:?}: {}", self.path, e)))?;

        if let Some(stream) = self.output.stream(self.stream_index) {
            self.stream_time_base = stream.time_base();
        }
        self.state = WriterState::HeaderWritten;

        tracing::info!(
            path = ?self.path,
            format = %helpers::output_format_name(&self.output),
            time_base = %self.stream_time_base,
            "container header written"
        );
        Ok(())
    }

    /// Rescale `packet` from `codec_time_base` to the stream time base and
    /// write it interleaved.
    pub fn write_packet(
        &mut self,
        packet: &mut ffmpeg::Packet,
        codec_time_base: ffmpeg::Rational,
    ) -> Result<()> {
        self.state.check_packet()?;

        packet.rescale_ts(codec_time_base, self.stream_time_base);
        packet.set_stream(self.stream_index);
        packet.set_position(-1);

        tracing::trace!(
            pts = ?packet.pts(),
            duration = packet.duration(),
            size = packet.size(),
            "writing packet"
        );

        packet
            .write_interleaved(&mut self.output)
            .map_err(|e| FfmpegError::WritePacket(format!("Failed to write packet: {}", e)))?;

        self.packets_written += 1;
        self.state = WriterState::Streaming;
        Ok(())
    }

    /// Flush interleaving queues and write the trailer. Allowed once.
    pub fn write_trailer(&mut self) -> Result<()> {
        self.state.check_trailer()?;
        // Whatever happens, the trailer is not attempted twice.
        self.state = WriterState::TrailerWritten;
        self.output
            .write_trailer()
            .map_err(|e| FfmpegError::WriteTrailer(format!("{:?}: {}", self.path, e)))?;

        tracing::info!(
            path = ?self.path,
            packets = self.packets_written,
            "container trailer written"
        );
        Ok(())
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn packets_written(&self) -> usize {
        self.packets_written
    }

    /// Short name of the container format, e.g. `"adts"` or `"ipod"`.
    pub fn format_name(&self) -> String {
        helpers::output_format_name(&self.output)
    }
}
