use std::path::Path;

use crate::adts::{self, AdtsSummary};
use crate::config::EncodeConfig;
use crate::error::Result;
use crate::ffmpeg_utils;
use crate::pipeline::{DecodePipeline, EncodePipeline};
use crate::source::{FilePcmSource, PcmSource};
use crate::transcode::EncoderCapabilities;
use crate::types::{DecodeSummary, EncodeSummary};

/// Encode raw interleaved s16 stereo PCM at 44.1 kHz into an AAC file.
///
/// The container follows the extension of `dest`: `.aac` writes ADTS,
/// `.m4a` and `.mp4` write MP4.
pub fn encode<S: PcmSource>(mut source: S, dest: &Path) -> Result<EncodeSummary> {
    ffmpeg_utils::init()?;
    EncodePipeline::new(EncodeConfig::default()).run(&mut source, dest)
}

/// Encode a raw PCM file on disk.
pub fn encode_file(input: &Path, dest: &Path) -> Result<EncodeSummary> {
    encode(FilePcmSource::new(input), dest)
}

/// Decode the first audio stream of `input` into raw interleaved s16 PCM.
pub fn decode(input: &Path, output: &Path) -> Result<DecodeSummary> {
    ffmpeg_utils::init()?;
    DecodePipeline::new().run(input, output)
}

/// Walk the ADTS frames of a raw `.aac` file.
pub fn inspect_adts(path: &Path) -> Result<AdtsSummary> {
    let data = std::fs::read(path)?;
    adts::scan(&data)
}

/// What the AAC encoder of the linked FFmpeg accepts.
pub fn encoder_capabilities() -> Result<EncoderCapabilities> {
    ffmpeg_utils::init()?;
    EncoderCapabilities::probe()
}
