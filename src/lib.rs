//! Raw PCM ⇄ AAC transcoding on top of FFmpeg.
//!
//! The encode pipeline turns interleaved signed 16-bit PCM into a single
//! AAC-LC stream (44.1 kHz, stereo, 96 kbps) inside an ADTS or MP4 file. The
//! decode pipeline turns the first audio stream of any file FFmpeg can read
//! back into interleaved signed 16-bit PCM.

pub mod adts;
pub(crate) mod api;
pub mod config;
pub mod container;
pub mod error;
pub mod ffmpeg_utils;
pub mod pipeline;
pub mod source;
pub mod transcode;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use adts::{AdtsHeader, AdtsSummary};
pub use api::*;
pub use config::{EncodeConfig, LogFormat};
pub use error::{FfmpegError, Result, TranscodeError};
pub use ffmpeg_utils::version_info as ffmpeg_version_info;
pub use ffmpeg_utils::{init, install_log_filter};
pub use source::{FilePcmSource, MemoryPcmSource, PcmSource};
pub use transcode::{is_aac_encoder_available, EncoderCapabilities};
pub use types::{DecodeSummary, EncodeSummary};
