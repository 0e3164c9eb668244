//! Audio transcoding module
//!
//! This module handles the codec side of both pipelines:
//! - The send/drain protocol shared by encoder and decoder
//! - AAC encoder initialization and capability listing
//! - Audio decoder initialization from source streams
//! - Sample format conversion between packed s16 and codec formats

pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod resampler;

pub use decoder::AudioDecoder;
pub use encoder::{is_aac_encoder_available, AacEncoder, EncoderCapabilities};
pub use engine::{submit, CodecEngine, DrainStats, Drained};
pub use resampler::{AudioResampler, AudioSpec};
