//! The two transcoding pipelines
//!
//! - `encode`: raw s16 PCM → AAC in a container file
//! - `decode`: compressed audio file → raw s16 PCM

pub mod decode;
pub mod encode;

pub use decode::DecodePipeline;
pub use encode::EncodePipeline;
