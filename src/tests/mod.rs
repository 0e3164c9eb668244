//! Integration testing module
//!
//! End-to-end tests that run both pipelines against real FFmpeg:
//! - Encode scenarios: one frame, empty input, odd lengths, idempotence
//! - Decode failure policy on unusable inputs
//! - Encode → decode round trips

pub mod encode;
pub mod fixtures;
