//! Test fixtures for integration tests
//!
//! Generates raw PCM in memory so no media files need to be checked in.

use std::path::{Path, PathBuf};

/// Interleaved s16le stereo sine, left and right a fifth apart.
pub fn stereo_sine(frames: usize, sample_rate: u32, amplitude: i16) -> Vec<u8> {
    let mut out = Vec::with_capacity(frames * 4);
    for n in 0..frames {
        let t = n as f64 / sample_rate as f64;
        let left = (amplitude as f64 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16;
        let right = (amplitude as f64 * (2.0 * std::f64::consts::PI * 660.0 * t).sin()) as i16;
        out.extend_from_slice(&left.to_le_bytes());
        out.extend_from_slice(&right.to_le_bytes());
    }
    out
}

/// Write `data` to `dir/name` and return the path.
pub fn write_pcm(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Initialize FFmpeg and report whether the build can encode AAC.
///
/// FFmpeg-backed tests return early when this is false.
pub fn aac_available() -> bool {
    crate::ffmpeg_utils::init().unwrap();
    let available = crate::transcode::is_aac_encoder_available();
    if !available {
        eprintln!("skipping: no AAC encoder in this FFmpeg build");
    }
    available
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sine_layout() {
        let pcm = stereo_sine(100, 44_100, 10_000);
        assert_eq!(pcm.len(), 400);
        // First sample of both channels is sin(0) = 0.
        assert_eq!(&pcm[..4], &[0, 0, 0, 0]);
        assert!(pcm.iter().any(|&b| b != 0));
    }
}
