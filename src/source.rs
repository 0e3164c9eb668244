//! Raw PCM input
//!
//! A `PcmSource` hands the encode pipeline one finite, fully buffered block
//! of interleaved signed 16-bit samples. `PcmChunker` slices that block into
//! encoder-sized chunks, zero-padding the last one.

use bytes::{Buf, Bytes};
use std::path::{Path, PathBuf};

use crate::error::{Result, TranscodeError};

/// Supplier of a complete raw PCM buffer.
pub trait PcmSource {
    /// Load the whole input. Called once per encode run.
    fn load(&mut self) -> Result<Bytes>;

    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// PCM read from a file on disk
#[derive(Debug, Clone)]
pub struct FilePcmSource {
    path: PathBuf,
}

impl FilePcmSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PcmSource for FilePcmSource {
    fn load(&mut self) -> Result<Bytes> {
        let data = std::fs::read(&self.path)?;
        tracing::info!(path = ?self.path, bytes = data.len(), "loaded PCM source");
        Ok(Bytes::from(data))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// PCM already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPcmSource {
    data: Bytes,
}

impl MemoryPcmSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl PcmSource for MemoryPcmSource {
    fn load(&mut self) -> Result<Bytes> {
        // Bytes clones are reference counted, the buffer itself is shared.
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.data.len())
    }
}

/// Slices a raw buffer into fixed-size chunks for the encoder.
///
/// The cursor and the remaining count always move together by the number of
/// bytes actually copied, so a trailing partial chunk is still emitted.
#[derive(Debug)]
pub struct PcmChunker {
    data: Bytes,
    chunk_bytes: usize,
    emitted: usize,
}

impl PcmChunker {
    pub fn new(data: Bytes, chunk_bytes: usize) -> Result<Self> {
        if chunk_bytes == 0 {
            return Err(TranscodeError::InvalidInput(
                "chunk size must be non-zero".into(),
            ));
        }
        Ok(Self {
            data,
            chunk_bytes,
            emitted: 0,
        })
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    /// Number of chunks emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Total number of chunks the input yields: ceil(len / chunk_bytes).
    pub fn chunk_count(&self) -> usize {
        self.emitted + self.remaining().div_ceil(self.chunk_bytes)
    }

    /// Fill `scratch` with the next chunk.
    ///
    /// The whole of `scratch` is zeroed first, then up to `chunk_bytes` bytes
    /// are copied to its start. Returns the number of bytes copied, or `None`
    /// once the input is exhausted.
    pub fn next_chunk(&mut self, scratch: &mut [u8]) -> Option<usize> {
        if !self.data.has_remaining() {
            return None;
        }
        scratch.fill(0);

        let copy_amount = self.chunk_bytes.min(self.data.remaining()).min(scratch.len());
        self.data.copy_to_slice(&mut scratch[..copy_amount]);
        self.emitted += 1;

        if copy_amount < self.chunk_bytes {
            tracing::warn!(
                copy_amount,
                chunk_bytes = self.chunk_bytes,
                "short final chunk, zero-padding the remainder"
            );
        }
        Some(copy_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count_exact_multiple() {
        let chunker = PcmChunker::new(Bytes::from(vec![1u8; 4096 * 3]), 4096).unwrap();
        assert_eq!(chunker.chunk_count(), 3);
    }

    #[test]
    fn test_chunk_count_rounds_up() {
        for (len, expected) in [(0, 0), (1, 1), (4095, 1), (4097, 2), (10_000, 3)] {
            let chunker = PcmChunker::new(Bytes::from(vec![1u8; len]), 4096).unwrap();
            assert_eq!(chunker.chunk_count(), expected, "len={}", len);
        }
    }

    #[test]
    fn test_partial_final_chunk_is_zero_padded() {
        let mut chunker = PcmChunker::new(Bytes::from(vec![0x7fu8; 4096 + 100]), 4096).unwrap();
        let mut scratch = vec![0xAAu8; 4096];

        assert_eq!(chunker.next_chunk(&mut scratch), Some(4096));
        assert!(scratch.iter().all(|&b| b == 0x7f));

        assert_eq!(chunker.next_chunk(&mut scratch), Some(100));
        assert!(scratch[..100].iter().all(|&b| b == 0x7f));
        assert!(scratch[100..].iter().all(|&b| b == 0));

        assert_eq!(chunker.next_chunk(&mut scratch), None);
        assert_eq!(chunker.emitted(), 2);
    }

    #[test]
    fn test_submissions_match_chunk_count() {
        // Remaining count and cursor move together, so the loop never ends
        // a chunk early on inputs that are not a multiple of the chunk size.
        let len = 4096 * 5 + 7;
        let mut chunker = PcmChunker::new(Bytes::from(vec![3u8; len]), 4096).unwrap();
        let expected = chunker.chunk_count();
        let mut scratch = vec![0u8; 4096];
        let mut copied = 0;
        let mut submissions = 0;
        while let Some(n) = chunker.next_chunk(&mut scratch) {
            copied += n;
            submissions += 1;
        }
        assert_eq!(submissions, expected);
        assert_eq!(submissions, 6);
        assert_eq!(copied, len);
        assert_eq!(chunker.remaining(), 0);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut chunker = PcmChunker::new(Bytes::new(), 4096).unwrap();
        let mut scratch = vec![9u8; 16];
        assert_eq!(chunker.next_chunk(&mut scratch), None);
        // Scratch untouched when nothing is emitted
        assert!(scratch.iter().all(|&b| b == 9));
    }

    #[test]
    fn test_scratch_larger_than_chunk_is_fully_zeroed() {
        // Frame planes can be padded beyond the chunk size.
        let mut chunker = PcmChunker::new(Bytes::from(vec![5u8; 8]), 8).unwrap();
        let mut scratch = vec![0xFFu8; 32];
        assert_eq!(chunker.next_chunk(&mut scratch), Some(8));
        assert!(scratch[..8].iter().all(|&b| b == 5));
        assert!(scratch[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = PcmChunker::new(Bytes::from(vec![1u8; 16]), 0);
        assert!(matches!(result, Err(TranscodeError::InvalidInput(_))));
    }

    #[test]
    fn test_memory_source_roundtrip() {
        let mut source = MemoryPcmSource::new(vec![1u8, 2, 3, 4]);
        let data = source.load().unwrap();
        assert_eq!(&data[..], &[1, 2, 3, 4]);
        assert!(source.describe().contains("4 bytes"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FilePcmSource::new("/definitely/not/here.pcm");
        assert!(source.load().is_err());
    }
}
