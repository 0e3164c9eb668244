//! Input container for the decode pipeline

use crate::error::{FfmpegError, Result, TranscodeError};
use crate::ffmpeg_utils::{debug_stream_info, ffmpeg};
use std::path::{Path, PathBuf};

/// An opened input file with known stream information.
pub struct ContainerReader {
    input: ffmpeg::format::context::Input,
    path: PathBuf,
}

impl ContainerReader {
    /// Open `path` and probe its streams.
    ///
    /// Fails when the file cannot be opened or holds nothing FFmpeg can
    /// recognize, an empty file included.
    pub fn open(path: &Path) -> Result<Self> {
        let input = ffmpeg::format::input(path)
            .map_err(|e| FfmpegError::OpenInput(format!("{:?}: {}", path, e)))?;

        if input.nb_streams() == 0 {
            return Err(FfmpegError::FindStreamInfo(format!("{:?}: no streams", path)).into());
        }

        for (index, stream) in input.streams().enumerate() {
            debug_stream_info(&stream, index);
        }
        tracing::debug!(
            path = ?path,
            format = input.format().name(),
            streams = input.nb_streams(),
            "opened input container"
        );

        Ok(Self {
            input,
            path: path.to_path_buf(),
        })
    }

    /// Index of the first audio stream.
    pub fn first_audio_stream(&self) -> Result<usize> {
        self.input
            .streams()
            .find(|s| s.parameters().medium() == ffmpeg::media::Type::Audio)
            .map(|s| s.index())
            .ok_or_else(|| TranscodeError::NoAudioStream(self.path.display().to_string()))
    }

    pub fn stream(&self, index: usize) -> Option<ffmpeg::format::stream::Stream<'_>> {
        self.input.stream(index)
    }

    /// Read the next packet of any stream into `packet`.
    ///
    /// Returns `false` once the input is exhausted. Read errors other than
    /// end of file are logged and also end the input.
    pub fn read_packet(&mut self, packet: &mut ffmpeg::Packet) -> bool {
        match packet.read(&mut self.input) {
            Ok(()) => true,
            Err(ffmpeg::Error::Eof) => false,
            Err(e) => {
                tracing::warn!(path = ?self.path, "read error, treating as end of input: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_fails_to_open() {
        crate::ffmpeg_utils::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.aac");
        std::fs::write(&path, b"").unwrap();
        assert!(ContainerReader::open(&path).is_err());
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        crate::ffmpeg_utils::init().unwrap();
        let err = ContainerReader::open(Path::new("/definitely/not/here.m4a"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TranscodeError::Ffmpeg(FfmpegError::OpenInput(_))
        ));
    }
}
