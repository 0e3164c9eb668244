use thiserror::Error;

/// Main error type for the transcoder
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// An error originating from the underlying FFmpeg library
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    /// A standard I/O error (reading the PCM source, writing the PCM sink)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input container holds no audio stream
    #[error("No audio stream found in {0}")]
    NoAudioStream(String),

    /// The caller handed us something we cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The container writer was driven out of order
    #[error("Container error: {0}")]
    Container(String),

    /// A malformed ADTS bitstream
    #[error("ADTS error: {0}")]
    Adts(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    /// Failure during global FFmpeg initialization
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    /// Failure opening an input media file
    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    /// Failure locating stream information within a file
    #[error("Failed to find stream info: {0}")]
    FindStreamInfo(String),

    /// The requested decoder for a specific codec ID was not found
    #[error("Failed to find decoder: codec_id={0}")]
    DecoderNotFound(String),

    /// Failure instantiating or opening a decoder
    #[error("Failed to create decoder: {0}")]
    DecoderCreate(String),

    /// The requested encoder for a specific codec ID was not found
    #[error("Failed to find encoder: codec_id={0}")]
    EncoderNotFound(String),

    /// Failure instantiating or opening an encoder
    #[error("Failed to create encoder: {0}")]
    EncoderCreate(String),

    /// Failure creating an audio resampler
    #[error("Failed to create resampler: {0}")]
    ResamplerCreate(String),

    /// Failure converting one frame through the resampler
    #[error("Resampling error: {0}")]
    Resample(String),

    /// Failure allocating an output format context
    #[error("Failed to create muxer: {0}")]
    MuxerCreate(String),

    /// Failure configuring stream contexts or parameters
    #[error("Stream configuration failed: {0}")]
    StreamConfig(String),

    /// Failure opening the destination file for writing
    #[error("Failed to open output: {0}")]
    OpenOutput(String),

    /// Failure writing the container header
    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    /// Failure writing a media packet to the container
    #[error("Failed to write packet: {0}")]
    WritePacket(String),

    /// Failure writing the container trailer
    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),

    /// The encoder refused a frame (or the end-of-stream marker)
    #[error("Failed to send frame: {0}")]
    SendFrame(String),

    /// The decoder refused a packet (or the end-of-stream marker)
    #[error("Failed to send packet: {0}")]
    SendPacket(String),

    /// Retrieving an encoded packet failed
    #[error("Failed to receive packet: {0}")]
    ReceivePacket(String),

    /// Retrieving a decoded frame failed
    #[error("Failed to receive frame: {0}")]
    ReceiveFrame(String),

    /// Failure allocating or re-acquiring a frame buffer
    #[error("Frame allocation failed: {0}")]
    FrameAlloc(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TranscodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_error_wraps_into_transcode_error() {
        let err: TranscodeError = FfmpegError::EncoderNotFound("aac".into()).into();
        assert_eq!(
            err.to_string(),
            "FFmpeg error: Failed to find encoder: codec_id=aac"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pcm");
        let err: TranscodeError = io.into();
        assert!(matches!(err, TranscodeError::Io(_)));
    }
}
