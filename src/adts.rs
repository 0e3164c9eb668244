//! ADTS (Audio Data Transport Stream) framing
//!
//! Every raw AAC frame in an `.aac` file is preceded by a 7-byte header
//! (9 bytes when a CRC is present) carrying the profile, sampling frequency
//! index and channel configuration. The encode pipeline lets FFmpeg's `adts`
//! muxer write these; this module parses them so that an output file can be
//! inspected without going through a demuxer.

use serde::Serialize;

use crate::error::{Result, TranscodeError};

/// Length of a header without CRC
pub const ADTS_HEADER_LEN: usize = 7;
/// Length of a header with CRC
pub const ADTS_HEADER_LEN_CRC: usize = 9;
/// PCM samples per channel carried by one raw data block
pub const SAMPLES_PER_RAW_BLOCK: u64 = 1024;

const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Index of `rate` in the MPEG-4 sampling frequency table.
pub fn sampling_frequency_index(rate: u32) -> Option<u8> {
    SAMPLING_FREQUENCIES
        .iter()
        .position(|&r| r == rate)
        .map(|i| i as u8)
}

/// Sample rate for a sampling frequency index.
pub fn sampling_frequency(index: u8) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}

/// MPEG version flag of the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MpegVersion {
    Mpeg4,
    Mpeg2,
}

/// A decoded ADTS fixed + variable header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub version: MpegVersion,
    pub protection_absent: bool,
    /// MPEG-4 audio object type (2 = AAC LC)
    pub object_type: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
    /// Total frame length, header included
    pub frame_length: usize,
    pub buffer_fullness: u16,
    /// Number of raw data blocks in the frame
    pub raw_blocks: u8,
}

impl AdtsHeader {
    /// Header length in bytes.
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_LEN
        } else {
            ADTS_HEADER_LEN_CRC
        }
    }

    /// Payload length in bytes (frame minus header).
    pub fn payload_len(&self) -> usize {
        self.frame_length.saturating_sub(self.header_len())
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sampling_frequency(self.sampling_index)
    }

    /// PCM samples per channel this frame decodes to.
    pub fn samples(&self) -> u64 {
        self.raw_blocks as u64 * SAMPLES_PER_RAW_BLOCK
    }

    /// Parse a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ADTS_HEADER_LEN {
            return Err(TranscodeError::Adts(format!(
                "need {} bytes for a header, got {}",
                ADTS_HEADER_LEN,
                data.len()
            )));
        }
        if data[0] != 0xFF || data[1] & 0xF6 != 0xF0 {
            return Err(TranscodeError::Adts(format!(
                "bad syncword {:02x}{:02x}",
                data[0], data[1]
            )));
        }

        let version = if data[1] & 0x08 != 0 {
            MpegVersion::Mpeg2
        } else {
            MpegVersion::Mpeg4
        };
        let protection_absent = data[1] & 0x01 != 0;
        let object_type = (data[2] >> 6) + 1;
        let sampling_index = (data[2] >> 2) & 0x0F;
        let channel_config = ((data[2] & 0x01) << 2) | (data[3] >> 6);
        let frame_length = (((data[3] & 0x03) as usize) << 11)
            | ((data[4] as usize) << 3)
            | ((data[5] >> 5) as usize);
        let buffer_fullness = (((data[5] & 0x1F) as u16) << 6) | ((data[6] >> 2) as u16);
        let raw_blocks = (data[6] & 0x03) + 1;

        let header = Self {
            version,
            protection_absent,
            object_type,
            sampling_index,
            channel_config,
            frame_length,
            buffer_fullness,
            raw_blocks,
        };
        if header.sample_rate().is_none() {
            return Err(TranscodeError::Adts(format!(
                "reserved sampling frequency index {}",
                sampling_index
            )));
        }
        if frame_length < header.header_len() {
            return Err(TranscodeError::Adts(format!(
                "frame length {} shorter than its header",
                frame_length
            )));
        }
        Ok(header)
    }
}

/// What an ADTS stream declares, summed over all of its frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdtsSummary {
    pub frames: usize,
    pub object_type: u8,
    pub sample_rate: u32,
    pub channels: u8,
    /// PCM samples per channel the stream decodes to
    pub samples: u64,
    pub payload_bytes: usize,
    pub duration_secs: f64,
}

/// Walk every frame of an ADTS stream.
///
/// Fails on sync loss, on a truncated last frame, or when the declared
/// profile, rate or channel configuration changes mid-stream.
pub fn scan(data: &[u8]) -> Result<AdtsSummary> {
    let mut pos = 0;
    let mut first: Option<AdtsHeader> = None;
    let mut frames = 0;
    let mut samples = 0u64;
    let mut payload_bytes = 0;

    while pos < data.len() {
        let header = AdtsHeader::parse(&data[pos..])
            .map_err(|e| TranscodeError::Adts(format!("frame {} at offset {}: {}", frames, pos, e)))?;
        if pos + header.frame_length > data.len() {
            return Err(TranscodeError::Adts(format!(
                "frame {} at offset {} truncated ({} of {} bytes)",
                frames,
                pos,
                data.len() - pos,
                header.frame_length
            )));
        }

        match first {
            None => first = Some(header),
            Some(f) => {
                if f.object_type != header.object_type
                    || f.sampling_index != header.sampling_index
                    || f.channel_config != header.channel_config
                {
                    return Err(TranscodeError::Adts(format!(
                        "stream parameters change at frame {}",
                        frames
                    )));
                }
            }
        }

        frames += 1;
        samples += header.samples();
        payload_bytes += header.payload_len();
        pos += header.frame_length;
    }

    let first = first.ok_or_else(|| TranscodeError::Adts("no ADTS frames found".into()))?;
    let sample_rate = first.sample_rate().unwrap_or_default();

    Ok(AdtsSummary {
        frames,
        object_type: first.object_type,
        sample_rate,
        channels: first.channel_config,
        samples,
        payload_bytes,
        duration_secs: samples as f64 / sample_rate as f64,
    })
}
