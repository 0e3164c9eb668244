use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one encode run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncodeSummary {
    pub source: String,
    pub output: PathBuf,
    /// Short name of the container format written
    pub container: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_rate: usize,
    /// Samples per channel in one encoder frame
    pub frame_size: usize,
    /// Raw bytes consumed per encoder frame
    pub chunk_bytes: usize,
    pub input_bytes: usize,
    /// Frames handed to the encoder, not counting the flush
    pub frames_submitted: usize,
    pub packets_written: usize,
    /// Samples per channel submitted, padding included
    pub samples: u64,
    /// Chunks dropped on conversion, refused sends, failed retrievals and
    /// failed packet writes
    pub failed_units: usize,
}

impl EncodeSummary {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples as f64 / self.sample_rate as f64
    }
}

/// Outcome of one decode run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: String,
    pub stream_index: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub packets_read: usize,
    pub frames_decoded: usize,
    /// Samples per channel written to the output
    pub samples_written: u64,
    pub bytes_written: u64,
    /// Packets refused and frames that failed to decode or convert
    pub decode_errors: usize,
}

impl DecodeSummary {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples_written as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let encode = EncodeSummary {
            sample_rate: 44_100,
            samples: 88_200,
            ..Default::default()
        };
        assert_eq!(encode.duration_secs(), 2.0);

        let decode = DecodeSummary::default();
        assert_eq!(decode.duration_secs(), 0.0);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = DecodeSummary {
            codec: "aac".into(),
            channels: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["codec"], "aac");
        assert_eq!(json["channels"], 2);
    }
}
