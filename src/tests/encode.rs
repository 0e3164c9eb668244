//! Encode pipeline scenarios

#[cfg(test)]
mod tests {
    use crate::api;
    use crate::container::ContainerReader;
    use crate::error::TranscodeError;
    use crate::source::MemoryPcmSource;
    use crate::transcode::AudioDecoder;
    use crate::tests::fixtures::{aac_available, stereo_sine, write_pcm};

    #[test]
    fn test_one_frame_of_samples() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("one.aac");

        let summary =
            api::encode(MemoryPcmSource::new(stereo_sine(1024, 44_100, 8_000)), &out).unwrap();

        assert_eq!(summary.frame_size, 1024);
        assert_eq!(summary.chunk_bytes, 4096);
        assert_eq!(summary.frames_submitted, 1);
        assert_eq!(summary.samples, 1024);
        assert_eq!(summary.failed_units, 0);
        assert!(summary.packets_written >= 1);
        assert_eq!(summary.container, "adts");

        let adts = api::inspect_adts(&out).unwrap();
        assert_eq!(adts.sample_rate, 44_100);
        assert_eq!(adts.channels, 2);
        assert_eq!(adts.object_type, 2);
        assert_eq!(adts.frames, summary.packets_written);

        let reader = ContainerReader::open(&out).unwrap();
        let index = reader.first_audio_stream().unwrap();
        let params = reader.stream(index).unwrap().parameters();
        assert_eq!(params.id(), ffmpeg_next::codec::Id::AAC);
    }

    #[test]
    fn test_submissions_follow_input_length() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        for (frames, expected) in [(1, 1), (1023, 1), (1025, 2), (2500, 3)] {
            let out = dir.path().join(format!("len-{}.aac", frames));
            let summary =
                api::encode(MemoryPcmSource::new(stereo_sine(frames, 44_100, 8_000)), &out)
                    .unwrap();
            assert_eq!(summary.frames_submitted, expected, "frames={}", frames);
            assert_eq!(summary.samples, expected as u64 * 1024);
        }
    }

    #[test]
    fn test_partial_sample_frame_is_padded() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut pcm = stereo_sine(2048, 44_100, 8_000);
        pcm.extend_from_slice(&[1, 2, 3]);
        let input = write_pcm(dir.path(), "odd.pcm", &pcm);
        let out = dir.path().join("odd.aac");

        let summary = api::encode_file(&input, &out).unwrap();

        assert_eq!(summary.input_bytes, 2048 * 4 + 3);
        assert_eq!(summary.frames_submitted, 3);
        assert_eq!(summary.failed_units, 0);
    }

    #[test]
    fn test_empty_input_still_flushes_and_finalizes() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.m4a");

        let summary = api::encode(MemoryPcmSource::new(Vec::<u8>::new()), &out).unwrap();

        assert_eq!(summary.frames_submitted, 0);
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.failed_units, 0);
        // ftyp comes from the header, moov from the trailer.
        let data = std::fs::read(&out).unwrap();
        assert_eq!(&data[4..8], b"ftyp");
        assert!(data.windows(4).any(|w| w == b"moov"));
    }

    #[test]
    fn test_empty_input_declares_the_stream() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        // Matroska keeps track headers for tracks without samples.
        let out = dir.path().join("empty.mka");

        api::encode(MemoryPcmSource::new(Vec::<u8>::new()), &out).unwrap();

        let reader = ContainerReader::open(&out).unwrap();
        let index = reader.first_audio_stream().unwrap();
        assert_eq!(index, 0);
        let decoder = AudioDecoder::open(&reader.stream(index).unwrap()).unwrap();
        assert_eq!(decoder.codec_name(), "aac");
        assert_eq!(decoder.sample_rate(), 44_100);
        assert_eq!(decoder.channels(), 2);
    }

    #[test]
    fn test_identical_runs_identical_output() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let pcm = stereo_sine(10_000, 44_100, 12_000);
        let first_out = dir.path().join("a.aac");
        let second_out = dir.path().join("b.aac");

        let first = api::encode(MemoryPcmSource::new(pcm.clone()), &first_out).unwrap();
        let second = api::encode(MemoryPcmSource::new(pcm), &second_out).unwrap();

        assert_eq!(first.frames_submitted, second.frames_submitted);
        assert_eq!(first.duration_secs(), second.duration_secs());

        let a = api::inspect_adts(&first_out).unwrap();
        let b = api::inspect_adts(&second_out).unwrap();
        assert_eq!(a.frames, b.frames);
        assert_eq!(a.duration_secs, b.duration_secs);
        assert_eq!(a.sample_rate, b.sample_rate);
        assert_eq!(a.channels, b.channels);
    }

    #[test]
    fn test_mp4_container_from_extension() {
        if !aac_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tone.m4a");

        let summary =
            api::encode(MemoryPcmSource::new(stereo_sine(4096, 44_100, 8_000)), &out).unwrap();

        assert_ne!(summary.container, "adts");
        assert_eq!(summary.frames_submitted, 4);
        let data = std::fs::read(&out).unwrap();
        assert_eq!(&data[4..8], b"ftyp");
    }

    #[test]
    fn test_unknown_extension_creates_nothing() {
        crate::ffmpeg_utils::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tone.zzz_unknown");

        let result = api::encode(MemoryPcmSource::new(stereo_sine(1024, 44_100, 8_000)), &out);

        assert!(matches!(result, Err(TranscodeError::Ffmpeg(_))));
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = api::encode_file(&dir.path().join("nope.pcm"), &dir.path().join("x.aac"));
        assert!(matches!(result, Err(TranscodeError::Io(_))));
    }
}
