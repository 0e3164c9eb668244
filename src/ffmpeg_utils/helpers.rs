//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call.  All `unsafe`
//! blocks are contained here with explicit safety arguments.  Callers outside
//! this module should never need to write `unsafe` for routine FFmpeg access.

use ffmpeg_next as ffmpeg;
use std::ffi::CString;
use std::path::Path;

use crate::error::FfmpegError;

// ── Codec context field accessors ───────────────────────────────────────────

/// Write `profile` on a codec context that has not been opened yet.
///
/// `ffmpeg-next` does not expose a setter for this field.
pub fn codec_context_set_profile(context: &mut ffmpeg::codec::Context, profile: i32) {
    // SAFETY: `as_mut_ptr()` is valid for the lifetime of `context`.
    // `profile` is a plain int field read by `avcodec_open2`.
    unsafe {
        (*context.as_mut_ptr()).profile = profile;
    }
}

/// Read `profile` from a codec context.
pub fn codec_context_profile(context: &ffmpeg::codec::Context) -> i32 {
    // SAFETY: plain int field of a live context.
    unsafe { (*context.as_ptr()).profile }
}

/// Describe the channel layout of a codec context, e.g. `"stereo"`.
pub fn codec_context_layout_name(context: &ffmpeg::codec::Context) -> String {
    // SAFETY: `ch_layout` is an inline struct of a live context.
    describe_channel_layout(unsafe { &(*context.as_ptr()).ch_layout })
}

fn describe_channel_layout(layout: &ffmpeg::ffi::AVChannelLayout) -> String {
    let mut buf = [0 as std::ffi::c_char; 128];
    // SAFETY: `layout` is a valid reference; the call writes at most
    // `buf.len()` bytes including the terminating NUL.
    let ret = unsafe {
        ffmpeg::ffi::av_channel_layout_describe(layout, buf.as_mut_ptr(), buf.len())
    };
    if ret < 0 {
        return "unknown".to_string();
    }
    // SAFETY: on success the buffer holds a NUL-terminated string.
    unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Allocate a fresh `AVCodecParameters`, copy the encoder context into it,
/// and return it as a safe `ffmpeg::codec::Parameters`.
///
/// Used to snapshot the opened encoder's parameters onto the output stream.
pub fn encoder_codec_parameters(
    encoder: &ffmpeg::codec::encoder::Audio,
) -> Result<ffmpeg::codec::Parameters, FfmpegError> {
    use std::ops::Deref;
    use std::rc::Rc;
    let ctx: &ffmpeg::codec::Context = encoder.deref();
    // SAFETY: `avcodec_parameters_alloc` returns a valid pointer or null; we
    // check for null before handing it to `wrap`, which takes ownership.
    // `avcodec_parameters_from_context` copies fields from a valid, open
    // encoder context.
    unsafe {
        let params = ffmpeg::ffi::avcodec_parameters_alloc();
        if params.is_null() {
            return Err(FfmpegError::StreamConfig(
                "avcodec_parameters_alloc returned null".into(),
            ));
        }
        let ret = ffmpeg::ffi::avcodec_parameters_from_context(params, ctx.as_ptr());
        let params = ffmpeg::codec::Parameters::wrap(params, None::<Rc<dyn std::any::Any>>);
        if ret < 0 {
            return Err(FfmpegError::StreamConfig(format!(
                "avcodec_parameters_from_context: {}",
                ffmpeg::Error::from(ret)
            )));
        }
        Ok(params)
    }
}

// ── Codec capabilities ──────────────────────────────────────────────────────

/// Query one `avcodec_get_supported_config` list of `codec`.
///
/// Returns a null pointer when the codec accepts any value.
fn codec_supported_config(
    codec: &ffmpeg::Codec,
    config: ffmpeg::ffi::AVCodecConfig,
) -> Result<(*const std::ffi::c_void, usize), FfmpegError> {
    let mut configs: *const std::ffi::c_void = std::ptr::null();
    let mut count: std::ffi::c_int = 0;
    // SAFETY: a null context is allowed when a codec is given; the returned
    // list is static data owned by the codec.
    let ret = unsafe {
        ffmpeg::ffi::avcodec_get_supported_config(
            std::ptr::null(),
            codec.as_ptr(),
            config,
            0,
            &mut configs,
            &mut count,
        )
    };
    if ret < 0 {
        return Err(FfmpegError::EncoderCreate(format!(
            "avcodec_get_supported_config({}): {}",
            codec.name(),
            ffmpeg::Error::from(ret)
        )));
    }
    Ok((configs, count.max(0) as usize))
}

/// Sample formats `codec` accepts; empty when it accepts any.
pub fn codec_sample_formats(
    codec: &ffmpeg::Codec,
) -> Result<Vec<ffmpeg::util::format::sample::Sample>, FfmpegError> {
    let (list, count) = codec_supported_config(
        codec,
        ffmpeg::ffi::AVCodecConfig::AV_CODEC_CONFIG_SAMPLE_FORMAT,
    )?;
    if list.is_null() {
        return Ok(Vec::new());
    }
    // SAFETY: for this config the list holds `count` AVSampleFormat values.
    let formats =
        unsafe { std::slice::from_raw_parts(list as *const ffmpeg::ffi::AVSampleFormat, count) };
    Ok(formats.iter().map(|&f| f.into()).collect())
}

/// Sample rates `codec` accepts; empty when it accepts any.
pub fn codec_sample_rates(codec: &ffmpeg::Codec) -> Result<Vec<i32>, FfmpegError> {
    let (list, count) = codec_supported_config(
        codec,
        ffmpeg::ffi::AVCodecConfig::AV_CODEC_CONFIG_SAMPLE_RATE,
    )?;
    if list.is_null() {
        return Ok(Vec::new());
    }
    // SAFETY: for this config the list holds `count` ints.
    let rates = unsafe { std::slice::from_raw_parts(list as *const std::ffi::c_int, count) };
    Ok(rates.to_vec())
}

/// Channel layouts `codec` accepts, described (`"mono"`, `"stereo"`, ...);
/// empty when it accepts any.
pub fn codec_channel_layouts(codec: &ffmpeg::Codec) -> Result<Vec<String>, FfmpegError> {
    let (list, count) = codec_supported_config(
        codec,
        ffmpeg::ffi::AVCodecConfig::AV_CODEC_CONFIG_CHANNEL_LAYOUT,
    )?;
    if list.is_null() {
        return Ok(Vec::new());
    }
    // SAFETY: for this config the list holds `count` AVChannelLayout values.
    let layouts = unsafe {
        std::slice::from_raw_parts(list as *const ffmpeg::ffi::AVChannelLayout, count)
    };
    Ok(layouts.iter().map(describe_channel_layout).collect())
}

// ── Output context management ───────────────────────────────────────────────

/// Allocate an output format context for `path` without opening the file.
///
/// The container format is guessed from the path's extension. The file is
/// opened later by [`open_output_io`], once every stream parameter is final.
pub fn alloc_output_context(
    path: &Path,
) -> Result<ffmpeg::format::context::Output, FfmpegError> {
    let filename = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|e| FfmpegError::MuxerCreate(format!("{:?}: {}", path, e)))?;
    let mut ctx: *mut ffmpeg::ffi::AVFormatContext = std::ptr::null_mut();

    // SAFETY: `filename` outlives the call; a null oformat and format name
    // ask FFmpeg to guess from the filename. On success `ctx` is a fresh
    // context owned by the returned `Output`.
    let ret = unsafe {
        ffmpeg::ffi::avformat_alloc_output_context2(
            &mut ctx,
            std::ptr::null_mut(),
            std::ptr::null(),
            filename.as_ptr(),
        )
    };
    if ret < 0 || ctx.is_null() {
        return Err(FfmpegError::MuxerCreate(format!(
            "no container format for {:?}: {}",
            path,
            ffmpeg::Error::from(ret)
        )));
    }
    // SAFETY: `ctx` is non-null and not owned by anything else. `Output`'s
    // Drop closes `pb` (null-safe) and frees the context.
    Ok(unsafe { ffmpeg::format::context::Output::wrap(ctx) })
}

/// Open the destination file on an output context, unless the container
/// format does its own I/O.
pub fn open_output_io(
    output: &mut ffmpeg::format::context::Output,
    path: &Path,
) -> Result<(), FfmpegError> {
    let filename = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|e| FfmpegError::OpenOutput(format!("{:?}: {}", path, e)))?;

    // SAFETY: `output.as_mut_ptr()` is valid for the lifetime of `output`,
    // `oformat` was set by `avformat_alloc_output_context2`. `avio_open`
    // stores the opened context in `pb`, which `Output`'s Drop closes.
    unsafe {
        let ctx = output.as_mut_ptr();
        let flags = (*(*ctx).oformat).flags;
        if flags & ffmpeg::ffi::AVFMT_NOFILE as i32 != 0 {
            return Ok(());
        }
        let ret = ffmpeg::ffi::avio_open(
            &mut (*ctx).pb,
            filename.as_ptr(),
            ffmpeg::ffi::AVIO_FLAG_WRITE as i32,
        );
        if ret < 0 {
            return Err(FfmpegError::OpenOutput(format!(
                "{:?}: {}",
                path,
                ffmpeg::Error::from(ret)
            )));
        }
    }
    Ok(())
}

/// Short name of the container format chosen for an output context.
pub fn output_format_name(output: &ffmpeg::format::context::Output) -> String {
    output.format().name().to_string()
}

// ── Frame and packet buffers ────────────────────────────────────────────────

/// Ensure the frame's data buffers are writable, copying them if a codec
/// still holds a reference.
pub fn frame_make_writable(frame: &mut ffmpeg::util::frame::Audio) -> Result<(), FfmpegError> {
    // SAFETY: `as_mut_ptr()` is a valid AVFrame owned by `frame`.
    let ret = unsafe { ffmpeg::ffi::av_frame_make_writable(frame.as_mut_ptr()) };
    if ret < 0 {
        return Err(FfmpegError::FrameAlloc(format!(
            "av_frame_make_writable: {}",
            ffmpeg::Error::from(ret)
        )));
    }
    Ok(())
}

/// Drop the frame's payload reference, keeping the frame itself for reuse.
pub fn frame_unref(frame: &mut ffmpeg::util::frame::Audio) {
    // SAFETY: unref of a valid frame resets it to the blank state.
    unsafe { ffmpeg::ffi::av_frame_unref(frame.as_mut_ptr()) }
}

/// Drop the packet's payload reference, keeping the packet itself for reuse.
pub fn packet_unref(packet: &mut ffmpeg::Packet) {
    // SAFETY: unref of a valid packet resets it to the blank state.
    unsafe { ffmpeg::ffi::av_packet_unref(packet.as_mut_ptr()) }
}

// ── Audio plane access ──────────────────────────────────────────────────────

/// Extract an audio plane slice from an `AVFrame`.
///
/// Works around a bug in `ffmpeg-next`'s `Audio::data(index)` method where it
/// stops counting planes if `linesize[1] == 0`. In FFmpeg, planar audio frames
/// often only populate `linesize[0]` to represent the size of *every* plane.
pub fn audio_plane_data(frame: &ffmpeg::util::frame::Audio, index: usize) -> &[u8] {
    // SAFETY: `frame` owns a valid AVFrame for the returned lifetime. The
    // index is checked against the plane count and null planes are
    // rejected; every plane of an audio frame is `linesize[0]` bytes long.
    unsafe {
        let f = frame.as_ptr();
        let channels = (*f).ch_layout.nb_channels as usize;

        // Ensure index is valid for planar; packed has only 1 data plane.
        let is_planar = frame.format().is_planar();
        if is_planar {
            if index >= channels {
                return &[];
            }
        } else if index > 0 {
            return &[];
        }

        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &[];
        }

        let plane_ptr = *ptrs.add(index);
        if plane_ptr.is_null() {
            return &[];
        }

        let size = (*f).linesize[0] as usize;
        std::slice::from_raw_parts(plane_ptr, size)
    }
}

/// Mutable version of `audio_plane_data`.
pub fn audio_plane_data_mut(frame: &mut ffmpeg::util::frame::Audio, index: usize) -> &mut [u8] {
    // SAFETY: as for `audio_plane_data`; the exclusive borrow of `frame`
    // makes the returned slice the only access to the plane. Callers make
    // the frame writable first when a codec may share its buffers.
    unsafe {
        let f = frame.as_mut_ptr();
        let channels = (*f).ch_layout.nb_channels as usize;

        let is_planar = frame.format().is_planar();
        if is_planar {
            if index >= channels {
                return &mut [];
            }
        } else if index > 0 {
            return &mut [];
        }

        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &mut [];
        }

        let plane_ptr = *ptrs.add(index);
        if plane_ptr.is_null() {
            return &mut [];
        }

        let size = (*f).linesize[0] as usize;
        std::slice::from_raw_parts_mut(plane_ptr, size)
    }
}

/// The meaningful bytes of a packed (interleaved) frame: `samples ×
/// channels × bytes-per-sample`, without the alignment padding FFmpeg adds
/// to `linesize`.
pub fn packed_audio_bytes(frame: &ffmpeg::util::frame::Audio) -> &[u8] {
    let plane = audio_plane_data(frame, 0);
    let len = frame.samples() * frame.channels() as usize * frame.format().bytes();
    &plane[..len.min(plane.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::util::channel_layout::ChannelLayout;

    #[test]
    fn test_packed_audio_bytes_excludes_padding() {
        let fmt = crate::config::PCM_SAMPLE_FMT;
        let frame = ffmpeg::util::frame::Audio::new(fmt, 100, ChannelLayout::STEREO);
        assert_eq!(packed_audio_bytes(&frame).len(), 100 * 2 * 2);
    }

    #[test]
    fn test_planar_plane_access() {
        let fmt = crate::config::ENCODER_SAMPLE_FMT;
        let mut frame = ffmpeg::util::frame::Audio::new(fmt, 64, ChannelLayout::STEREO);
        assert!(audio_plane_data_mut(&mut frame, 1).len() >= 64 * 4);
        assert!(audio_plane_data(&frame, 2).is_empty());
    }

    #[test]
    fn test_make_writable_on_fresh_frame() {
        let fmt = crate::config::ENCODER_SAMPLE_FMT;
        let mut frame = ffmpeg::util::frame::Audio::new(fmt, 1024, ChannelLayout::STEREO);
        frame_make_writable(&mut frame).unwrap();
        assert_eq!(frame.samples(), 1024);
    }

    #[test]
    fn test_aac_encoder_lists_stereo_layout() {
        crate::ffmpeg_utils::init().unwrap();
        let Some(codec) = ffmpeg::encoder::find(ffmpeg::codec::Id::AAC) else {
            return;
        };
        let layouts = codec_channel_layouts(&codec).unwrap();
        assert!(layouts.iter().any(|l| l == "stereo"), "layouts: {:?}", layouts);
        assert!(layouts.iter().any(|l| l == "mono"), "layouts: {:?}", layouts);
    }

    #[test]
    fn test_alloc_output_context_guesses_adts() {
        crate::ffmpeg_utils::init().unwrap();
        let output = alloc_output_context(Path::new("/tmp/never-opened.aac")).unwrap();
        assert_eq!(output_format_name(&output), "adts");
    }

    #[test]
    fn test_alloc_output_context_unknown_extension() {
        crate::ffmpeg_utils::init().unwrap();
        assert!(alloc_output_context(Path::new("/tmp/never-opened.zzz_unknown")).is_err());
    }
}
