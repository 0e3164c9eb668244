//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;

/// Get the media type name
pub fn media_type_name(media_type: ffmpeg::media::Type) -> &'static str {
    match media_type {
        ffmpeg::media::Type::Video => "video",
        ffmpeg::media::Type::Audio => "audio",
        ffmpeg::media::Type::Subtitle => "subtitle",
        ffmpeg::media::Type::Data => "data",
        ffmpeg::media::Type::Attachment => "attachment",
        _ => "unknown",
    }
}

/// Channel layout to use when a frame or context reports none.
///
/// Raw and some container-less inputs leave the layout unset; fall back on
/// the channel count.
pub fn layout_or_default(layout: ChannelLayout, channels: u16) -> ChannelLayout {
    if layout.bits() != 0 {
        return layout;
    }
    match channels {
        1 => ChannelLayout::MONO,
        _ => ChannelLayout::STEREO,
    }
}

/// Print stream information for debugging
pub fn debug_stream_info(stream: &ffmpeg::format::stream::Stream, index: usize) {
    let params = stream.parameters();

    tracing::debug!(
        "Stream {}: type={}, codec={}, time_base={}",
        index,
        media_type_name(params.medium()),
        params.id().name(),
        stream.time_base()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_name() {
        assert_eq!(media_type_name(ffmpeg::media::Type::Audio), "audio");
        assert_eq!(media_type_name(ffmpeg::media::Type::Video), "video");
    }

    #[test]
    fn test_layout_or_default() {
        assert_eq!(
            layout_or_default(ChannelLayout::empty(), 1),
            ChannelLayout::MONO
        );
        assert_eq!(
            layout_or_default(ChannelLayout::empty(), 2),
            ChannelLayout::STEREO
        );
        assert_eq!(
            layout_or_default(ChannelLayout::MONO, 2),
            ChannelLayout::MONO
        );
    }
}
