//! Media resolution
//!
//! Picks at most one representative URL per media kind from an ordered
//! attachment list. Resolution is total and idempotent:
//! - the first attachment of each kind wins
//! - an unclassifiable attachment fills the image slot if it is still empty
//! - attachments without a URL are skipped

use crate::types::{AttachmentRecord, MediaKind, ResolvedMedia};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

/// Resolve one URL per kind from `attachments`, in order.
pub fn resolve(attachments: &[AttachmentRecord]) -> ResolvedMedia {
    let mut resolved = ResolvedMedia::default();

    for attachment in attachments {
        if attachment.url.is_empty() {
            continue;
        }

        let slot = match classify(attachment) {
            MediaKind::Image | MediaKind::Unknown => &mut resolved.image,
            MediaKind::Video => &mut resolved.video,
            MediaKind::Audio => &mut resolved.audio,
        };

        if slot.is_empty() {
            *slot = attachment.url.clone();
        }
    }

    resolved
}

/// Classify an attachment by its type hint, falling back to its URL.
pub fn classify(attachment: &AttachmentRecord) -> MediaKind {
    attachment
        .type_hint
        .as_deref()
        .and_then(kind_from_hint)
        .unwrap_or_else(|| kind_from_url(&attachment.url))
}

/// Kind from a backend type hint such as `"image"`, `"video/mp4"` or `"raw"`.
///
/// The media host files audio uploads under its `raw` resource type.
pub fn kind_from_hint(hint: &str) -> Option<MediaKind> {
    let hint = hint.to_ascii_lowercase();
    if hint.contains("image") {
        Some(MediaKind::Image)
    } else if hint.contains("video") {
        Some(MediaKind::Video)
    } else if hint.contains("audio") || hint.contains("raw") {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Kind from the URL's trailing file extension (case-insensitive).
pub fn kind_from_url(url: &str) -> MediaKind {
    let Some((_, ext)) = url.rsplit_once('.') else {
        return MediaKind::Unknown;
    };
    let ext = ext.to_ascii_lowercase();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Audio
    } else {
        MediaKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<AttachmentRecord> {
        list.iter().map(|u| AttachmentRecord::from_url(*u)).collect()
    }

    #[test]
    fn test_first_image_wins() {
        let resolved = resolve(&urls(&["a.jpg", "b.jpg"]));
        assert_eq!(resolved.image, "a.jpg");
        assert!(resolved.video.is_empty());
        assert!(resolved.audio.is_empty());
    }

    #[test]
    fn test_unknown_falls_back_to_image() {
        let resolved = resolve(&urls(&["x.unknown"]));
        assert_eq!(resolved.image, "x.unknown");
        assert_eq!(resolved.video, "");
        assert_eq!(resolved.audio, "");
    }

    #[test]
    fn test_unknown_dropped_once_image_filled() {
        let resolved = resolve(&urls(&["a.png", "x.bin", "c.webm"]));
        assert_eq!(resolved.image, "a.png");
        assert_eq!(resolved.video, "c.webm");
    }

    #[test]
    fn test_one_url_per_kind() {
        let resolved = resolve(&urls(&["v.MOV", "s.ogg", "p.jpeg", "v2.mp4"]));
        assert_eq!(resolved.image, "p.jpeg");
        assert_eq!(resolved.video, "v.MOV");
        assert_eq!(resolved.audio, "s.ogg");
    }

    #[test]
    fn test_type_hint_beats_extension() {
        let attachments = vec![
            AttachmentRecord::from_url("https://cdn/upload/abc").with_type_hint("video"),
            AttachmentRecord::from_url("https://cdn/raw/def.jpg").with_type_hint("raw"),
        ];
        let resolved = resolve(&attachments);
        assert_eq!(resolved.video, "https://cdn/upload/abc");
        assert_eq!(resolved.audio, "https://cdn/raw/def.jpg");
        assert!(resolved.image.is_empty());
    }

    #[test]
    fn test_unrecognised_hint_uses_extension() {
        let attachment = AttachmentRecord::from_url("clip.wav").with_type_hint("file");
        assert_eq!(classify(&attachment), MediaKind::Audio);
    }

    #[test]
    fn test_empty_urls_skipped() {
        let resolved = resolve(&urls(&["", "b.mp3"]));
        assert_eq!(resolved.image, "");
        assert_eq!(resolved.audio, "b.mp3");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let attachments = urls(&["z", "a.gif", "m.m4a", "k.avi", "q.jpg"]);
        assert_eq!(resolve(&attachments), resolve(&attachments));
    }
}
