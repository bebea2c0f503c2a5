//! Partial metadata contributed by a single extraction stage

use lectern_core::models::{
    AspectRatio, ResolutionBucket, VideoMetadata, DEFAULT_CODEC, DEFAULT_FPS,
};

/// Fields one stage managed to recover. Stages fill what they can; the
/// orchestrator merges them with first-writer-wins semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub duration_seconds: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resolution_bucket: Option<ResolutionBucket>,
    pub aspect_ratio: Option<AspectRatio>,
    pub codec: Option<String>,
    pub fps: Option<u32>,
    pub size_bytes: Option<u64>,
}

impl PartialMetadata {
    /// Record pixel dimensions together with the bucket and aspect ratio
    /// derived from them. Zero dimensions are ignored.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        if width > 0 && height > 0 {
            self.width = Some(width);
            self.height = Some(height);
            self.resolution_bucket = Some(ResolutionBucket::from_height(height));
            self.aspect_ratio = Some(AspectRatio::from_dimensions(width, height));
        }
        self
    }

    pub fn has_duration(&self) -> bool {
        matches!(self.duration_seconds, Some(d) if d > 0)
    }

    pub fn is_empty(&self) -> bool {
        *self == PartialMetadata::default()
    }

    /// Fill every field still unset from `other`. A field already present is
    /// never overridden, and a zero duration never counts as present.
    pub fn merge_missing(&mut self, other: PartialMetadata) {
        if !self.has_duration() {
            self.duration_seconds = other.duration_seconds.filter(|d| *d > 0);
        }
        if self.width.is_none() && self.height.is_none() {
            self.width = other.width;
            self.height = other.height;
        }
        self.resolution_bucket = self.resolution_bucket.or(other.resolution_bucket);
        self.aspect_ratio = self.aspect_ratio.or(other.aspect_ratio);
        if self.codec.is_none() {
            self.codec = other.codec;
        }
        self.fps = self.fps.or(other.fps.filter(|f| *f > 0));
        self.size_bytes = self.size_bytes.or(other.size_bytes);
    }

    /// Resolve the merged fields into a fully populated value, applying the
    /// documented defaults to anything still unknown.
    pub fn into_video_metadata(self) -> VideoMetadata {
        let resolution_bucket = self
            .resolution_bucket
            .or_else(|| self.height.map(ResolutionBucket::from_height))
            .unwrap_or_default();
        let aspect_ratio = self
            .aspect_ratio
            .or_else(|| match (self.width, self.height) {
                (Some(w), Some(h)) => Some(AspectRatio::from_dimensions(w, h)),
                _ => None,
            })
            .unwrap_or_else(|| resolution_bucket.typical_aspect_ratio());

        VideoMetadata {
            duration_seconds: self.duration_seconds.filter(|d| *d > 0),
            resolution_bucket,
            size_bytes: self.size_bytes.unwrap_or(0),
            codec: self.codec.unwrap_or_else(|| DEFAULT_CODEC.to_string()),
            fps: self.fps.filter(|f| *f > 0).unwrap_or(DEFAULT_FPS),
            aspect_ratio,
        }
    }
}

/// Display label for a codec identifier as reported by a container
/// (`avc1`) or a probe (`h264`). Unknown identifiers are upper-cased.
pub fn codec_display_name(raw: &str) -> String {
    let label = match raw.trim().to_ascii_lowercase().as_str() {
        "h264" | "avc1" | "avc3" => "H.264",
        "hevc" | "h265" | "hvc1" | "hev1" => "H.265",
        "av1" | "av01" => "AV1",
        "vp9" | "vp09" => "VP9",
        "vp8" | "vp08" => "VP8",
        "mpeg4" | "mp4v" => "MPEG-4",
        "prores" | "apch" | "apcn" | "apcs" | "apco" | "ap4h" => "ProRes",
        other => return other.to_ascii_uppercase(),
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_dimensions_derives_bucket_and_ratio() {
        let partial = PartialMetadata::default().with_dimensions(1920, 1080);
        assert_eq!(partial.resolution_bucket, Some(ResolutionBucket::P1080));
        assert_eq!(partial.aspect_ratio, Some(AspectRatio::Widescreen));

        let ignored = PartialMetadata::default().with_dimensions(0, 1080);
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_duration() {
        let mut merged = PartialMetadata {
            duration_seconds: Some(65),
            ..Default::default()
        };
        merged.merge_missing(PartialMetadata {
            duration_seconds: Some(99),
            codec: Some("VP9".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.duration_seconds, Some(65));
        assert_eq!(merged.codec.as_deref(), Some("VP9"));
    }

    #[test]
    fn test_merge_replaces_zero_duration() {
        let mut merged = PartialMetadata {
            duration_seconds: Some(0),
            ..Default::default()
        };
        merged.merge_missing(PartialMetadata {
            duration_seconds: Some(42),
            ..Default::default()
        });
        assert_eq!(merged.duration_seconds, Some(42));
    }

    #[test]
    fn test_merge_does_not_override_dimensions() {
        let mut merged = PartialMetadata::default().with_dimensions(1280, 720);
        merged.merge_missing(PartialMetadata::default().with_dimensions(3840, 2160));

        assert_eq!(merged.height, Some(720));
        assert_eq!(merged.resolution_bucket, Some(ResolutionBucket::P720));
    }

    #[test]
    fn test_into_video_metadata_defaults() {
        let metadata = PartialMetadata::default().into_video_metadata();
        assert_eq!(metadata, VideoMetadata::default());
    }

    #[test]
    fn test_into_video_metadata_uses_bucket_aspect_when_no_dimensions() {
        let metadata = PartialMetadata {
            resolution_bucket: Some(ResolutionBucket::P360),
            ..Default::default()
        }
        .into_video_metadata();

        assert_eq!(metadata.resolution_bucket, ResolutionBucket::P360);
        assert_eq!(metadata.aspect_ratio, AspectRatio::Standard);
    }

    #[test]
    fn test_codec_display_name() {
        assert_eq!(codec_display_name("avc1"), "H.264");
        assert_eq!(codec_display_name("h264"), "H.264");
        assert_eq!(codec_display_name("hev1"), "H.265");
        assert_eq!(codec_display_name("vp09"), "VP9");
        assert_eq!(codec_display_name("theora"), "THEORA");
    }
}
