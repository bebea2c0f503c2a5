//! Last-resort estimates from the URL, declared content type and byte size.

use lectern_core::models::ResolutionBucket;

use crate::fetch::{extension_from_url, file_name_from_url};
use crate::metadata::PartialMetadata;

/// Shortest estimate worth reporting, in seconds.
pub const MIN_ESTIMATED_SECS: u64 = 10;
/// Longest estimate worth reporting (two hours).
pub const MAX_ESTIMATED_SECS: u64 = 7200;

/// Filename markers, most specific first.
const RESOLUTION_MARKERS: &[(&str, ResolutionBucket)] = &[
    ("2160", ResolutionBucket::P2160),
    ("4k", ResolutionBucket::P2160),
    ("uhd", ResolutionBucket::P2160),
    ("1440", ResolutionBucket::P1440),
    ("2k", ResolutionBucket::P1440),
    ("1080", ResolutionBucket::P1080),
    ("fullhd", ResolutionBucket::P1080),
    ("fhd", ResolutionBucket::P1080),
    ("720", ResolutionBucket::P720),
    ("480", ResolutionBucket::P480),
    ("360", ResolutionBucket::P360),
    ("240", ResolutionBucket::P360),
];

const FPS_MARKERS: &[(&str, u32)] = &[
    ("120fps", 120),
    ("60fps", 60),
    ("50fps", 50),
    ("30fps", 30),
    ("25fps", 25),
    ("24fps", 24),
];

#[derive(Debug, Clone, Copy)]
pub struct HeuristicEstimator {
    assumed_bytes_per_sec: u64,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self::new(375_000)
    }
}

impl HeuristicEstimator {
    pub fn new(assumed_bytes_per_sec: u64) -> Self {
        Self {
            assumed_bytes_per_sec: assumed_bytes_per_sec.max(1),
        }
    }

    /// Duration implied by `size_bytes` at the assumed bitrate, reported
    /// only when it lands in a plausible lesson length.
    pub fn estimate_duration(&self, size_bytes: u64) -> Option<u64> {
        let seconds = size_bytes / self.assumed_bytes_per_sec;
        (MIN_ESTIMATED_SECS..=MAX_ESTIMATED_SECS)
            .contains(&seconds)
            .then_some(seconds)
    }

    /// Never fails; fields with no evidence stay unset.
    pub fn estimate(
        &self,
        url: &str,
        content_type: Option<&str>,
        size_bytes: Option<u64>,
    ) -> PartialMetadata {
        let name = file_name_from_url(url)
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content_type = content_type
            .map(str::to_string)
            .or_else(|| content_type_from_extension(url).map(str::to_string));
        let resolution_bucket = resolution_from_name(&name);

        PartialMetadata {
            duration_seconds: size_bytes.and_then(|size| self.estimate_duration(size)),
            resolution_bucket,
            aspect_ratio: resolution_bucket.map(|bucket| bucket.typical_aspect_ratio()),
            codec: content_type
                .as_deref()
                .and_then(codec_for_content_type)
                .map(str::to_string),
            fps: fps_from_name(&name),
            size_bytes: size_bytes.filter(|size| *size > 0),
            ..Default::default()
        }
    }
}

/// Resolution hinted at by a (lower-cased) file name, e.g. `intro_1080p.mp4`.
pub fn resolution_from_name(name: &str) -> Option<ResolutionBucket> {
    RESOLUTION_MARKERS
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map(|(_, bucket)| *bucket)
}

pub fn fps_from_name(name: &str) -> Option<u32> {
    FPS_MARKERS
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map(|(_, fps)| *fps)
}

/// Typical codec for a container content type.
pub fn codec_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "video/mp4" | "video/x-m4v" | "video/quicktime" => Some("H.264"),
        "video/webm" => Some("VP9"),
        _ => None,
    }
}

pub fn content_type_from_extension(url: &str) -> Option<&'static str> {
    match extension_from_url(url)?.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}
