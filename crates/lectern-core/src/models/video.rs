use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Frame rate reported when no stage could determine one.
pub const DEFAULT_FPS: u32 = 30;

/// Codec label reported when neither the container nor the content type names one.
pub const DEFAULT_CODEC: &str = "H.264";

/// Coarse vertical-resolution label for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionBucket {
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    P1080,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl ResolutionBucket {
    /// All buckets, tallest first.
    pub const ALL: [ResolutionBucket; 6] = [
        ResolutionBucket::P2160,
        ResolutionBucket::P1440,
        ResolutionBucket::P1080,
        ResolutionBucket::P720,
        ResolutionBucket::P480,
        ResolutionBucket::P360,
    ];

    /// Pixel height at which this bucket starts.
    pub fn min_height(self) -> u32 {
        match self {
            ResolutionBucket::P2160 => 2160,
            ResolutionBucket::P1440 => 1440,
            ResolutionBucket::P1080 => 1080,
            ResolutionBucket::P720 => 720,
            ResolutionBucket::P480 => 480,
            ResolutionBucket::P360 => 360,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionBucket::P2160 => "2160p",
            ResolutionBucket::P1440 => "1440p",
            ResolutionBucket::P1080 => "1080p",
            ResolutionBucket::P720 => "720p",
            ResolutionBucket::P480 => "480p",
            ResolutionBucket::P360 => "360p",
        }
    }

    /// Nearest bucket at or below `height`.
    ///
    /// Heights under 360 px land in the lowest bucket; a zero height is
    /// treated as unknown and yields the default.
    pub fn from_height(height: u32) -> Self {
        if height == 0 {
            return ResolutionBucket::default();
        }
        Self::ALL
            .into_iter()
            .find(|bucket| height >= bucket.min_height())
            .unwrap_or(ResolutionBucket::P360)
    }

    /// Aspect ratio assumed for a bucket when no dimensions are known.
    pub fn typical_aspect_ratio(self) -> AspectRatio {
        match self {
            ResolutionBucket::P360 => AspectRatio::Standard,
            _ => AspectRatio::Widescreen,
        }
    }
}

impl Display for ResolutionBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:2")]
    Classic,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Classic => "3:2",
            AspectRatio::Square => "1:1",
        }
    }

    /// Classify a frame by its width/height ratio.
    ///
    /// Thresholds sit between the nominal ratios (1.0, 1.33, 1.5, 1.78).
    /// Portrait frames fall through to `1:1`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectRatio::default();
        }
        let ratio = width as f64 / height as f64;
        if ratio >= 1.6 {
            AspectRatio::Widescreen
        } else if ratio >= 1.42 {
            AspectRatio::Classic
        } else if ratio >= 1.17 {
            AspectRatio::Standard
        } else {
            AspectRatio::Square
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Technical metadata derived for a lesson video.
///
/// Every field except `duration_seconds` always carries a value; stages that
/// cannot determine a field leave it to the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub duration_seconds: Option<u64>,
    pub resolution_bucket: ResolutionBucket,
    pub size_bytes: u64,
    pub codec: String,
    pub fps: u32,
    pub aspect_ratio: AspectRatio,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: None,
            resolution_bucket: ResolutionBucket::default(),
            size_bytes: 0,
            codec: DEFAULT_CODEC.to_string(),
            fps: DEFAULT_FPS,
            aspect_ratio: AspectRatio::default(),
        }
    }
}

impl VideoMetadata {
    /// Human-readable `H:MM:SS` / `M:SS` rendering of the duration, if known.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_seconds.map(|total| {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let seconds = total % 60;
            if hours > 0 {
                format!("{}:{:02}:{:02}", hours, minutes, seconds)
            } else {
                format!("{}:{:02}", minutes, seconds)
            }
        })
    }
}
