//! Configuration module
//!
//! Settings for the lesson video metadata pipeline. Values come from the
//! environment (optionally seeded from a `.env` file) with conservative
//! defaults for every field.

use std::env;
use std::path::PathBuf;

const PREFIX_BYTES: u64 = 2 * 1024 * 1024;
const PROBE_MAX_BYTES: u64 = 50 * 1024 * 1024;
const HTTP_TIMEOUT_SECS: u64 = 30;
const PROBE_TIMEOUT_SECS: u64 = 60;
const ASSUMED_BYTES_PER_SEC: u64 = 375_000;

/// Video metadata extraction configuration
#[derive(Clone, Debug)]
pub struct VideoMetadataConfig {
    /// Byte cap for the prefix read by the in-process parsers
    pub prefix_bytes: u64,
    /// Byte cap for the local copy handed to the external probe
    pub probe_max_bytes: u64,
    /// Timeout applied to every HTTP request made by the fetcher
    pub http_timeout_secs: u64,
    /// Wall-clock limit for one probe invocation
    pub probe_timeout_secs: u64,
    pub probe_enabled: bool,
    /// Explicit probe executable, tried before the built-in search list
    pub ffprobe_path: Option<String>,
    /// Staging directory for probe copies (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    /// Average bitrate assumed by the size-based duration estimate
    pub assumed_bytes_per_sec: u64,
}

impl Default for VideoMetadataConfig {
    fn default() -> Self {
        Self {
            prefix_bytes: PREFIX_BYTES,
            probe_max_bytes: PROBE_MAX_BYTES,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
            probe_enabled: true,
            ffprobe_path: None,
            temp_dir: None,
            assumed_bytes_per_sec: ASSUMED_BYTES_PER_SEC,
        }
    }
}

impl VideoMetadataConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = VideoMetadataConfig {
            prefix_bytes: env::var("VIDEO_METADATA_PREFIX_BYTES")
                .unwrap_or_else(|_| PREFIX_BYTES.to_string())
                .parse()
                .unwrap_or(PREFIX_BYTES),
            probe_max_bytes: env::var("VIDEO_METADATA_PROBE_MAX_BYTES")
                .unwrap_or_else(|_| PROBE_MAX_BYTES.to_string())
                .parse()
                .unwrap_or(PROBE_MAX_BYTES),
            http_timeout_secs: env::var("VIDEO_METADATA_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
            probe_timeout_secs: env::var("VIDEO_METADATA_PROBE_TIMEOUT_SECS")
                .unwrap_or_else(|_| PROBE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PROBE_TIMEOUT_SECS),
            probe_enabled: env::var("VIDEO_METADATA_PROBE_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            ffprobe_path: env::var("FFPROBE_PATH").ok().filter(|s| !s.is_empty()),
            temp_dir: env::var("VIDEO_METADATA_TEMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            assumed_bytes_per_sec: env::var("VIDEO_METADATA_ASSUMED_BYTES_PER_SEC")
                .unwrap_or_else(|_| ASSUMED_BYTES_PER_SEC.to_string())
                .parse()
                .unwrap_or(ASSUMED_BYTES_PER_SEC),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.prefix_bytes == 0 {
            return Err(anyhow::anyhow!(
                "VIDEO_METADATA_PREFIX_BYTES must be greater than zero"
            ));
        }

        if self.probe_max_bytes < self.prefix_bytes {
            return Err(anyhow::anyhow!(
                "VIDEO_METADATA_PROBE_MAX_BYTES must be at least VIDEO_METADATA_PREFIX_BYTES"
            ));
        }

        if self.http_timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "VIDEO_METADATA_HTTP_TIMEOUT_SECS and VIDEO_METADATA_PROBE_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.assumed_bytes_per_sec == 0 {
            return Err(anyhow::anyhow!(
                "VIDEO_METADATA_ASSUMED_BYTES_PER_SEC must be greater than zero"
            ));
        }

        Ok(())
    }
}
