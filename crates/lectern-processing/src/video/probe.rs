//! External probe (ffprobe) adapter.

use lectern_core::models::DEFAULT_FPS;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::error::{ExtractionError, ExtractionResult};
use crate::metadata::{codec_display_name, PartialMetadata};

const PROBE_BINARY: &str = "ffprobe";

/// Locations checked when no explicit path is configured.
pub const DEFAULT_SEARCH_PATHS: &[&str] = &[
    "/usr/bin/ffprobe",
    "/usr/local/bin/ffprobe",
    "/opt/homebrew/bin/ffprobe",
    "/opt/local/bin/ffprobe",
    "/snap/bin/ffprobe",
];

fn validate_path(path: &str) -> ExtractionResult<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ExtractionError::ToolUnavailable(format!(
            "probe path contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(ExtractionError::ToolUnavailable(format!(
            "probe path contains directory traversal: {}",
            path
        )));
    }

    Ok(())
}

/// Runs the external probe tool against a local file.
#[derive(Debug, Clone)]
pub struct ExternalProbeAdapter {
    explicit_path: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    timeout: Duration,
}

impl ExternalProbeAdapter {
    pub fn new(explicit_path: Option<String>, timeout: Duration) -> Self {
        Self {
            explicit_path: explicit_path.map(PathBuf::from),
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
            timeout,
        }
    }

    pub fn with_search_paths(mut self, search_paths: Vec<PathBuf>) -> Self {
        self.search_paths = search_paths;
        self
    }

    /// Find the probe executable: the configured path, then the built-in
    /// locations, then `PATH`.
    pub fn locate(&self) -> ExtractionResult<PathBuf> {
        if let Some(explicit) = &self.explicit_path {
            validate_path(&explicit.to_string_lossy())?;
            if explicit.is_file() {
                return Ok(explicit.clone());
            }
            tracing::debug!(path = %explicit.display(), "Configured probe path missing");
        }

        if let Some(found) = self.search_paths.iter().find(|p| p.is_file()) {
            return Ok(found.clone());
        }

        std::env::var_os("PATH")
            .and_then(|paths| {
                std::env::split_paths(&paths)
                    .map(|dir| dir.join(PROBE_BINARY))
                    .find(|candidate| candidate.is_file())
            })
            .ok_or_else(|| {
                ExtractionError::ToolUnavailable(format!("{} not found", PROBE_BINARY))
            })
    }

    /// Probe a local file. The child is killed if the timeout elapses or the
    /// caller's future is dropped.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe_file(&self, path: &Path) -> ExtractionResult<PartialMetadata> {
        let executable = self.locate()?;
        let start = std::time::Instant::now();

        let child = Command::new(&executable)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExtractionError::Timeout(format!(
                    "{} exceeded {}s",
                    PROBE_BINARY,
                    self.timeout.as_secs()
                )))
            }
        };

        if !output.status.success() {
            return Err(ExtractionError::decode(format!(
                "{} exited with {}: {}",
                PROBE_BINARY,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let partial = parse_probe_report(&output.stdout)?;
        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            video_duration = ?partial.duration_seconds,
            width = ?partial.width,
            height = ?partial.height,
            codec = ?partial.codec,
            "Video probe completed"
        );
        Ok(partial)
    }
}

/// Read the probe's JSON report: container duration plus the first video
/// stream's dimensions, codec and frame rate.
pub fn parse_probe_report(stdout: &[u8]) -> ExtractionResult<PartialMetadata> {
    let report: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| ExtractionError::decode(format!("unreadable probe output: {}", e)))?;

    let format = &report["format"];
    let duration_seconds = format["duration"]
        .as_str()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .or_else(|| format["duration"].as_f64())
        .filter(|d| d.is_finite() && *d >= 1.0)
        .map(|d| d as u64);

    let mut partial = PartialMetadata {
        duration_seconds,
        size_bytes: format["size"]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0),
        ..Default::default()
    };

    let video = report["streams"].as_array().and_then(|streams| {
        streams
            .iter()
            .find(|s| s["codec_type"].as_str() == Some("video"))
    });

    if let Some(stream) = video {
        let width = pixel_dimension(&stream["width"]);
        let height = pixel_dimension(&stream["height"]);
        partial = partial.with_dimensions(width, height);
        partial.codec = stream["codec_name"].as_str().map(codec_display_name);
        let rate = stream["r_frame_rate"]
            .as_str()
            .filter(|r| !r.starts_with('0'))
            .or_else(|| stream["avg_frame_rate"].as_str());
        partial.fps = Some(parse_frame_rate(rate));
    }

    if partial.is_empty() {
        return Err(ExtractionError::decode("probe report had no usable fields"));
    }
    Ok(partial)
}

/// Out-of-range or missing dimensions read as 0, which is ignored.
fn pixel_dimension(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Frame rate from a `num/den` string (`"30000/1001"` -> 30), defaulting
/// when absent or malformed.
pub fn parse_frame_rate(rate: Option<&str>) -> u32 {
    rate.and_then(|r| {
        let (num, den) = r.split_once('/')?;
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        let fps = (num / den).round();
        (fps >= 1.0).then_some(fps as u32)
    })
    .unwrap_or(DEFAULT_FPS)
}
