pub mod fixtures;

use lectern_core::VideoMetadataConfig;

/// Pipeline config for tests: external probe off, small prefix cap.
pub fn test_config(prefix_bytes: u64) -> VideoMetadataConfig {
    VideoMetadataConfig {
        prefix_bytes,
        probe_max_bytes: prefix_bytes,
        http_timeout_secs: 5,
        probe_enabled: false,
        ..Default::default()
    }
}
