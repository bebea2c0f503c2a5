use lectern_core::models::VideoMetadata;

/// Human-readable byte size (`48.2 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Render extracted metadata as an aligned two-column table.
pub fn render_table(url: &str, metadata: &VideoMetadata) -> String {
    let duration = metadata
        .formatted_duration()
        .unwrap_or_else(|| "unknown".to_string());
    let rows = [
        ("URL", url.to_string()),
        ("Duration", duration),
        ("Resolution", metadata.resolution_bucket.to_string()),
        ("Aspect ratio", metadata.aspect_ratio.to_string()),
        ("Codec", metadata.codec.clone()),
        ("FPS", metadata.fps.to_string()),
        (
            "Size",
            format!("{} ({} bytes)", format_size(metadata.size_bytes), metadata.size_bytes),
        ),
    ];

    let mut out = String::from("\n=== Video Metadata ===\n\n");
    for (label, value) in rows {
        out.push_str(&format!("{:<13} {}\n", format!("{}:", label), value));
    }
    out
}
