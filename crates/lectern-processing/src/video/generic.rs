//! Format-agnostic metadata fallback.
//!
//! A [`MetadataSniffer`] turns a byte prefix into a flat map of metadata
//! fields, whatever the container. The extractor then scans well-known field
//! names for a duration, dimensions and a content type.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ExtractionError, ExtractionResult};
use crate::metadata::PartialMetadata;
use crate::video::heuristics::codec_for_content_type;

/// Field name -> raw value, as surfaced by a sniffer.
pub type SniffedFields = BTreeMap<String, String>;

/// Content-type field set by sniffers that recognise the container.
pub const CONTENT_TYPE_FIELD: &str = "Content-Type";

/// Duration fields, in the order they are trusted.
const DURATION_FIELDS: &[&str] = &[
    "xmpDM:duration",
    "duration",
    "meta:duration",
    "Duration",
    "DURATION",
    "length",
];

const WIDTH_FIELDS: &[&str] = &["width", "tiff:ImageWidth", "video:width"];
const HEIGHT_FIELDS: &[&str] = &["height", "tiff:ImageLength", "video:height"];

/// Hints passed to a sniffer alongside the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffHint<'a> {
    pub content_type: Option<&'a str>,
    pub extension: Option<&'a str>,
}

/// Generic content/metadata detector.
pub trait MetadataSniffer: Send + Sync {
    fn name(&self) -> &'static str;

    fn sniff(&self, data: &Bytes, hint: &SniffHint<'_>) -> ExtractionResult<SniffedFields>;
}

pub struct GenericMetadataExtractor {
    sniffer: Arc<dyn MetadataSniffer>,
}

impl GenericMetadataExtractor {
    pub fn new(sniffer: Arc<dyn MetadataSniffer>) -> Self {
        Self { sniffer }
    }

    /// Run the sniffer and pick out the fields we understand.
    pub fn extract(&self, data: &Bytes, hint: &SniffHint<'_>) -> ExtractionResult<PartialMetadata> {
        let fields = self.sniffer.sniff(data, hint)?;
        tracing::debug!(
            sniffer = self.sniffer.name(),
            field_count = fields.len(),
            "Sniffed metadata fields"
        );

        let partial = partial_from_fields(&fields);
        if partial.is_empty() {
            return Err(ExtractionError::decode(format!(
                "{} surfaced no usable metadata",
                self.sniffer.name()
            )));
        }
        Ok(partial)
    }
}

/// Map sniffed fields onto the metadata we track.
pub fn partial_from_fields(fields: &SniffedFields) -> PartialMetadata {
    let mut partial = PartialMetadata {
        duration_seconds: duration_from_fields(fields),
        codec: fields
            .get(CONTENT_TYPE_FIELD)
            .and_then(|ct| codec_for_content_type(ct))
            .map(str::to_string),
        ..Default::default()
    };

    if let (Some(width), Some(height)) = (
        first_number(fields, WIDTH_FIELDS),
        first_number(fields, HEIGHT_FIELDS),
    ) {
        partial = partial.with_dimensions(width, height);
    }
    partial
}

/// First candidate field that parses to a positive number of seconds.
pub fn duration_from_fields(fields: &SniffedFields) -> Option<u64> {
    DURATION_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(|raw| parse_duration_value(raw))
}

/// Parse a duration as plain seconds (`"65"`, `"65.4"`) or as a clock value
/// (`"1:05"`, `"0:01:05"`, `"00:01:05.500"`). Only positive values count.
pub fn parse_duration_value(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<f64>() {
        return whole_positive_seconds(seconds);
    }
    parse_clock(raw).and_then(whole_positive_seconds)
}

fn parse_clock(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.split(':').collect();
    // Without an hours field, minutes may run past 59 ("75:00").
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0u64, m.parse::<u64>().ok()?, s.parse::<f64>().ok()?),
        [h, m, s] => {
            let minutes = m.parse::<u64>().ok()?;
            if minutes >= 60 {
                return None;
            }
            (h.parse::<u64>().ok()?, minutes, s.parse::<f64>().ok()?)
        }
        _ => return None,
    };
    if !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some((hours * 3600 + minutes * 60) as f64 + seconds)
}

fn whole_positive_seconds(seconds: f64) -> Option<u64> {
    if seconds.is_finite() && seconds >= 1.0 {
        Some(seconds as u64)
    } else {
        None
    }
}

fn first_number(fields: &SniffedFields, names: &[&str]) -> Option<u32> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(|raw| {
            let digits: String = raw
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse::<u32>().ok().filter(|n| *n > 0)
        })
}

/// Content type from a buffer's leading magic bytes.
pub fn detect_content_type(data: &[u8]) -> Option<&'static str> {
    if data.get(4..8) == Some(b"ftyp") {
        return Some(match data.get(8..12) {
            Some(b"qt  ") => "video/quicktime",
            _ => "video/mp4",
        });
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        let head = &data[..data.len().min(64)];
        let is_webm = head.windows(4).any(|w| w == b"webm");
        return Some(if is_webm { "video/webm" } else { "video/x-matroska" });
    }
    if data.starts_with(b"RIFF") && data.get(8..12) == Some(b"AVI ") {
        return Some("video/x-msvideo");
    }
    if data.starts_with(b"OggS") {
        return Some("video/ogg");
    }
    None
}

#[cfg(feature = "generic-sniffer")]
pub use symphonia_sniffer::SymphoniaSniffer;

#[cfg(feature = "generic-sniffer")]
mod symphonia_sniffer {
    use bytes::Bytes;
    use std::io::Cursor;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    use super::{detect_content_type, MetadataSniffer, SniffHint, SniffedFields, CONTENT_TYPE_FIELD};
    use crate::error::{ExtractionError, ExtractionResult};

    /// Sniffer backed by symphonia's format probe.
    ///
    /// Surfaces the longest track duration as `duration`, every container
    /// tag under its own key, and a magic-byte `Content-Type`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SymphoniaSniffer;

    impl MetadataSniffer for SymphoniaSniffer {
        fn name(&self) -> &'static str {
            "symphonia"
        }

        fn sniff(&self, data: &Bytes, hint: &SniffHint<'_>) -> ExtractionResult<SniffedFields> {
            let mut fields = SniffedFields::new();
            if let Some(content_type) = detect_content_type(data) {
                fields.insert(CONTENT_TYPE_FIELD.to_string(), content_type.to_string());
            }

            let mut probe_hint = Hint::new();
            if let Some(ext) = hint.extension {
                probe_hint.with_extension(ext);
            }
            if let Some(content_type) = hint.content_type {
                probe_hint.mime_type(content_type);
            }

            let source = MediaSourceStream::new(Box::new(Cursor::new(data.clone())), Default::default());
            let mut probed = match symphonia::default::get_probe().format(
                &probe_hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            ) {
                Ok(probed) => probed,
                Err(e) if fields.is_empty() => {
                    return Err(ExtractionError::decode(format!("format probe failed: {}", e)));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Format probe failed, keeping magic-byte fields");
                    return Ok(fields);
                }
            };

            let longest = probed
                .format
                .tracks()
                .iter()
                .filter_map(|track| {
                    let params = &track.codec_params;
                    let time = params.time_base?.calc_time(params.n_frames?);
                    Some(time.seconds as f64 + time.frac)
                })
                .fold(None, |acc: Option<f64>, secs| Some(acc.map_or(secs, |a| a.max(secs))));
            if let Some(seconds) = longest {
                fields.insert("duration".to_string(), format!("{:.3}", seconds));
            }

            if let Some(revision) = probed.format.metadata().current() {
                for tag in revision.tags() {
                    fields
                        .entry(tag.key.clone())
                        .or_insert_with(|| tag.value.to_string());
                }
            }
            if let Some(metadata) = probed.metadata.get() {
                if let Some(revision) = metadata.current() {
                    for tag in revision.tags() {
                        fields
                            .entry(tag.key.clone())
                            .or_insert_with(|| tag.value.to_string());
                    }
                }
            }

            Ok(fields)
        }
    }
}
