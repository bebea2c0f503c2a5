//! Minimal ISO base media (MP4/MOV) box walker.
//!
//! Recovers movie duration, track dimensions and the video sample-entry
//! codec from an in-memory buffer without demuxing. Each box is
//! `[u32 size][4cc type][payload]`; a size of 1 means a 64-bit size follows
//! the type, a size of 0 means the box runs to the end of its parent.
//! Malformed or truncated boxes end the walk at their level and keep
//! whatever was already found.

use crate::metadata::{codec_display_name, PartialMetadata};

/// Nesting limit; real files stay well under it.
const MAX_DEPTH: usize = 16;

const HEADER_LEN: usize = 8;
const LARGE_HEADER_LEN: usize = 16;

/// Values recovered from the box tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mp4BoxMetadata {
    pub duration_seconds: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Sample-entry type of the first video track, e.g. `avc1`
    pub video_codec: Option<[u8; 4]>,
}

impl Mp4BoxMetadata {
    pub fn is_empty(&self) -> bool {
        self.duration_seconds.is_none() && self.width.is_none() && self.video_codec.is_none()
    }

    pub fn codec_label(&self) -> Option<String> {
        self.video_codec
            .map(|fourcc| codec_display_name(&String::from_utf8_lossy(&fourcc)))
    }

    pub fn into_partial(self) -> PartialMetadata {
        let codec = self.codec_label();
        let partial = PartialMetadata {
            duration_seconds: self.duration_seconds.filter(|d| *d > 0),
            codec,
            ..Default::default()
        };
        match (self.width, self.height) {
            (Some(w), Some(h)) => partial.with_dimensions(w, h),
            _ => partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoxKind {
    /// Boxes whose payload is a sequence of child boxes
    Container,
    MovieHeader,
    TrackHeader,
    Handler,
    SampleDescription,
    Other,
}

impl BoxKind {
    fn of(fourcc: &[u8; 4]) -> Self {
        match fourcc {
            b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" => BoxKind::Container,
            b"mvhd" => BoxKind::MovieHeader,
            b"tkhd" => BoxKind::TrackHeader,
            b"hdlr" => BoxKind::Handler,
            b"stsd" => BoxKind::SampleDescription,
            _ => BoxKind::Other,
        }
    }
}

/// Parse as much of the box tree in `data` as possible.
pub fn parse_mp4_boxes(data: &[u8]) -> Mp4BoxMetadata {
    let mut walker = BoxWalker::default();
    walker.walk(data, 0, data.len(), 0);
    walker.metadata
}

/// True when the buffer starts like an ISO-BMFF file.
pub fn looks_like_iso_bmff(data: &[u8]) -> bool {
    matches!(
        data.get(4..8),
        Some(b"ftyp") | Some(b"moov") | Some(b"mdat") | Some(b"free") | Some(b"wide")
    )
}

#[derive(Default)]
struct BoxWalker {
    metadata: Mp4BoxMetadata,
    /// Handler type of the track currently being walked
    handler: Option<[u8; 4]>,
}

impl BoxWalker {
    fn walk(&mut self, data: &[u8], start: usize, end: usize, depth: usize) {
        if depth > MAX_DEPTH {
            tracing::debug!(depth, "Box nesting too deep, stopping");
            return;
        }

        let mut offset = start;
        while offset + HEADER_LEN <= end {
            let Some(declared) = read_u32(data, offset) else {
                return;
            };
            let Some(fourcc) = read_fourcc(data, offset + 4) else {
                return;
            };

            let (header_len, box_len) = match declared {
                0 => (HEADER_LEN, end - offset),
                1 => match read_u64(data, offset + HEADER_LEN) {
                    Some(large) => match usize::try_from(large) {
                        Ok(len) => (LARGE_HEADER_LEN, len),
                        Err(_) => return,
                    },
                    None => return,
                },
                size => (HEADER_LEN, size as usize),
            };

            if box_len < header_len || box_len > end - offset {
                tracing::debug!(
                    box_type = %String::from_utf8_lossy(&fourcc),
                    offset,
                    declared = box_len,
                    available = end - offset,
                    "Malformed or truncated box, stopping walk"
                );
                return;
            }

            let payload = offset + header_len;
            let box_end = offset + box_len;
            self.visit(&fourcc, data, payload, box_end, depth);
            offset = box_end;
        }
    }

    fn visit(&mut self, fourcc: &[u8; 4], data: &[u8], payload: usize, end: usize, depth: usize) {
        let body = &data[payload..end];
        match BoxKind::of(fourcc) {
            BoxKind::Container => {
                if fourcc == b"trak" {
                    self.handler = None;
                }
                self.walk(data, payload, end, depth + 1);
            }
            BoxKind::MovieHeader => {
                if self.metadata.duration_seconds.is_none() {
                    self.metadata.duration_seconds = parse_mvhd(body);
                }
            }
            BoxKind::TrackHeader => {
                if self.metadata.width.is_none() {
                    if let Some((width, height)) = parse_tkhd(body) {
                        self.metadata.width = Some(width);
                        self.metadata.height = Some(height);
                    }
                }
            }
            BoxKind::Handler => {
                self.handler = read_fourcc(body, 8);
            }
            BoxKind::SampleDescription => {
                if self.metadata.video_codec.is_none() && self.handler == Some(*b"vide") {
                    self.metadata.video_codec = read_fourcc(body, 12);
                }
            }
            BoxKind::Other => {}
        }
    }
}

/// Movie header: `duration / timescale`, whole seconds.
///
/// Layout after the version byte and 3 flag bytes:
/// v0: creation(4) modification(4) timescale(4) duration(4)
/// v1: creation(8) modification(8) timescale(4) duration(8)
fn parse_mvhd(body: &[u8]) -> Option<u64> {
    let version = *body.first()?;
    let (timescale, duration) = match version {
        0 => {
            let duration = read_u32(body, 16)?;
            if duration == u32::MAX {
                return None;
            }
            (read_u32(body, 12)?, u64::from(duration))
        }
        1 => {
            let duration = read_u64(body, 24)?;
            if duration == u64::MAX {
                return None;
            }
            (read_u32(body, 20)?, duration)
        }
        _ => return None,
    };

    if timescale == 0 {
        return None;
    }
    Some(duration / u64::from(timescale))
}

/// Track header: 16.16 fixed-point width and height, integer part only.
///
/// They follow 52 bytes of reserved/layer/volume/matrix fields that come
/// after the version-dependent time fields.
fn parse_tkhd(body: &[u8]) -> Option<(u32, u32)> {
    let width_offset = match *body.first()? {
        0 => 76,
        1 => 88,
        _ => return None,
    };
    let width = read_u32(body, width_offset)? >> 16;
    let height = read_u32(body, width_offset + 4)? >> 16;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

fn read_fourcc(data: &[u8], offset: usize) -> Option<[u8; 4]> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    bytes.try_into().ok()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use lectern_core::models::{AspectRatio, ResolutionBucket};

    #[test]
    fn test_mvhd_version0_duration() {
        let data = mp4_box(b"moov", &mvhd_v0(1000, 65000));
        let meta = parse_mp4_boxes(&data);
        assert_eq!(meta.duration_seconds, Some(65));
    }

    #[test]
    fn test_mvhd_version1_duration_matches_version0() {
        let v0 = parse_mp4_boxes(&mp4_box(b"moov", &mvhd_v0(1000, 65000)));
        let v1 = parse_mp4_boxes(&mp4_box(b"moov", &mvhd_v1(1000, 65000)));
        assert_eq!(v1.duration_seconds, Some(65));
        assert_eq!(v0.duration_seconds, v1.duration_seconds);
    }

    #[test]
    fn test_mvhd_zero_timescale_is_ignored() {
        let meta = parse_mp4_boxes(&mp4_box(b"moov", &mvhd_v0(0, 65000)));
        assert_eq!(meta.duration_seconds, None);
    }

    #[test]
    fn test_mvhd_unknown_duration_is_ignored() {
        let meta = parse_mp4_boxes(&mp4_box(b"moov", &mvhd_v0(1000, u32::MAX)));
        assert_eq!(meta.duration_seconds, None);
    }

    #[test]
    fn test_tkhd_fixed_point_dimensions() {
        let data = mp4_box(b"moov", &mp4_box(b"trak", &tkhd_v0(1920, 1080)));
        let meta = parse_mp4_boxes(&data);
        assert_eq!(meta.width, Some(1920));
        assert_eq!(meta.height, Some(1080));

        // 0x07800000 / 0x04380000 are 1920.0 / 1080.0 in 16.16
        assert_eq!(1920u32 << 16, 0x0780_0000);
        assert_eq!(1080u32 << 16, 0x0438_0000);

        let partial = meta.into_partial();
        assert_eq!(partial.resolution_bucket, Some(ResolutionBucket::P1080));
        assert_eq!(partial.aspect_ratio, Some(AspectRatio::Widescreen));
    }

    #[test]
    fn test_tkhd_version1_dimensions() {
        let data = mp4_box(b"moov", &mp4_box(b"trak", &tkhd_v1(1280, 720)));
        let meta = parse_mp4_boxes(&data);
        assert_eq!((meta.width, meta.height), (Some(1280), Some(720)));
    }

    #[test]
    fn test_audio_track_dimensions_are_skipped() {
        let audio = mp4_box(b"trak", &tkhd_v0(0, 0));
        let video = mp4_box(b"trak", &tkhd_v0(640, 480));
        let data = mp4_box(b"moov", &[audio, video].concat());
        let meta = parse_mp4_boxes(&data);
        assert_eq!((meta.width, meta.height), (Some(640), Some(480)));
    }

    #[test]
    fn test_full_movie_layout() {
        let data = sample_movie(600, 600 * 754, 3840, 2160);
        assert!(looks_like_iso_bmff(&data));

        let meta = parse_mp4_boxes(&data);
        assert_eq!(meta.duration_seconds, Some(754));
        assert_eq!((meta.width, meta.height), (Some(3840), Some(2160)));
        assert_eq!(meta.video_codec, Some(*b"avc1"));
        assert_eq!(meta.codec_label().as_deref(), Some("H.264"));
    }

    #[test]
    fn test_codec_only_recorded_for_video_handler() {
        let stbl = mp4_box(b"stbl", &stsd(b"mp4a"));
        let minf = mp4_box(b"minf", &stbl);
        let mdia = mp4_box(b"mdia", &[hdlr(b"soun"), minf].concat());
        let data = mp4_box(b"moov", &mp4_box(b"trak", &mdia));
        assert_eq!(parse_mp4_boxes(&data).video_codec, None);
    }

    #[test]
    fn test_truncated_box_stops_without_panic() {
        let mut data = mvhd_v0(1000, 65000);
        // A second box claiming far more bytes than remain.
        data.extend_from_slice(&1_000_000u32.to_be_bytes());
        data.extend_from_slice(b"moov");
        data.extend_from_slice(&[0u8; 16]);

        let meta = parse_mp4_boxes(&data);
        assert_eq!(meta.duration_seconds, Some(65));
    }

    #[test]
    fn test_truncated_container_is_not_entered() {
        let moov = mp4_box(b"moov", &mvhd_v0(1000, 65000));
        let cut = &moov[..moov.len() - 10];
        assert!(parse_mp4_boxes(cut).is_empty());
    }

    #[test]
    fn test_degenerate_sizes_stop_walk() {
        let mut tiny = Vec::new();
        tiny.extend_from_slice(&4u32.to_be_bytes());
        tiny.extend_from_slice(b"free");
        tiny.extend_from_slice(&mvhd_v0(1000, 65000));
        assert!(parse_mp4_boxes(&tiny).is_empty());

        assert!(parse_mp4_boxes(&[]).is_empty());
        assert!(parse_mp4_boxes(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn test_large_size_box_is_followed() {
        let payload = mvhd_v0(1000, 30000);
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"moov");
        data.extend_from_slice(&((payload.len() + 16) as u64).to_be_bytes());
        data.extend_from_slice(&payload);

        assert_eq!(parse_mp4_boxes(&data).duration_seconds, Some(30));
    }

    #[test]
    fn test_zero_size_box_extends_to_end() {
        let mut data = ftyp();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"moov");
        data.extend_from_slice(&mvhd_v0(90000, 90000 * 12));

        assert_eq!(parse_mp4_boxes(&data).duration_seconds, Some(12));
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let mut data = mvhd_v0(1000, 5000);
        for _ in 0..64 {
            data = mp4_box(b"moov", &data);
        }
        assert_eq!(parse_mp4_boxes(&data).duration_seconds, None);
    }
}
