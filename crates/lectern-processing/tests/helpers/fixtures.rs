/// Wrap a payload in an ISO-BMFF box header.
pub fn mp4_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(fourcc);
    out.extend_from_slice(payload);
    out
}

fn ftyp() -> Vec<u8> {
    mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2avc1mp41")
}

fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 100];
    payload[12..16].copy_from_slice(&timescale.to_be_bytes());
    payload[16..20].copy_from_slice(&duration.to_be_bytes());
    mp4_box(b"mvhd", &payload)
}

fn tkhd(width: u32, height: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 84];
    payload[76..80].copy_from_slice(&(width << 16).to_be_bytes());
    payload[80..84].copy_from_slice(&(height << 16).to_be_bytes());
    mp4_box(b"tkhd", &payload)
}

/// Movie with the `moov` box ahead of the media data.
pub fn faststart_movie(timescale: u32, duration: u32, width: u32, height: u32) -> Vec<u8> {
    let trak = mp4_box(b"trak", &tkhd(width, height));
    let moov = mp4_box(b"moov", &[mvhd(timescale, duration), trak].concat());
    [ftyp(), moov, mp4_box(b"mdat", &[0u8; 256])].concat()
}

/// First `len` bytes of a movie whose `moov` box sits after a large `mdat`.
pub fn moov_at_end_prefix(len: usize) -> Vec<u8> {
    let mut out = ftyp();
    out.extend_from_slice(&(64 * 1024 * 1024u32).to_be_bytes());
    out.extend_from_slice(b"mdat");
    out.resize(len, 0);
    out
}
