//! Hand-written ANLZ byte streams
//!
//! Every section is assembled with `to_be_bytes` so the fixtures stay
//! independent of the codec under test.

#![allow(dead_code)]

pub const PSSI_KEY: [u8; 19] = [
    0xCB, 0xE1, 0xEE, 0xFA, 0xE5, 0xEE, 0xAD, 0xEE, 0xE9, 0xD2, 0xE9, 0xEB, 0xE1, 0xE9, 0xF3,
    0xE8, 0xE9, 0xF4, 0xE1,
];

/// Tag header plus header extension plus body
pub fn section(code: &[u8; 4], header_ext: &[u8], body: &[u8]) -> Vec<u8> {
    let len_header = 12 + header_ext.len();
    let len_tag = len_header + body.len();

    let mut buffer = Vec::with_capacity(len_tag);
    buffer.extend_from_slice(code);
    buffer.extend_from_slice(&(len_header as u32).to_be_bytes());
    buffer.extend_from_slice(&(len_tag as u32).to_be_bytes());
    buffer.extend_from_slice(header_ext);
    buffer.extend_from_slice(body);
    buffer
}

/// PMAI header followed by the given sections
pub fn generate_file(sections: &[Vec<u8>]) -> Vec<u8> {
    let header_size = 28usize;
    let total_size = header_size + sections.iter().map(Vec::len).sum::<usize>();

    let mut buffer = Vec::with_capacity(total_size);
    buffer.extend_from_slice(b"PMAI");
    buffer.extend_from_slice(&(header_size as u32).to_be_bytes());
    buffer.extend_from_slice(&(total_size as u32).to_be_bytes());
    for _ in 0..4 {
        buffer.extend_from_slice(&0u32.to_be_bytes());
    }
    for section in sections {
        buffer.extend_from_slice(section);
    }
    buffer
}

pub fn generate_ppth_section(path: &str) -> Vec<u8> {
    let mut body: Vec<u8> = path.encode_utf16().flat_map(u16::to_be_bytes).collect();
    body.extend_from_slice(&[0, 0]);
    section(b"PPTH", &(body.len() as u32).to_be_bytes(), &body)
}

pub fn generate_pvbr_section() -> Vec<u8> {
    let mut body = Vec::with_capacity(1604);
    for i in 0..400u32 {
        body.extend_from_slice(&(i * 1000).to_be_bytes());
    }
    body.extend_from_slice(&0u32.to_be_bytes());
    section(b"PVBR", &0u32.to_be_bytes(), &body)
}

/// Beats as (beat in bar, BPM × 100, milliseconds)
pub fn generate_pqtz_section(beats: &[(u16, u16, u32)]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&0u32.to_be_bytes());
    ext.extend_from_slice(&0x0008_0000u32.to_be_bytes());
    ext.extend_from_slice(&(beats.len() as u32).to_be_bytes());

    let mut body = Vec::new();
    for &(beat, tempo, time) in beats {
        body.extend_from_slice(&beat.to_be_bytes());
        body.extend_from_slice(&tempo.to_be_bytes());
        body.extend_from_slice(&time.to_be_bytes());
    }
    section(b"PQTZ", &ext, &body)
}

pub fn generate_pqt2_section(beats: &[u8]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&[0; 4]);
    ext.extend_from_slice(&0x0100_0002u32.to_be_bytes());
    ext.extend_from_slice(&[0; 4]);
    // two tempo anchors
    for (beat, time) in [(1u16, 50u32), (1, 180_000)] {
        ext.extend_from_slice(&beat.to_be_bytes());
        ext.extend_from_slice(&12800u16.to_be_bytes());
        ext.extend_from_slice(&time.to_be_bytes());
    }
    ext.extend_from_slice(&(beats.len() as u32).to_be_bytes());
    ext.extend_from_slice(&[0; 12]);

    let body: Vec<u8> = beats.iter().flat_map(|&b| [b, 0]).collect();
    section(b"PQT2", &ext, &body)
}

/// PWAV or PWV2 preview
pub fn generate_preview_section(code: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&(data.len() as u32).to_be_bytes());
    ext.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    section(code, &ext, data)
}

pub fn generate_pwv3_section(data: &[u8]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&1u32.to_be_bytes());
    ext.extend_from_slice(&(data.len() as u32).to_be_bytes());
    ext.extend_from_slice(&0x0096_0000u32.to_be_bytes());
    section(b"PWV3", &ext, data)
}

pub fn generate_pwv4_section(columns: &[[u8; 6]]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&6u32.to_be_bytes());
    ext.extend_from_slice(&(columns.len() as u32).to_be_bytes());
    ext.extend_from_slice(&0u32.to_be_bytes());
    let body: Vec<u8> = columns.iter().flatten().copied().collect();
    section(b"PWV4", &ext, &body)
}

pub fn generate_pwv5_section(entries: &[u16]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&2u32.to_be_bytes());
    ext.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    ext.extend_from_slice(&0u32.to_be_bytes());
    let body: Vec<u8> = entries.iter().flat_map(|e| e.to_be_bytes()).collect();
    section(b"PWV5", &ext, &body)
}

pub fn generate_pwv6_section(bands: &[[u8; 3]]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&3u32.to_be_bytes());
    ext.extend_from_slice(&(bands.len() as u32).to_be_bytes());
    let body: Vec<u8> = bands.iter().flatten().copied().collect();
    section(b"PWV6", &ext, &body)
}

pub fn generate_pwv7_section(bands: &[[u8; 3]]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&3u32.to_be_bytes());
    ext.extend_from_slice(&(bands.len() as u32).to_be_bytes());
    ext.extend_from_slice(&0x0096_0000u32.to_be_bytes());
    let body: Vec<u8> = bands.iter().flatten().copied().collect();
    section(b"PWV7", &ext, &body)
}

pub fn generate_pwvc_section(values: [u16; 3]) -> Vec<u8> {
    let body: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    section(b"PWVC", &0u16.to_be_bytes(), &body)
}

/// Legacy cue list; cues as (hot cue slot, milliseconds, loop end or None)
pub fn generate_pcob_section(list_type: u32, cues: &[(u32, u32, Option<u32>)]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&list_type.to_be_bytes());
    ext.extend_from_slice(&0u16.to_be_bytes());
    ext.extend_from_slice(&(cues.len() as u16).to_be_bytes());
    ext.extend_from_slice(&(-1i32).to_be_bytes());

    let mut body = Vec::new();
    for (i, &(hot_cue, time, loop_end)) in cues.iter().enumerate() {
        body.extend_from_slice(b"PCPT");
        body.extend_from_slice(&28u32.to_be_bytes());
        body.extend_from_slice(&56u32.to_be_bytes());
        body.extend_from_slice(&hot_cue.to_be_bytes());
        body.extend_from_slice(&4u32.to_be_bytes());
        body.extend_from_slice(&0x10000u32.to_be_bytes());
        let first = if i == 0 { 0xFFFF } else { i as u16 - 1 };
        let last = if i + 1 == cues.len() { 0xFFFF } else { i as u16 + 1 };
        body.extend_from_slice(&first.to_be_bytes());
        body.extend_from_slice(&last.to_be_bytes());
        body.push(if loop_end.is_some() { 2 } else { 1 });
        body.push(0);
        body.extend_from_slice(&1000u16.to_be_bytes());
        body.extend_from_slice(&time.to_be_bytes());
        body.extend_from_slice(&loop_end.unwrap_or(0xFFFF_FFFF).to_be_bytes());
        body.extend_from_slice(&[0; 16]);
    }
    section(b"PCOB", &ext, &body)
}

/// Extended cue list; cues as (hot cue slot, milliseconds, comment, palette index)
pub fn generate_pco2_section(list_type: u32, cues: &[(u32, u32, &str, u8)]) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.extend_from_slice(&list_type.to_be_bytes());
    ext.extend_from_slice(&(cues.len() as u16).to_be_bytes());
    ext.extend_from_slice(&0u16.to_be_bytes());

    let mut body = Vec::new();
    for &(hot_cue, time, comment, palette) in cues {
        let mut tail = Vec::new();
        let mut text: Vec<u8> = comment.encode_utf16().flat_map(u16::to_be_bytes).collect();
        text.extend_from_slice(&[0, 0]);
        tail.extend_from_slice(&(text.len() as u32).to_be_bytes());
        tail.extend_from_slice(&text);
        tail.extend_from_slice(&[palette, 0xFF, 0x40, 0x10]);
        tail.extend_from_slice(&[0; 4]);

        body.extend_from_slice(b"PCP2");
        body.extend_from_slice(&16u32.to_be_bytes());
        body.extend_from_slice(&((40 + tail.len()) as u32).to_be_bytes());
        body.extend_from_slice(&hot_cue.to_be_bytes());
        body.push(1);
        body.extend_from_slice(&[0; 3]);
        body.extend_from_slice(&time.to_be_bytes());
        body.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        body.push(palette);
        body.extend_from_slice(&[0; 7]);
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&tail);
    }
    section(b"PCO2", &ext, &body)
}

/// Song structure with `phrases` entries, XOR-masked when `masked`
pub fn generate_pssi_section(mood: u16, phrases: u16, masked: bool) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&24u32.to_be_bytes());
    content.extend_from_slice(&phrases.to_be_bytes());
    content.extend_from_slice(&mood.to_be_bytes());
    content.extend_from_slice(&[0; 6]);
    content.extend_from_slice(&(phrases * 32 + 1).to_be_bytes());
    content.extend_from_slice(&[0; 2]);
    content.push(1);
    content.push(0);
    for i in 0..phrases {
        content.extend_from_slice(&(i + 1).to_be_bytes());
        content.extend_from_slice(&(i * 32 + 1).to_be_bytes());
        content.extend_from_slice(&(i % 3 + 1).to_be_bytes());
        content.extend_from_slice(&[0; 18]);
    }

    if masked {
        for (x, byte) in content[6..].iter_mut().enumerate() {
            *byte ^= PSSI_KEY[x % 19].wrapping_add(phrases as u8);
        }
    }
    section(b"PSSI", &content[..20], &content[20..])
}

pub fn generate_unknown_section(code: &[u8; 4]) -> Vec<u8> {
    section(code, &[0xDE, 0xAD], &[1, 2, 3, 4, 5])
}

/// 128 BPM beats starting at 50ms
pub fn sample_beats(n: u32) -> Vec<(u16, u16, u32)> {
    (0..n)
        .map(|i| ((i % 4 + 1) as u16, 12800, 50 + (i as f64 * 468.75).round() as u32))
        .collect()
}

pub const TRACK_PATH: &str = "/Contents/Artist/Album/Track.mp3";

pub fn generate_dat_file() -> Vec<u8> {
    generate_file(&[
        generate_ppth_section(TRACK_PATH),
        generate_pvbr_section(),
        generate_pqtz_section(&sample_beats(8)),
        generate_preview_section(b"PWAV", &[0x1F, 0xE5, 0x40, 0x03]),
        generate_preview_section(b"PWV2", &[0x05, 0x06]),
        generate_pcob_section(1, &[(1, 50, None), (2, 1925, Some(3800))]),
        generate_pcob_section(0, &[(0, 50, None)]),
    ])
}

pub fn generate_ext_file() -> Vec<u8> {
    generate_file(&[
        generate_ppth_section(TRACK_PATH),
        generate_pwv3_section(&[0x1F, 0x20, 0xFF]),
        generate_pcob_section(1, &[(1, 50, None)]),
        generate_pcob_section(0, &[]),
        generate_pco2_section(1, &[(1, 50, "Drop", 0x2A), (2, 1925, "", 0x09)]),
        generate_pco2_section(0, &[]),
        generate_pqt2_section(&[]),
        generate_pwv4_section(&[[0, 10, 0x85, 20, 30, 40], [1, 2, 3, 4, 5, 6]]),
        generate_pwv5_section(&[(5 << 13) | (3 << 10) | (7 << 7) | (20 << 2), 0]),
        generate_pssi_section(2, 3, true),
    ])
}

pub fn generate_2ex_file() -> Vec<u8> {
    generate_file(&[
        generate_ppth_section(TRACK_PATH),
        generate_pwv7_section(&[[1, 2, 3], [4, 5, 6]]),
        generate_pwv6_section(&[[7, 8, 9]]),
        generate_pwvc_section([1, 2, 3]),
        generate_unknown_section(b"PQTX"),
    ])
}
