//! Binary layouts of ANLZ files (.DAT, .EXT, .2EX)
//!
//! ANLZ files are **big-endian**. A fixed `PMAI` file header is followed by a
//! stream of tags, each starting with a 12-byte tag header (`type`,
//! `len_header`, `len_tag`). The structs below describe the bytes that follow
//! that tag header, so the header extension of a tag (counts, sentinels) shows
//! up as the leading fields of its content layout.
//!
//! Fields named `unknown*` have no confirmed meaning. They are kept as opaque
//! values so a parsed tag serializes back to the identical bytes.
//!
//! Reference: https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/anlz.html

use std::io::Cursor;

use binrw::{binrw, BinRead, BinResult, BinWrite, Endian};
use serde::Serialize;

/// File magic of every ANLZ file
pub const FILE_MAGIC: [u8; 4] = *b"PMAI";

/// Size of the fixed `PMAI` header layout
pub const FILE_HEADER_SIZE: usize = 28;

/// Size of the common tag header (`type`, `len_header`, `len_tag`)
pub const TAG_HEADER_SIZE: usize = 12;

/// `PMAI` file header
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub len_header: u32,
    /// Total file length, header included
    pub len_file: u32,
    pub reserved: [u32; 4],
    /// Declared header bytes past the 28-byte layout
    #[br(count = (len_header as usize).saturating_sub(FILE_HEADER_SIZE))]
    pub extra: Vec<u8>,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: FILE_MAGIC,
            len_header: FILE_HEADER_SIZE as u32,
            len_file: FILE_HEADER_SIZE as u32,
            reserved: [0; 4],
            extra: Vec::new(),
        }
    }
}

/// Common 12-byte tag header
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub code: [u8; 4],
    pub len_header: u32,
    /// Header plus content
    pub len_tag: u32,
}

// -- Beat Grid (PQTZ) -------------------------------------------------------

/// Sentinel stored in every PQTZ header
pub const BEAT_GRID_MARKER: u32 = 0x0008_0000;

/// One beat of a PQTZ beat grid
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Beat {
    /// Position within the bar (1-4)
    pub beat: u16,
    /// BPM × 100
    pub tempo: u16,
    /// Milliseconds from track start
    pub time: u32,
}

/// PQTZ content, `len_header` 24
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeatGrid {
    pub unknown1: [u8; 4],
    pub unknown2: u32,
    pub entry_count: u32,
    #[br(count = entry_count as usize)]
    pub entries: Vec<Beat>,
}

impl Default for BeatGrid {
    fn default() -> Self {
        Self {
            unknown1: [0; 4],
            unknown2: BEAT_GRID_MARKER,
            entry_count: 0,
            entries: Vec::new(),
        }
    }
}

// -- Extended Beat Grid (PQT2) ----------------------------------------------

/// Sentinel stored in every PQT2 header
pub const EXTENDED_BEAT_GRID_MARKER: u32 = 0x0100_0002;

/// Content bytes of the PQT2 header extension (56 - 12)
pub const EXTENDED_BEAT_GRID_HEADER_SIZE: usize = 44;

/// Compact 2-byte beat of a PQT2 grid
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompactBeat {
    pub beat: u8,
    pub unknown: u8,
}

/// PQT2 content, `len_header` 56
///
/// When `entry_count` is zero the file omits the entry array altogether.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedBeatGrid {
    pub unknown1: [u8; 4],
    pub unknown2: u32,
    pub unknown3: [u8; 4],
    /// Tempo anchors, same layout as PQTZ beats
    pub bpm: [Beat; 2],
    pub entry_count: u32,
    pub unknown4: u32,
    pub unknown5: u32,
    pub unknown6: u32,
    #[br(count = entry_count as usize)]
    pub entries: Vec<CompactBeat>,
}

impl Default for ExtendedBeatGrid {
    fn default() -> Self {
        Self {
            unknown1: [0; 4],
            unknown2: EXTENDED_BEAT_GRID_MARKER,
            unknown3: [0; 4],
            bpm: [Beat::default(); 2],
            entry_count: 0,
            unknown4: 0,
            unknown5: 0,
            unknown6: 0,
            entries: Vec::new(),
        }
    }
}

// -- Cue Lists (PCOB / PCO2) ------------------------------------------------

/// Magic of a legacy cue entry
pub const CUE_POINT_MAGIC: [u8; 4] = *b"PCPT";

/// Magic of an extended cue entry
pub const EXTENDED_CUE_POINT_MAGIC: [u8; 4] = *b"PCP2";

/// Size of the interpreted part of a PCPT entry
pub const CUE_POINT_SIZE: usize = 56;

/// Size of the fixed part of a PCP2 entry, before the variable tail
pub const EXTENDED_CUE_POINT_FIXED_SIZE: usize = 40;

/// Stored as `loop_time` when a cue is not a loop
pub const NO_LOOP: u32 = 0xFFFF_FFFF;

/// Legacy cue entry (`PCPT`), `len_entry` 56
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuePoint {
    pub magic: [u8; 4],
    pub len_header: u32,
    pub len_entry: u32,
    /// 0 for memory cues, 1.. for hot cues A..
    pub hot_cue: u32,
    /// 0 disabled, 4 enabled
    pub status: u32,
    /// Always 0x10000
    pub unknown1: u32,
    /// 0xffff for the first cue
    pub order_first: u16,
    /// 0xffff for the last cue
    pub order_last: u16,
    /// 1 single, 2 loop
    pub cue_type: u8,
    pub unknown2: u8,
    /// Always 1000
    pub unknown3: u16,
    /// Milliseconds from track start
    pub time: u32,
    pub loop_time: u32,
    pub unknown4: [u8; 16],
    /// Entry bytes past the 56-byte layout
    #[br(count = (len_entry as usize).saturating_sub(CUE_POINT_SIZE))]
    pub trailing: Vec<u8>,
}

/// PCOB content, `len_header` 24
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CueList {
    /// 0 memory cues, 1 hot cues
    pub list_type: u32,
    pub unknown: u16,
    pub count: u16,
    pub memory_count: i32,
    #[br(count = count as usize)]
    pub entries: Vec<CuePoint>,
}

/// Extended cue entry (`PCP2`)
///
/// Everything after the loop fraction is a variable tail:
/// `len_comment: u32`, a UTF-16BE comment of `len_comment` bytes, the color
/// palette id and RGB bytes, then padding up to `len_entry`. Short entries
/// may stop anywhere inside that tail, so it is kept as raw bytes and decoded
/// by accessors.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedCuePoint {
    pub magic: [u8; 4],
    pub len_header: u32,
    pub len_entry: u32,
    pub hot_cue: u32,
    pub cue_type: u8,
    pub unknown1: [u8; 3],
    pub time: u32,
    pub loop_time: u32,
    pub color_id: u8,
    pub unknown2: [u8; 7],
    pub loop_numerator: u16,
    pub loop_denominator: u16,
    #[br(count = (len_entry as usize).saturating_sub(EXTENDED_CUE_POINT_FIXED_SIZE))]
    pub tail: Vec<u8>,
}

/// PCO2 content, `len_header` 20
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtendedCueList {
    pub list_type: u32,
    pub count: u16,
    pub unknown: u16,
    #[br(count = count as usize)]
    pub entries: Vec<ExtendedCuePoint>,
}

// -- Path (PPTH) ------------------------------------------------------------

/// PPTH content, `len_header` 16
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TrackPath {
    /// Byte length of `data`, NUL terminator included
    pub len_path: u32,
    /// UTF-16BE path followed by a 2-byte NUL
    #[br(count = len_path as usize)]
    pub data: Vec<u8>,
}

// -- VBR Index (PVBR) -------------------------------------------------------

/// Number of offsets in a PVBR index
pub const VBR_INDEX_LEN: usize = 400;

/// PVBR content, `len_header` 16, `len_tag` 1620
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VbrIndex {
    pub unknown1: u32,
    #[br(count = VBR_INDEX_LEN)]
    pub index: Vec<u32>,
    pub unknown2: u32,
}

impl Default for VbrIndex {
    fn default() -> Self {
        Self {
            unknown1: 0,
            index: vec![0; VBR_INDEX_LEN],
            unknown2: 0,
        }
    }
}

// -- Waveforms (PWAV / PWV2 / PWV3 / PWV4 / PWV5 / PWV6 / PWV7 / PWVC) -------

/// Sentinel of PWAV/PWV2 headers
pub const WAVEFORM_PREVIEW_MARKER: u32 = 0x0001_0000;

/// Sentinel of PWV3/PWV7 headers (150 entries per second)
pub const WAVEFORM_DETAIL_MARKER: u32 = 0x0096_0000;

/// PWAV and PWV2 content, `len_header` 20
///
/// One byte per column: low 5 bits height, high 3 bits color.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveformPreview {
    pub len_preview: u32,
    pub unknown: u32,
    #[br(count = len_preview as usize)]
    pub data: Vec<u8>,
}

impl Default for WaveformPreview {
    fn default() -> Self {
        Self {
            len_preview: 0,
            unknown: WAVEFORM_PREVIEW_MARKER,
            data: Vec::new(),
        }
    }
}

/// PWV3 content, `len_header` 24, same byte packing as [`WaveformPreview`]
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveformDetail {
    /// Always 1
    pub len_entry_bytes: u32,
    pub len_entries: u32,
    pub unknown: u32,
    #[br(count = len_entries as usize)]
    pub data: Vec<u8>,
}

impl Default for WaveformDetail {
    fn default() -> Self {
        Self {
            len_entry_bytes: 1,
            len_entries: 0,
            unknown: WAVEFORM_DETAIL_MARKER,
            data: Vec::new(),
        }
    }
}

/// PWV4 content, `len_header` 24, six bytes per column
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveformColorPreview {
    /// Always 6
    pub len_entry_bytes: u32,
    pub len_entries: u32,
    pub unknown: u32,
    #[br(count = len_entry_bytes as usize * len_entries as usize)]
    pub data: Vec<u8>,
}

impl Default for WaveformColorPreview {
    fn default() -> Self {
        Self {
            len_entry_bytes: 6,
            len_entries: 0,
            unknown: 0,
            data: Vec::new(),
        }
    }
}

/// PWV5 content, `len_header` 24, one packed 16-bit entry per column
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveformColorDetail {
    /// Always 2
    pub len_entry_bytes: u32,
    pub len_entries: u32,
    pub unknown: u32,
    #[br(count = len_entries as usize)]
    pub entries: Vec<u16>,
}

impl Default for WaveformColorDetail {
    fn default() -> Self {
        Self {
            len_entry_bytes: 2,
            len_entries: 0,
            unknown: 0,
            entries: Vec::new(),
        }
    }
}

/// PWV6 content, `len_header` 20, three bytes per column
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waveform3BandPreview {
    /// Always 3
    pub len_entry_bytes: u32,
    pub len_entries: u32,
    #[br(count = len_entry_bytes as usize * len_entries as usize)]
    pub data: Vec<u8>,
}

/// PWV7 content, `len_header` 24, three bytes per column
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waveform3BandDetail {
    /// Always 3
    pub len_entry_bytes: u32,
    pub len_entries: u32,
    pub unknown: u32,
    #[br(count = len_entry_bytes as usize * len_entries as usize)]
    pub data: Vec<u8>,
}

/// PWVC content, `len_header` 14
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WaveformColorScale {
    pub unknown: u16,
    pub data: [u16; 3],
}

// -- Song Structure (PSSI) --------------------------------------------------

/// Size of one phrase entry
pub const PHRASE_SIZE: usize = 24;

/// One phrase of a PSSI song structure
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Phrase {
    /// 1-based phrase number
    pub index: u16,
    /// Beat at which the phrase starts
    pub beat: u16,
    /// Phrase kind, meaning depends on the mood
    pub kind: u16,
    pub unknown1: u8,
    pub k1: u8,
    pub unknown2: u8,
    pub k2: u8,
    pub unknown3: u8,
    pub b: u8,
    pub beat2: u16,
    pub beat3: u16,
    pub beat4: u16,
    pub unknown4: u8,
    pub k3: u8,
    pub unknown5: u8,
    /// Non-zero when the phrase ends with a fill-in
    pub fill: u8,
    pub beat_fill: u16,
}

/// PSSI content, `len_header` 32
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongStructure {
    /// Always 24
    pub len_entry_bytes: u32,
    pub len_entries: u16,
    /// 1 high, 2 mid, 3 low
    pub mood: u16,
    pub unknown1: [u8; 6],
    pub end_beat: u16,
    pub unknown2: [u8; 2],
    pub bank: u8,
    pub unknown3: u8,
    #[br(count = len_entries as usize)]
    pub entries: Vec<Phrase>,
    /// The tag was XOR-masked on disk and is masked again on write
    #[brw(ignore)]
    pub masked: bool,
}

impl Default for SongStructure {
    fn default() -> Self {
        Self {
            len_entry_bytes: PHRASE_SIZE as u32,
            len_entries: 0,
            mood: 1,
            unknown1: [0; 6],
            end_beat: 0,
            unknown2: [0; 2],
            bank: 0,
            unknown3: 0,
            entries: Vec::new(),
            masked: false,
        }
    }
}

/// Read a big-endian layout from the start of `bytes`.
/// Returns the value and the number of bytes consumed.
pub(crate) fn read_layout<T>(bytes: &[u8]) -> BinResult<(T, usize)>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(bytes);
    let value = T::read_options(&mut cursor, Endian::Big, ())?;
    Ok((value, cursor.position() as usize))
}

pub(crate) fn write_layout<T>(value: &T) -> BinResult<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(Vec::new());
    value.write_options(&mut cursor, Endian::Big, ())?;
    Ok(cursor.into_inner())
}
