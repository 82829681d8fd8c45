//! Tag codec
//!
//! One [`Tag`] per record of the ANLZ tag stream. The 4-byte type code selects
//! a [`TagKind`]; every kind maps to one layout of the struct catalog, and
//! codes outside the catalog fall back to [`TagContent::Unknown`], which keeps
//! the raw content bytes.
//!
//! Lengths follow a two-phase contract: mutating a tag's content never touches
//! `len_tag` or any internal count. [`Tag::update_len`] reconciles them from
//! the current content and must run before [`Tag::build`], which refuses to
//! emit a tag whose byte length disagrees with `len_tag`.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::song_structure;
use crate::structs::*;

/// Known tag types, plus a catch-all for codes outside the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// PQTZ
    BeatGrid,
    /// PQT2
    ExtendedBeatGrid,
    /// PCOB, seen in both DAT and EXT files
    CueList,
    /// PCO2, seen in EXT files
    ExtendedCueList,
    /// PPTH
    Path,
    /// PVBR
    Vbr,
    /// PSSI, seen in EXT files
    SongStructure,
    /// PWAV
    WaveformPreview,
    /// PWV2
    WaveformTinyPreview,
    /// PWV3, seen in EXT files
    WaveformDetail,
    /// PWV4, seen in EXT files
    WaveformColorPreview,
    /// PWV5, seen in EXT files
    WaveformColorDetail,
    /// PWV6, seen in 2EX files
    Waveform3BandPreview,
    /// PWV7, seen in 2EX files
    Waveform3BandDetail,
    /// PWVC, seen in 2EX files
    WaveformColorScale,
    Unknown([u8; 4]),
}

impl TagKind {
    /// Every kind of the catalog, in no particular order
    pub const KNOWN: [TagKind; 15] = [
        TagKind::BeatGrid,
        TagKind::ExtendedBeatGrid,
        TagKind::CueList,
        TagKind::ExtendedCueList,
        TagKind::Path,
        TagKind::Vbr,
        TagKind::SongStructure,
        TagKind::WaveformPreview,
        TagKind::WaveformTinyPreview,
        TagKind::WaveformDetail,
        TagKind::WaveformColorPreview,
        TagKind::WaveformColorDetail,
        TagKind::Waveform3BandPreview,
        TagKind::Waveform3BandDetail,
        TagKind::WaveformColorScale,
    ];

    pub fn from_code(code: [u8; 4]) -> Self {
        match &code {
            b"PQTZ" => TagKind::BeatGrid,
            b"PQT2" => TagKind::ExtendedBeatGrid,
            b"PCOB" => TagKind::CueList,
            b"PCO2" => TagKind::ExtendedCueList,
            b"PPTH" => TagKind::Path,
            b"PVBR" => TagKind::Vbr,
            b"PSSI" => TagKind::SongStructure,
            b"PWAV" => TagKind::WaveformPreview,
            b"PWV2" => TagKind::WaveformTinyPreview,
            b"PWV3" => TagKind::WaveformDetail,
            b"PWV4" => TagKind::WaveformColorPreview,
            b"PWV5" => TagKind::WaveformColorDetail,
            b"PWV6" => TagKind::Waveform3BandPreview,
            b"PWV7" => TagKind::Waveform3BandDetail,
            b"PWVC" => TagKind::WaveformColorScale,
            _ => TagKind::Unknown(code),
        }
    }

    pub fn code(&self) -> [u8; 4] {
        match self {
            TagKind::BeatGrid => *b"PQTZ",
            TagKind::ExtendedBeatGrid => *b"PQT2",
            TagKind::CueList => *b"PCOB",
            TagKind::ExtendedCueList => *b"PCO2",
            TagKind::Path => *b"PPTH",
            TagKind::Vbr => *b"PVBR",
            TagKind::SongStructure => *b"PSSI",
            TagKind::WaveformPreview => *b"PWAV",
            TagKind::WaveformTinyPreview => *b"PWV2",
            TagKind::WaveformDetail => *b"PWV3",
            TagKind::WaveformColorPreview => *b"PWV4",
            TagKind::WaveformColorDetail => *b"PWV5",
            TagKind::Waveform3BandPreview => *b"PWV6",
            TagKind::Waveform3BandDetail => *b"PWV7",
            TagKind::WaveformColorScale => *b"PWVC",
            TagKind::Unknown(code) => *code,
        }
    }

    /// Human-readable alias used for lookups, e.g. `beat_grid` for PQTZ
    pub fn name(&self) -> &'static str {
        match self {
            TagKind::BeatGrid => "beat_grid",
            TagKind::ExtendedBeatGrid => "beat_grid2",
            TagKind::CueList => "cue_list",
            TagKind::ExtendedCueList => "cue_list2",
            TagKind::Path => "path",
            TagKind::Vbr => "vbr",
            TagKind::SongStructure => "structure",
            TagKind::WaveformPreview => "wf_preview",
            TagKind::WaveformTinyPreview => "wf_tiny_preview",
            TagKind::WaveformDetail => "wf_detail",
            TagKind::WaveformColorPreview => "wf_color",
            TagKind::WaveformColorDetail => "wf_color_detail",
            TagKind::Waveform3BandPreview => "PWV6",
            TagKind::Waveform3BandDetail => "PWV7",
            TagKind::WaveformColorScale => "PWVC",
            TagKind::Unknown(_) => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|kind| kind.name() == name)
    }

    /// Expected `len_header`, when the kind has a fixed one
    pub fn expected_len_header(&self) -> Option<u32> {
        match self {
            TagKind::BeatGrid => Some(24),
            TagKind::ExtendedBeatGrid => Some(56),
            TagKind::CueList => Some(24),
            TagKind::ExtendedCueList => Some(20),
            TagKind::Path => Some(16),
            TagKind::Vbr => Some(16),
            TagKind::SongStructure => Some(32),
            TagKind::WaveformPreview | TagKind::WaveformTinyPreview => Some(20),
            TagKind::WaveformDetail => Some(24),
            TagKind::WaveformColorPreview => Some(24),
            TagKind::WaveformColorDetail => Some(24),
            TagKind::Waveform3BandPreview => Some(20),
            TagKind::Waveform3BandDetail => Some(24),
            TagKind::WaveformColorScale => Some(14),
            TagKind::Unknown(_) => None,
        }
    }

    /// Expected `len_tag`, only for kinds with a fixed total size
    pub fn expected_len_tag(&self) -> Option<u32> {
        match self {
            TagKind::Vbr => Some(1620),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TagKind::Unknown(_))
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(&self.code()))
    }
}

/// Decoded content of a tag, one variant per [`TagKind`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TagContent {
    BeatGrid(BeatGrid),
    ExtendedBeatGrid(ExtendedBeatGrid),
    CueList(CueList),
    ExtendedCueList(ExtendedCueList),
    Path(TrackPath),
    Vbr(VbrIndex),
    SongStructure(SongStructure),
    WaveformPreview(WaveformPreview),
    WaveformTinyPreview(WaveformPreview),
    WaveformDetail(WaveformDetail),
    WaveformColorPreview(WaveformColorPreview),
    WaveformColorDetail(WaveformColorDetail),
    Waveform3BandPreview(Waveform3BandPreview),
    Waveform3BandDetail(Waveform3BandDetail),
    WaveformColorScale(WaveformColorScale),
    /// Content of a tag outside the catalog, kept verbatim
    Unknown { code: [u8; 4], data: Vec<u8> },
}

macro_rules! content_accessors {
    ($($variant:ident($ty:ty) => $as_ref:ident, $as_mut:ident;)*) => {
        impl TagContent {
            $(
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        TagContent::$variant(content) => Some(content),
                        _ => None,
                    }
                }

                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        TagContent::$variant(content) => Some(content),
                        _ => None,
                    }
                }
            )*
        }
    };
}

content_accessors! {
    BeatGrid(BeatGrid) => as_beat_grid, as_beat_grid_mut;
    ExtendedBeatGrid(ExtendedBeatGrid) => as_extended_beat_grid, as_extended_beat_grid_mut;
    CueList(CueList) => as_cue_list, as_cue_list_mut;
    ExtendedCueList(ExtendedCueList) => as_extended_cue_list, as_extended_cue_list_mut;
    Path(TrackPath) => as_path, as_path_mut;
    Vbr(VbrIndex) => as_vbr, as_vbr_mut;
    SongStructure(SongStructure) => as_song_structure, as_song_structure_mut;
    WaveformPreview(WaveformPreview) => as_waveform_preview, as_waveform_preview_mut;
    WaveformTinyPreview(WaveformPreview) => as_tiny_waveform_preview, as_tiny_waveform_preview_mut;
    WaveformDetail(WaveformDetail) => as_waveform_detail, as_waveform_detail_mut;
    WaveformColorPreview(WaveformColorPreview) => as_color_preview, as_color_preview_mut;
    WaveformColorDetail(WaveformColorDetail) => as_color_detail, as_color_detail_mut;
    Waveform3BandPreview(Waveform3BandPreview) => as_3band_preview, as_3band_preview_mut;
    Waveform3BandDetail(Waveform3BandDetail) => as_3band_detail, as_3band_detail_mut;
    WaveformColorScale(WaveformColorScale) => as_color_scale, as_color_scale_mut;
}

impl TagContent {
    pub fn kind(&self) -> TagKind {
        match self {
            TagContent::BeatGrid(_) => TagKind::BeatGrid,
            TagContent::ExtendedBeatGrid(_) => TagKind::ExtendedBeatGrid,
            TagContent::CueList(_) => TagKind::CueList,
            TagContent::ExtendedCueList(_) => TagKind::ExtendedCueList,
            TagContent::Path(_) => TagKind::Path,
            TagContent::Vbr(_) => TagKind::Vbr,
            TagContent::SongStructure(_) => TagKind::SongStructure,
            TagContent::WaveformPreview(_) => TagKind::WaveformPreview,
            TagContent::WaveformTinyPreview(_) => TagKind::WaveformTinyPreview,
            TagContent::WaveformDetail(_) => TagKind::WaveformDetail,
            TagContent::WaveformColorPreview(_) => TagKind::WaveformColorPreview,
            TagContent::WaveformColorDetail(_) => TagKind::WaveformColorDetail,
            TagContent::Waveform3BandPreview(_) => TagKind::Waveform3BandPreview,
            TagContent::Waveform3BandDetail(_) => TagKind::Waveform3BandDetail,
            TagContent::WaveformColorScale(_) => TagKind::WaveformColorScale,
            TagContent::Unknown { code, .. } => TagKind::Unknown(*code),
        }
    }

    /// Decode the bytes following the tag header.
    /// Returns the content and how many bytes its layout consumed.
    fn decode(kind: TagKind, bytes: &[u8]) -> binrw::BinResult<(Self, usize)> {
        let decoded = match kind {
            TagKind::BeatGrid => read_layout(bytes).map(|(c, n)| (TagContent::BeatGrid(c), n))?,
            TagKind::ExtendedBeatGrid => {
                read_layout(bytes).map(|(c, n)| (TagContent::ExtendedBeatGrid(c), n))?
            }
            TagKind::CueList => read_layout(bytes).map(|(c, n)| (TagContent::CueList(c), n))?,
            TagKind::ExtendedCueList => {
                read_layout(bytes).map(|(c, n)| (TagContent::ExtendedCueList(c), n))?
            }
            TagKind::Path => read_layout(bytes).map(|(c, n)| (TagContent::Path(c), n))?,
            TagKind::Vbr => read_layout(bytes).map(|(c, n)| (TagContent::Vbr(c), n))?,
            TagKind::SongStructure => {
                read_layout(bytes).map(|(c, n)| (TagContent::SongStructure(c), n))?
            }
            TagKind::WaveformPreview => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformPreview(c), n))?
            }
            TagKind::WaveformTinyPreview => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformTinyPreview(c), n))?
            }
            TagKind::WaveformDetail => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformDetail(c), n))?
            }
            TagKind::WaveformColorPreview => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformColorPreview(c), n))?
            }
            TagKind::WaveformColorDetail => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformColorDetail(c), n))?
            }
            TagKind::Waveform3BandPreview => {
                read_layout(bytes).map(|(c, n)| (TagContent::Waveform3BandPreview(c), n))?
            }
            TagKind::Waveform3BandDetail => {
                read_layout(bytes).map(|(c, n)| (TagContent::Waveform3BandDetail(c), n))?
            }
            TagKind::WaveformColorScale => {
                read_layout(bytes).map(|(c, n)| (TagContent::WaveformColorScale(c), n))?
            }
            TagKind::Unknown(code) => (
                TagContent::Unknown {
                    code,
                    data: bytes.to_vec(),
                },
                bytes.len(),
            ),
        };
        Ok(decoded)
    }

    fn encode(&self) -> binrw::BinResult<Vec<u8>> {
        match self {
            TagContent::BeatGrid(c) => write_layout(c),
            TagContent::ExtendedBeatGrid(c) => {
                let mut bytes = write_layout(c)?;
                // An empty grid ends right after the header, without an entry array
                if c.entry_count == 0 {
                    bytes.truncate(EXTENDED_BEAT_GRID_HEADER_SIZE);
                }
                Ok(bytes)
            }
            TagContent::CueList(c) => write_layout(c),
            TagContent::ExtendedCueList(c) => write_layout(c),
            TagContent::Path(c) => write_layout(c),
            TagContent::Vbr(c) => write_layout(c),
            TagContent::SongStructure(c) => write_layout(c),
            TagContent::WaveformPreview(c) | TagContent::WaveformTinyPreview(c) => {
                write_layout(c)
            }
            TagContent::WaveformDetail(c) => write_layout(c),
            TagContent::WaveformColorPreview(c) => write_layout(c),
            TagContent::WaveformColorDetail(c) => write_layout(c),
            TagContent::Waveform3BandPreview(c) => write_layout(c),
            TagContent::Waveform3BandDetail(c) => write_layout(c),
            TagContent::WaveformColorScale(c) => write_layout(c),
            TagContent::Unknown { data, .. } => Ok(data.clone()),
        }
    }

    /// Sync internal counts with the current entries and return the content
    /// length that follows the tag's `len_header`. Fails when a count no
    /// longer fits its field.
    fn reconcile(&mut self) -> Result<usize> {
        let kind = self.kind();
        let body = match self {
            TagContent::BeatGrid(c) => {
                c.entry_count = fit(kind, "entry_count", c.entries.len())?;
                8 * c.entries.len()
            }
            TagContent::ExtendedBeatGrid(c) => {
                c.entry_count = fit(kind, "entry_count", c.entries.len())?;
                2 * c.entries.len()
            }
            TagContent::CueList(c) => {
                c.count = fit(kind, "count", c.entries.len())?;
                let mut total = 0;
                for entry in &mut c.entries {
                    let len = CUE_POINT_SIZE + entry.trailing.len();
                    entry.len_entry = fit(kind, "len_entry", len)?;
                    total += len;
                }
                total
            }
            TagContent::ExtendedCueList(c) => {
                c.count = fit(kind, "count", c.entries.len())?;
                let mut total = 0;
                for entry in &mut c.entries {
                    let len = EXTENDED_CUE_POINT_FIXED_SIZE + entry.tail.len();
                    entry.len_entry = fit(kind, "len_entry", len)?;
                    total += len;
                }
                total
            }
            TagContent::Path(c) => {
                c.len_path = fit(kind, "len_path", c.data.len())?;
                c.data.len()
            }
            TagContent::Vbr(c) => 4 * c.index.len() + 4,
            TagContent::SongStructure(c) => {
                c.len_entries = fit(kind, "len_entries", c.entries.len())?;
                PHRASE_SIZE * c.entries.len()
            }
            TagContent::WaveformPreview(c) | TagContent::WaveformTinyPreview(c) => {
                c.len_preview = fit(kind, "len_preview", c.data.len())?;
                c.data.len()
            }
            TagContent::WaveformDetail(c) => {
                c.len_entries = fit(kind, "len_entries", c.data.len())?;
                c.data.len()
            }
            TagContent::WaveformColorPreview(c) => {
                if c.len_entry_bytes > 0 {
                    c.len_entries =
                        fit(kind, "len_entries", c.data.len() / c.len_entry_bytes as usize)?;
                }
                c.data.len()
            }
            TagContent::WaveformColorDetail(c) => {
                c.len_entries = fit(kind, "len_entries", c.entries.len())?;
                2 * c.entries.len()
            }
            TagContent::Waveform3BandPreview(c) => {
                if c.len_entry_bytes > 0 {
                    c.len_entries =
                        fit(kind, "len_entries", c.data.len() / c.len_entry_bytes as usize)?;
                }
                c.data.len()
            }
            TagContent::Waveform3BandDetail(c) => {
                if c.len_entry_bytes > 0 {
                    c.len_entries =
                        fit(kind, "len_entries", c.data.len() / c.len_entry_bytes as usize)?;
                }
                c.data.len()
            }
            TagContent::WaveformColorScale(c) => 2 * c.data.len(),
            TagContent::Unknown { data, .. } => data.len(),
        };
        Ok(body)
    }

    /// Warn about format sentinels that differ from their usual value
    fn check_sentinels(&self, offset: usize) {
        let code = self.kind().to_string();
        let check = |field: &str, found: u32, expected: u32| {
            if found != expected {
                warn!(
                    "`{}` ({:#x}) of '{}' at offset {} doesn't match the expected value {:#x}",
                    field, found, code, offset, expected
                );
            }
        };
        match self {
            TagContent::BeatGrid(c) => check("unknown2", c.unknown2, BEAT_GRID_MARKER),
            TagContent::ExtendedBeatGrid(c) => {
                check("unknown2", c.unknown2, EXTENDED_BEAT_GRID_MARKER)
            }
            TagContent::CueList(c) => {
                for entry in &c.entries {
                    check(
                        "magic",
                        u32::from_be_bytes(entry.magic),
                        u32::from_be_bytes(CUE_POINT_MAGIC),
                    );
                    check("unknown1", entry.unknown1, 0x10000);
                    check("unknown3", entry.unknown3 as u32, 1000);
                }
            }
            TagContent::ExtendedCueList(c) => {
                for entry in &c.entries {
                    check(
                        "magic",
                        u32::from_be_bytes(entry.magic),
                        u32::from_be_bytes(EXTENDED_CUE_POINT_MAGIC),
                    );
                }
            }
            TagContent::WaveformPreview(c) | TagContent::WaveformTinyPreview(c) => {
                check("unknown", c.unknown, WAVEFORM_PREVIEW_MARKER)
            }
            TagContent::WaveformDetail(c) => {
                check("len_entry_bytes", c.len_entry_bytes, 1);
                check("unknown", c.unknown, WAVEFORM_DETAIL_MARKER);
            }
            TagContent::WaveformColorPreview(c) => check("len_entry_bytes", c.len_entry_bytes, 6),
            TagContent::WaveformColorDetail(c) => check("len_entry_bytes", c.len_entry_bytes, 2),
            TagContent::Waveform3BandPreview(c) => check("len_entry_bytes", c.len_entry_bytes, 3),
            TagContent::Waveform3BandDetail(c) => {
                check("len_entry_bytes", c.len_entry_bytes, 3);
                check("unknown", c.unknown, WAVEFORM_DETAIL_MARKER);
            }
            TagContent::SongStructure(c) => {
                check("len_entry_bytes", c.len_entry_bytes, PHRASE_SIZE as u32);
                if c.mood().is_none() {
                    warn!("Unexpected song structure mood {} at offset {}", c.mood, offset);
                }
            }
            _ => {}
        }
    }
}

/// One record of the ANLZ tag stream
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Declared header length, tag header included
    pub len_header: u32,
    /// Declared total length. Stale after mutations until [`Tag::update_len`].
    pub len_tag: u32,
    pub content: TagContent,
    /// Bytes inside `len_tag` that the layout of this kind doesn't cover
    pub trailing: Vec<u8>,
}

impl Tag {
    /// Wrap new content. `len_tag` stays at `len_header` until
    /// [`Tag::update_len`] runs.
    pub fn new(content: TagContent) -> Self {
        let len_header = content
            .kind()
            .expected_len_header()
            .unwrap_or(TAG_HEADER_SIZE as u32);
        Self {
            len_header,
            len_tag: len_header,
            content,
            trailing: Vec::new(),
        }
    }

    /// Decode one tag from bytes starting at its type code
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_at(data, 0)
    }

    /// Like [`Tag::decode`]; `offset` is the tag's file position, for messages
    pub(crate) fn decode_at(data: &[u8], offset: usize) -> Result<Self> {
        if data.len() < TAG_HEADER_SIZE {
            return Err(Error::Truncated {
                context: "tag header".into(),
                offset,
                needed: TAG_HEADER_SIZE,
                available: data.len(),
            });
        }
        let (header, _) = read_layout::<TagHeader>(&data[..TAG_HEADER_SIZE])?;
        let kind = TagKind::from_code(header.code);
        let code = kind.to_string();

        let len_tag = header.len_tag as usize;
        if len_tag < TAG_HEADER_SIZE || header.len_tag < header.len_header {
            return Err(Error::Decode {
                code,
                offset,
                reason: format!(
                    "`len_tag` ({}) is smaller than its header (`len_header` {})",
                    header.len_tag, header.len_header
                ),
            });
        }
        if len_tag > data.len() {
            return Err(Error::Truncated {
                context: format!("'{}' tag", code),
                offset,
                needed: len_tag,
                available: data.len(),
            });
        }

        if !kind.is_known() {
            warn!("Tag '{}' at offset {} not supported, keeping raw bytes", code, offset);
        }
        check_lengths(kind, &header);

        let body = &data[TAG_HEADER_SIZE..len_tag];
        let masked = kind == TagKind::SongStructure && song_structure::is_masked(body);
        let plain: Cow<[u8]> = if masked {
            let mut unmasked = body.to_vec();
            song_structure::toggle_mask(&mut unmasked);
            Cow::Owned(unmasked)
        } else {
            Cow::Borrowed(body)
        };

        let (mut content, consumed) =
            TagContent::decode(kind, &plain).map_err(|e| Error::Decode {
                code: code.clone(),
                offset,
                reason: e.to_string(),
            })?;
        if let TagContent::SongStructure(structure) = &mut content {
            structure.masked = masked;
        }
        content.check_sentinels(offset);

        let trailing = plain[consumed..].to_vec();
        if !trailing.is_empty() {
            warn!(
                "{} trailing bytes of '{}' at offset {} not interpreted",
                trailing.len(),
                code,
                offset
            );
        }

        debug!(
            "Parsed tag '{}' (len_header={}, len_tag={}, offset={})",
            code, header.len_header, header.len_tag, offset
        );

        Ok(Self {
            len_header: header.len_header,
            len_tag: header.len_tag,
            content,
            trailing,
        })
    }

    pub fn kind(&self) -> TagKind {
        self.content.kind()
    }

    pub fn code(&self) -> [u8; 4] {
        self.kind().code()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Recompute internal counts and `len_tag` from the current content.
    /// Fails instead of wrapping when a count or length outgrows its field.
    pub fn update_len(&mut self) -> Result<()> {
        let body = self.content.reconcile()?;
        let base = match self.content {
            TagContent::Unknown { .. } => TAG_HEADER_SIZE,
            _ => self.len_header as usize,
        };
        self.len_tag = fit(self.kind(), "len_tag", base + body + self.trailing.len())?;
        Ok(())
    }

    /// Serialize the tag. Fails if the bytes disagree with `len_tag`.
    pub fn build(&self) -> Result<Vec<u8>> {
        let header = TagHeader {
            code: self.code(),
            len_header: self.len_header,
            len_tag: self.len_tag,
        };
        let mut data = write_layout(&header)?;

        let mut body = self.content.encode()?;
        body.extend_from_slice(&self.trailing);
        if let TagContent::SongStructure(structure) = &self.content {
            if structure.masked {
                song_structure::toggle_mask(&mut body);
            }
        }
        data.extend_from_slice(&body);

        if data.len() != self.len_tag as usize {
            return Err(Error::TagLength {
                code: self.kind().to_string(),
                expected: self.len_tag,
                actual: data.len(),
            });
        }
        Ok(data)
    }
}

/// Narrow a computed count or length into its on-disk field
fn fit<T: TryFrom<usize>>(kind: TagKind, field: &'static str, value: usize) -> Result<T> {
    T::try_from(value).map_err(|_| Error::LengthOverflow {
        code: kind.to_string(),
        field,
        value,
    })
}

fn check_lengths(kind: TagKind, header: &TagHeader) {
    if let Some(expected) = kind.expected_len_header() {
        if expected != header.len_header {
            warn!(
                "`len_header` ({}) of '{}' doesn't match the expected value {}",
                header.len_header, kind, expected
            );
        }
    }
    if let Some(expected) = kind.expected_len_tag() {
        if expected != header.len_tag {
            warn!(
                "`len_tag` ({}) of '{}' doesn't match the expected value {}",
                header.len_tag, kind, expected
            );
        }
    }
}
