//! Cue list accessors (PCOB, PCO2)

use serde::Serialize;

use crate::beat_grid::seconds_to_ms;
use crate::error::{Error, Result};
use crate::structs::{
    CueList, CuePoint, ExtendedCueList, ExtendedCuePoint, CUE_POINT_MAGIC, CUE_POINT_SIZE,
    EXTENDED_CUE_POINT_FIXED_SIZE, EXTENDED_CUE_POINT_MAGIC, NO_LOOP,
};

/// Which cues a list holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueListType {
    Memory,
    HotCue,
    Other(u32),
}

impl CueListType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => CueListType::Memory,
            1 => CueListType::HotCue,
            other => CueListType::Other(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            CueListType::Memory => 0,
            CueListType::HotCue => 1,
            CueListType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueStatus {
    Disabled,
    Enabled,
    Other(u32),
}

impl CueStatus {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => CueStatus::Disabled,
            4 => CueStatus::Enabled,
            other => CueStatus::Other(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            CueStatus::Disabled => 0,
            CueStatus::Enabled => 4,
            CueStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueKind {
    Single,
    Loop,
    Other(u8),
}

impl CueKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => CueKind::Single,
            2 => CueKind::Loop,
            other => CueKind::Other(other),
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            CueKind::Single => 1,
            CueKind::Loop => 2,
            CueKind::Other(raw) => raw,
        }
    }
}

/// Hot cue color of a PCP2 entry: palette index plus the RGB used for LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HotCueColor {
    pub palette_index: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl HotCueColor {
    pub const GREEN: HotCueColor = HotCueColor { palette_index: 0x00, red: 0x28, green: 0xE2, blue: 0x14 };
    pub const CYAN: HotCueColor = HotCueColor { palette_index: 0x09, red: 0x00, green: 0xE0, blue: 0xFF };
    pub const BLUE: HotCueColor = HotCueColor { palette_index: 0x11, red: 0x00, green: 0x50, blue: 0xFF };
    pub const PURPLE: HotCueColor = HotCueColor { palette_index: 0x3E, red: 0x64, green: 0x73, blue: 0xFF };
    pub const PINK: HotCueColor = HotCueColor { palette_index: 0x1A, red: 0xFF, green: 0x00, blue: 0xC8 };
    pub const RED: HotCueColor = HotCueColor { palette_index: 0x2A, red: 0xE6, green: 0x28, blue: 0x28 };
    pub const ORANGE: HotCueColor = HotCueColor { palette_index: 0x22, red: 0xFF, green: 0xA0, blue: 0x00 };
    pub const YELLOW: HotCueColor = HotCueColor { palette_index: 0x32, red: 0xFF, green: 0xFF, blue: 0x00 };

    /// Color rekordbox assigns to hot cue slots A-H by default
    pub fn default_for_slot(slot: u32) -> Self {
        match slot {
            2 => Self::CYAN,
            3 => Self::BLUE,
            4 => Self::PURPLE,
            5 => Self::PINK,
            6 => Self::RED,
            7 => Self::ORANGE,
            8 => Self::YELLOW,
            _ => Self::GREEN,
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        [self.palette_index, self.red, self.green, self.blue]
    }
}

fn ms_to_seconds(time: u32) -> f64 {
    time as f64 / 1000.0
}

/// Loop end in milliseconds; the `NO_LOOP` marker itself isn't a valid end
fn loop_end_ms(seconds: f64) -> Result<u32> {
    match seconds_to_ms(seconds)? {
        NO_LOOP => Err(Error::Value(format!("Loop end {}s out of range", seconds))),
        ms => Ok(ms),
    }
}

fn loop_seconds(loop_time: u32) -> Option<f64> {
    (loop_time != NO_LOOP).then(|| ms_to_seconds(loop_time))
}

fn be_u32(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(..4)?.try_into().ok()?))
}

impl CueList {
    pub fn new(list_type: CueListType) -> Self {
        Self {
            list_type: list_type.to_raw(),
            ..Self::default()
        }
    }

    pub fn list_type(&self) -> CueListType {
        CueListType::from_raw(self.list_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CuePoint {
    /// Enabled single cue; `hot_cue` 0 makes a memory cue
    pub fn new(hot_cue: u32, seconds: f64) -> Result<Self> {
        Ok(Self {
            magic: CUE_POINT_MAGIC,
            len_header: 0x1C,
            len_entry: CUE_POINT_SIZE as u32,
            hot_cue,
            status: CueStatus::Enabled.to_raw(),
            unknown1: 0x10000,
            order_first: 0xFFFF,
            order_last: 0xFFFF,
            cue_type: CueKind::Single.to_raw(),
            unknown2: 0,
            unknown3: 1000,
            time: seconds_to_ms(seconds)?,
            loop_time: NO_LOOP,
            unknown4: [0; 16],
            trailing: Vec::new(),
        })
    }

    pub fn is_hot_cue(&self) -> bool {
        self.hot_cue != 0
    }

    pub fn status(&self) -> CueStatus {
        CueStatus::from_raw(self.status)
    }

    pub fn set_status(&mut self, status: CueStatus) {
        self.status = status.to_raw();
    }

    pub fn kind(&self) -> CueKind {
        CueKind::from_raw(self.cue_type)
    }

    pub fn set_kind(&mut self, kind: CueKind) {
        self.cue_type = kind.to_raw();
    }

    pub fn seconds(&self) -> f64 {
        ms_to_seconds(self.time)
    }

    pub fn set_seconds(&mut self, seconds: f64) -> Result<()> {
        self.time = seconds_to_ms(seconds)?;
        Ok(())
    }

    /// Loop end in seconds, `None` when the cue isn't a loop
    pub fn loop_end(&self) -> Option<f64> {
        loop_seconds(self.loop_time)
    }

    /// Set or clear the loop end, switching the cue type to match
    pub fn set_loop_end(&mut self, seconds: Option<f64>) -> Result<()> {
        match seconds {
            Some(end) => {
                self.loop_time = loop_end_ms(end)?;
                self.set_kind(CueKind::Loop);
            }
            None => {
                self.loop_time = NO_LOOP;
                self.set_kind(CueKind::Single);
            }
        }
        Ok(())
    }
}

impl ExtendedCueList {
    pub fn new(list_type: CueListType) -> Self {
        Self {
            list_type: list_type.to_raw(),
            ..Self::default()
        }
    }

    pub fn list_type(&self) -> CueListType {
        CueListType::from_raw(self.list_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decoded variable tail of a PCP2 entry
struct Tail {
    comment: Vec<u8>,
    color: Option<[u8; 4]>,
    rest: Vec<u8>,
}

impl Tail {
    fn split(tail: &[u8]) -> Self {
        let Some(len_comment) = be_u32(tail) else {
            return Self { comment: Vec::new(), color: None, rest: Vec::new() };
        };
        let comment_end = (4 + len_comment as usize).min(tail.len());
        let comment = tail[4..comment_end].to_vec();
        let color = tail
            .get(comment_end..comment_end + 4)
            .and_then(|b| b.try_into().ok());
        let rest = match color {
            Some(_) => tail[comment_end + 4..].to_vec(),
            None => Vec::new(),
        };
        Self { comment, color, rest }
    }

    fn join(&self) -> Vec<u8> {
        let mut tail = Vec::with_capacity(8 + self.comment.len() + self.rest.len());
        tail.extend_from_slice(&(self.comment.len() as u32).to_be_bytes());
        tail.extend_from_slice(&self.comment);
        tail.extend_from_slice(&self.color.unwrap_or_default());
        tail.extend_from_slice(&self.rest);
        tail
    }
}

impl ExtendedCuePoint {
    /// Single hot cue with the slot's default color and no comment
    pub fn new(hot_cue: u32, seconds: f64) -> Result<Self> {
        let color = HotCueColor::default_for_slot(hot_cue);
        let tail = Tail {
            comment: Vec::new(),
            color: Some(color.to_bytes()),
            rest: Vec::new(),
        }
        .join();
        Ok(Self {
            magic: EXTENDED_CUE_POINT_MAGIC,
            len_header: 0x10,
            len_entry: (EXTENDED_CUE_POINT_FIXED_SIZE + tail.len()) as u32,
            hot_cue,
            cue_type: CueKind::Single.to_raw(),
            unknown1: [0; 3],
            time: seconds_to_ms(seconds)?,
            loop_time: NO_LOOP,
            color_id: 0,
            unknown2: [0; 7],
            loop_numerator: 0,
            loop_denominator: 0,
            tail,
        })
    }

    pub fn kind(&self) -> CueKind {
        CueKind::from_raw(self.cue_type)
    }

    pub fn seconds(&self) -> f64 {
        ms_to_seconds(self.time)
    }

    pub fn set_seconds(&mut self, seconds: f64) -> Result<()> {
        self.time = seconds_to_ms(seconds)?;
        Ok(())
    }

    pub fn loop_end(&self) -> Option<f64> {
        loop_seconds(self.loop_time)
    }

    pub fn set_loop_end(&mut self, seconds: Option<f64>) -> Result<()> {
        match seconds {
            Some(end) => {
                self.loop_time = loop_end_ms(end)?;
                self.cue_type = CueKind::Loop.to_raw();
            }
            None => {
                self.loop_time = NO_LOOP;
                self.cue_type = CueKind::Single.to_raw();
            }
        }
        Ok(())
    }

    /// Comment text, `None` when the entry stops before its comment length
    pub fn comment(&self) -> Option<String> {
        be_u32(&self.tail)?;
        let raw = Tail::split(&self.tail).comment;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        let text = String::from_utf16_lossy(&units);
        Some(text.trim_end_matches('\0').to_string())
    }

    /// Replace the comment. `len_entry` follows on the next length update.
    pub fn set_comment(&mut self, comment: &str) {
        let mut tail = Tail::split(&self.tail);
        tail.comment = if comment.is_empty() {
            Vec::new()
        } else {
            comment
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_be_bytes)
                .collect()
        };
        self.tail = tail.join();
    }

    pub fn color(&self) -> Option<HotCueColor> {
        let [palette_index, red, green, blue] = Tail::split(&self.tail).color?;
        Some(HotCueColor { palette_index, red, green, blue })
    }

    pub fn set_color(&mut self, color: HotCueColor) {
        let mut tail = Tail::split(&self.tail);
        tail.color = Some(color.to_bytes());
        self.tail = tail.join();
    }
}
