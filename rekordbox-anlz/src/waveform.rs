//! Waveform column views
//!
//! The waveform tags store packed columns as raw bytes. These types unpack one
//! column at a time; the content structs expose them through `columns()` and
//! `set_columns()`. Counts such as `len_preview` are left for the next length
//! update.

use serde::Serialize;

use crate::structs::{
    Waveform3BandDetail, Waveform3BandPreview, WaveformColorDetail, WaveformColorPreview,
    WaveformDetail, WaveformPreview,
};

/// Monochrome column of PWAV, PWV2 and PWV3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WaveformColumn {
    /// Height 0-31 (low 5 bits)
    pub height: u8,
    /// Whiteness 0-7 (high 3 bits)
    pub whiteness: u8,
}

impl WaveformColumn {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            height: byte & 0x1F,
            whiteness: byte >> 5,
        }
    }

    pub fn to_byte(self) -> u8 {
        ((self.whiteness & 0x07) << 5) | (self.height & 0x1F)
    }
}

/// Six-byte column of the PWV4 color preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WaveformColorPreviewColumn {
    pub unknown: u8,
    /// Luminance boost
    pub luminance: u8,
    /// Inverse intensity of the blue waveform
    pub inverse_blue: u8,
    pub red: u8,
    pub green: u8,
    /// Blue, also the height of the front waveform
    pub blue: u8,
}

impl WaveformColorPreviewColumn {
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self {
            unknown: bytes[0],
            luminance: bytes[1],
            inverse_blue: bytes[2] & 0x7F,
            red: bytes[3] & 0x7F,
            green: bytes[4] & 0x7F,
            blue: bytes[5] & 0x7F,
        }
    }

    pub fn to_bytes(self) -> [u8; 6] {
        [
            self.unknown,
            self.luminance,
            self.inverse_blue & 0x7F,
            self.red & 0x7F,
            self.green & 0x7F,
            self.blue & 0x7F,
        ]
    }

    /// Height of the rear waveform: the loudest color channel
    pub fn back_height(&self) -> u8 {
        self.inverse_blue.max(self.red).max(self.green)
    }
}

/// Packed 16-bit column of the PWV5 color detail waveform.
/// Bits 15-13 red, 12-10 green, 9-7 blue, 6-2 height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WaveformColorEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Height 0-31
    pub height: u8,
}

impl WaveformColorEntry {
    pub fn from_bits(value: u16) -> Self {
        Self {
            red: ((value >> 13) & 0x07) as u8,
            green: ((value >> 10) & 0x07) as u8,
            blue: ((value >> 7) & 0x07) as u8,
            height: ((value >> 2) & 0x1F) as u8,
        }
    }

    pub fn to_bits(self) -> u16 {
        ((self.red as u16 & 0x07) << 13)
            | ((self.green as u16 & 0x07) << 10)
            | ((self.blue as u16 & 0x07) << 7)
            | ((self.height as u16 & 0x1F) << 2)
    }

    /// Height scaled to 0.0-1.0
    pub fn normalized_height(&self) -> f64 {
        self.height as f64 / 31.0
    }
}

impl WaveformPreview {
    pub fn columns(&self) -> Vec<WaveformColumn> {
        self.data.iter().copied().map(WaveformColumn::from_byte).collect()
    }

    pub fn heights(&self) -> Vec<u8> {
        self.data.iter().map(|b| b & 0x1F).collect()
    }

    pub fn set_columns(&mut self, columns: &[WaveformColumn]) {
        self.data = columns.iter().map(|c| c.to_byte()).collect();
    }
}

impl WaveformDetail {
    pub fn columns(&self) -> Vec<WaveformColumn> {
        self.data.iter().copied().map(WaveformColumn::from_byte).collect()
    }

    pub fn heights(&self) -> Vec<u8> {
        self.data.iter().map(|b| b & 0x1F).collect()
    }

    pub fn set_columns(&mut self, columns: &[WaveformColumn]) {
        self.data = columns.iter().map(|c| c.to_byte()).collect();
    }
}

impl WaveformColorPreview {
    /// Decoded columns; a partial column at the end is skipped
    pub fn columns(&self) -> Vec<WaveformColorPreviewColumn> {
        self.data
            .chunks_exact(6)
            .map(|c| WaveformColorPreviewColumn::from_bytes([c[0], c[1], c[2], c[3], c[4], c[5]]))
            .collect()
    }

    pub fn set_columns(&mut self, columns: &[WaveformColorPreviewColumn]) {
        self.len_entry_bytes = 6;
        self.data = columns.iter().flat_map(|c| c.to_bytes()).collect();
    }
}

impl WaveformColorDetail {
    pub fn columns(&self) -> Vec<WaveformColorEntry> {
        self.entries.iter().copied().map(WaveformColorEntry::from_bits).collect()
    }

    pub fn set_columns(&mut self, columns: &[WaveformColorEntry]) {
        self.entries = columns.iter().map(|c| c.to_bits()).collect();
    }
}

/// Split three-byte band entries
fn bands(data: &[u8]) -> Vec<[u8; 3]> {
    data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

impl Waveform3BandPreview {
    pub fn bands(&self) -> Vec<[u8; 3]> {
        bands(&self.data)
    }
}

impl Waveform3BandDetail {
    pub fn bands(&self) -> Vec<[u8; 3]> {
        bands(&self.data)
    }
}
