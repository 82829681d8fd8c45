//! Song structure (PSSI)
//!
//! Newer rekordbox versions XOR-mask the PSSI content from the `mood` field
//! onwards. The key stream repeats every 19 bytes and is offset by the phrase
//! count, which itself stays in the clear.

use serde::Serialize;

use crate::structs::{Phrase, SongStructure};

const MASK_KEY: [u8; 19] = [
    0xCB, 0xE1, 0xEE, 0xFA, 0xE5, 0xEE, 0xAD, 0xEE, 0xE9, 0xD2, 0xE9, 0xEB, 0xE1, 0xE9, 0xF3,
    0xE8, 0xE9, 0xF4, 0xE1,
];

/// Content offset of `mood`, where masking starts
const MASK_START: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mood {
    High,
    Mid,
    Low,
}

impl Mood {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Mood::High),
            2 => Some(Mood::Mid),
            3 => Some(Mood::Low),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Mood::High => 1,
            Mood::Mid => 2,
            Mood::Low => 3,
        }
    }
}

/// Whether raw PSSI content looks masked, judged by its mood
pub(crate) fn is_masked(content: &[u8]) -> bool {
    match content.get(MASK_START..MASK_START + 2) {
        Some(raw) => Mood::from_raw(u16::from_be_bytes([raw[0], raw[1]])).is_none(),
        None => false,
    }
}

/// Apply or remove the mask in place; the operation is its own inverse
pub(crate) fn toggle_mask(content: &mut [u8]) {
    if content.len() <= MASK_START {
        return;
    }
    let len_entries = u16::from_be_bytes([content[4], content[5]]);
    for (x, byte) in content[MASK_START..].iter_mut().enumerate() {
        let key = (MASK_KEY[x % MASK_KEY.len()] as u16).wrapping_add(len_entries) as u8;
        *byte ^= key;
    }
}

impl SongStructure {
    pub fn mood(&self) -> Option<Mood> {
        Mood::from_raw(self.mood)
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood.to_raw();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Phrases in playback order
    pub fn phrases(&self) -> &[Phrase] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_content() -> Vec<u8> {
        let mut content = Vec::new();
        content.extend_from_slice(&24u32.to_be_bytes());
        content.extend_from_slice(&2u16.to_be_bytes());
        content.extend_from_slice(&2u16.to_be_bytes());
        content.extend_from_slice(&[0; 12]);
        content.extend(std::iter::repeat(0x11).take(48));
        content
    }

    #[test]
    fn test_mask_is_involution() {
        let plain = plain_content();
        let mut data = plain.clone();

        toggle_mask(&mut data);
        assert_ne!(data, plain);
        assert_eq!(&data[..MASK_START], &plain[..MASK_START]);
        // First masked byte: 0x00 ^ (0xCB + 2)
        assert_eq!(data[MASK_START], 0xCD);
        assert!(is_masked(&data));

        toggle_mask(&mut data);
        assert_eq!(data, plain);
        assert!(!is_masked(&data));
    }

    #[test]
    fn test_short_content_untouched() {
        let mut data = vec![0, 0, 0, 24, 0, 1];
        toggle_mask(&mut data);
        assert_eq!(data, vec![0, 0, 0, 24, 0, 1]);
        assert!(!is_masked(&data));
    }

    #[test]
    fn test_mood() {
        let mut s = SongStructure::default();
        assert_eq!(s.mood(), Some(Mood::High));
        s.set_mood(Mood::Low);
        assert_eq!(s.mood, 3);
        s.mood = 9;
        assert_eq!(s.mood(), None);
    }
}
