//! Track-level tags: audio path (PPTH) and VBR seek index (PVBR)

use crate::structs::{TrackPath, VbrIndex};

impl TrackPath {
    pub fn new(path: &str) -> Self {
        let mut track_path = Self::default();
        track_path.set_path(path);
        track_path
    }

    /// Decoded path, without the NUL terminator
    pub fn path(&self) -> String {
        let units: Vec<u16> = self
            .data
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Store a new path with `/` separators. Updates `len_path` right away,
    /// the tag's `len_tag` follows on the next length update.
    pub fn set_path(&mut self, path: &str) {
        let path = path.replace('\\', "/");
        self.data = path
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_be_bytes)
            .collect();
        self.len_path = self.data.len() as u32;
    }
}

impl VbrIndex {
    /// Byte offsets of the seek index
    pub fn offsets(&self) -> &[u32] {
        &self.index
    }
}
