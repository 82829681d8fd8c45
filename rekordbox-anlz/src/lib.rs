//! rekordbox-anlz: Pioneer rekordbox analysis files with write support
//!
//! Reads and writes the big-endian ANLZ files (.DAT, .EXT, .2EX) that hold
//! beat grids, cue points, waveforms and song structure of a track. Parsed
//! files serialize back to the identical bytes, including tags and fields
//! whose meaning is unknown.
//!
//! Based on Deep Symmetry's reverse engineering of the format.

pub mod beat_grid;
pub mod cue;
pub mod error;
pub mod file;
pub mod locate;
pub mod song_structure;
pub mod structs;
pub mod tag;
pub mod track;
pub mod waveform;

pub use cue::{CueKind, CueListType, CueStatus, HotCueColor};
pub use error::{Error, Result};
pub use file::AnlzFile;
pub use locate::{
    get_anlz_paths, is_anlz_file, read_anlz_files, walk_anlz_dirs, walk_anlz_paths, AnlzPaths,
};
pub use song_structure::Mood;
pub use tag::{Tag, TagContent, TagKind};
pub use waveform::{WaveformColorEntry, WaveformColorPreviewColumn, WaveformColumn};
