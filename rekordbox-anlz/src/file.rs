//! ANLZ file container
//!
//! A `PMAI` header followed by a sequence of tags. Parsing walks the tag
//! stream by declared lengths; building reconciles every length first and
//! checks the result against the declared file length.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::structs::{read_layout, write_layout, BeatGrid, FileHeader, FILE_HEADER_SIZE, FILE_MAGIC};
use crate::tag::{Tag, TagContent, TagKind};

/// File extensions of analysis files, upper case
pub const ANLZ_EXTENSIONS: [&str; 3] = ["DAT", "EXT", "2EX"];

/// Parsed analysis file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnlzFile {
    pub header: FileHeader,
    /// Tags in file order
    pub tags: Vec<Tag>,
    path: Option<PathBuf>,
}

/// A key is either a 4-character type code (`PQTZ`) or an alias (`beat_grid`)
fn matches_key(tag: &Tag, key: &str) -> bool {
    let kind = tag.kind();
    kind.code().as_slice() == key.as_bytes() || kind.name() == key
}

impl AnlzFile {
    /// Empty file with a default header
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse an analysis file. Only .DAT, .EXT and .2EX are accepted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        if !ANLZ_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Error::UnsupportedExtension(format!(".{}", ext)));
        }

        debug!("Reading file {}", path.display());
        let data = fs::read(path)?;
        let mut file = Self::parse(&data)?;
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(Error::Truncated {
                context: "file header".into(),
                offset: 0,
                needed: FILE_HEADER_SIZE,
                available: data.len(),
            });
        }
        if data[..4] != FILE_MAGIC {
            return Err(Error::InvalidMagic {
                expected: String::from_utf8_lossy(&FILE_MAGIC).into_owned(),
                found: String::from_utf8_lossy(&data[..4]).into_owned(),
            });
        }
        let len_header = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if len_header < FILE_HEADER_SIZE {
            return Err(Error::Decode {
                code: "PMAI".into(),
                offset: 0,
                reason: format!("`len_header` ({}) is smaller than {}", len_header, FILE_HEADER_SIZE),
            });
        }
        if len_header > data.len() {
            return Err(Error::Truncated {
                context: "file header".into(),
                offset: 0,
                needed: len_header,
                available: data.len(),
            });
        }
        let (header, _) = read_layout::<FileHeader>(&data[..len_header])?;

        let len_file = header.len_file as usize;
        let mut tags = Vec::new();
        let mut offset = len_header;
        while offset < len_file {
            if offset == data.len() {
                warn!(
                    "File ends after {} bytes, before the declared `len_file` {}",
                    data.len(),
                    len_file
                );
                break;
            }
            let tag = Tag::decode_at(&data[offset..], offset)?;
            offset += tag.len_tag as usize;
            tags.push(tag);
        }
        if data.len() > len_file {
            debug!("Ignoring {} bytes past `len_file`", data.len() - len_file);
        }
        debug!("Parsed {} tags", tags.len());

        Ok(Self {
            header,
            tags,
            path: None,
        })
    }

    /// Path the file was opened from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reconcile the lengths of every tag and of the file header
    pub fn update_len(&mut self) -> Result<()> {
        let mut len_file = self.header.len_header as usize;
        for tag in &mut self.tags {
            tag.update_len()?;
            len_file += tag.len_tag as usize;
        }
        self.header.len_file = u32::try_from(len_file).map_err(|_| Error::LengthOverflow {
            code: String::from_utf8_lossy(&FILE_MAGIC).into_owned(),
            field: "len_file",
            value: len_file,
        })?;
        Ok(())
    }

    /// Reconcile lengths, then serialize
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.update_len()?;

        let mut data = write_layout(&self.header)?;
        for tag in &self.tags {
            data.extend_from_slice(&tag.build()?);
        }

        if data.len() != self.header.len_file as usize {
            return Err(Error::FileLength {
                expected: self.header.len_file,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Write back to the path the file was opened from
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::Value("File has no path, use `save_as`".into()))?;
        self.save_as(path)
    }

    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let data = self.build()?;
        debug!("Writing {} bytes to {}", data.len(), path.as_ref().display());
        fs::write(path, data)?;
        Ok(())
    }

    pub fn add_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    /// Type codes of all tags, in file order
    pub fn tag_types(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.kind().to_string()).collect()
    }

    /// Distinct type codes, in order of first appearance
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for code in self.tag_types() {
            if !keys.contains(&code) {
                keys.push(code);
            }
        }
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tags.iter().any(|t| matches_key(t, key))
    }

    /// All tags matching a code or alias, in file order
    pub fn tags(&self, key: &str) -> Vec<&Tag> {
        let found: Vec<&Tag> = self.tags.iter().filter(|t| matches_key(t, key)).collect();
        if found.is_empty() {
            warn_missing(key);
        }
        found
    }

    pub fn tags_mut(&mut self, key: &str) -> Vec<&mut Tag> {
        let found: Vec<&mut Tag> = self
            .tags
            .iter_mut()
            .filter(|t| matches_key(t, key))
            .collect();
        if found.is_empty() {
            warn_missing(key);
        }
        found
    }

    /// First tag matching a code or alias
    pub fn tag(&self, key: &str) -> Option<&Tag> {
        self.tags(key).into_iter().next()
    }

    pub fn tag_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.tags_mut(key).into_iter().next()
    }

    /// Content of the first matching tag
    pub fn get(&self, key: &str) -> Option<&TagContent> {
        self.tag(key).map(|t| &t.content)
    }

    pub fn get_all(&self, key: &str) -> Vec<&TagContent> {
        self.tags(key).into_iter().map(|t| &t.content).collect()
    }

    pub fn beat_grid(&self) -> Option<&BeatGrid> {
        self.get("PQTZ").and_then(TagContent::as_beat_grid)
    }

    /// Track path stored in the PPTH tag
    pub fn track_path(&self) -> Option<String> {
        self.get("PPTH")
            .and_then(TagContent::as_path)
            .map(|p| p.path())
    }

    /// Replace the track path and reconcile the tag's lengths
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        let tag = self
            .tag_mut("PPTH")
            .ok_or_else(|| Error::MissingTag("PPTH".into()))?;
        let content = tag
            .content
            .as_path_mut()
            .ok_or_else(|| Error::MissingTag("PPTH".into()))?;
        content.set_path(path);
        tag.update_len()
    }
}

fn warn_missing(key: &str) {
    let known = TagKind::KNOWN
        .iter()
        .any(|k| k.code().as_slice() == key.as_bytes() || k.name() == key);
    if known || key == "unknown" {
        debug!("No '{}' tag in file", key);
    } else {
        warn!("Tag '{}' not supported", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{Beat, CueList, CuePoint, TrackPath};

    fn sample() -> AnlzFile {
        let mut file = AnlzFile::new();
        let mut path = TrackPath::default();
        path.set_path("/Contents/Track.mp3");
        file.add_tag(Tag::new(TagContent::Path(path)));
        file.add_tag(Tag::new(TagContent::BeatGrid(BeatGrid::constant_tempo(120.0, 0.0, 2.0).unwrap())));
        file.add_tag(Tag::new(TagContent::CueList(CueList::default())));
        file.add_tag(Tag::new(TagContent::CueList(CueList {
            list_type: 1,
            ..CueList::default()
        })));
        file
    }

    #[test]
    fn test_build_and_parse() {
        let mut file = sample();
        let data = file.build().unwrap();
        assert_eq!(data.len(), file.header.len_file as usize);
        assert_eq!(&data[..4], b"PMAI");

        let parsed = AnlzFile::parse(&data).unwrap();
        assert_eq!(parsed.num_tags(), 4);
        assert_eq!(parsed.tag_types(), vec!["PPTH", "PQTZ", "PCOB", "PCOB"]);
        assert_eq!(parsed.keys(), vec!["PPTH", "PQTZ", "PCOB"]);
        assert_eq!(parsed.track_path().as_deref(), Some("/Contents/Track.mp3"));
        assert_eq!(parsed.beat_grid().unwrap().len(), 4);
        assert_eq!(parsed.tags, file.tags);
    }

    #[test]
    fn test_lookup_by_code_and_alias() {
        let mut file = sample();
        file.update_len().unwrap();

        assert!(file.contains("PQTZ"));
        assert!(file.contains("beat_grid"));
        assert!(!file.contains("PWV5"));
        assert_eq!(file.get("beat_grid"), file.get("PQTZ"));

        let cues = file.get_all("PCOB");
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].as_cue_list().unwrap().list_type, 0);
        assert_eq!(cues[1].as_cue_list().unwrap().list_type, 1);

        assert!(file.get("PWV5").is_none());
        assert!(file.get_all("XXXX").is_empty());
    }

    #[test]
    fn test_set_path_reconciles_tag() {
        let mut file = sample();
        file.update_len().unwrap();
        file.set_path("C:\\Music\\Other.flac").unwrap();

        let tag = file.tag("PPTH").unwrap();
        assert_eq!(tag.len_tag, 16 + 2 * 20);
        assert_eq!(file.track_path().as_deref(), Some("C:/Music/Other.flac"));

        let data = file.build().unwrap();
        let parsed = AnlzFile::parse(&data).unwrap();
        assert_eq!(parsed.track_path().as_deref(), Some("C:/Music/Other.flac"));
    }

    #[test]
    fn test_set_path_without_tag() {
        let mut file = AnlzFile::new();
        assert!(matches!(file.set_path("/a.mp3"), Err(Error::MissingTag(_))));
    }

    #[test]
    fn test_empty_file() {
        let mut file = AnlzFile::new();
        let data = file.build().unwrap();
        assert_eq!(data.len(), FILE_HEADER_SIZE);
        assert_eq!(AnlzFile::parse(&data).unwrap().num_tags(), 0);
    }

    #[test]
    fn test_build_reconciles_lengths() {
        let mut file = sample();
        file.update_len().unwrap();
        let data = file.build().unwrap();

        let mut parsed = AnlzFile::parse(&data).unwrap();
        let grid = parsed.tags[1].content.as_beat_grid_mut().unwrap();
        grid.entries.push(Beat::new(1, 120.0, 2.0).unwrap());
        // build reconciles on its own
        let rebuilt = parsed.build().unwrap();
        assert_eq!(rebuilt.len(), data.len() + 8);
    }

    #[test]
    fn test_build_rejects_count_overflow() {
        let mut file = sample();
        let list = file.tags[2].content.as_cue_list_mut().unwrap();
        list.entries = vec![CuePoint::new(0, 1.0).unwrap(); 0x1_0000];

        match file.build() {
            Err(Error::LengthOverflow { code, field, .. }) => {
                assert_eq!(code, "PCOB");
                assert_eq!(field, "count");
            }
            other => panic!("expected overflow, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = AnlzFile::new().build().unwrap();
        data[..4].copy_from_slice(b"PMAX");
        assert!(matches!(AnlzFile::parse(&data), Err(Error::InvalidMagic { .. })));
    }

    #[test]
    fn test_rejects_short_header() {
        assert!(matches!(
            AnlzFile::parse(b"PMAI\0\0\0\x1c"),
            Err(Error::Truncated { needed: 28, .. })
        ));
    }
}
