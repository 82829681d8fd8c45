//! Locating analysis files
//!
//! rekordbox writes up to three analysis files per track into one directory
//! (`ANLZ0000.DAT`, `ANLZ0000.EXT`, `ANLZ0000.2EX`). This module finds those
//! directories and groups their files by extension.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::file::AnlzFile;

/// File name of an analysis file: `ANLZ` + four digits + extension
const ANLZ_NAME_PATTERN: &str = r"^ANLZ[0-9]{4}\.(DAT|EXT|2EX)$";

static ANLZ_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn anlz_name_regex() -> &'static Regex {
    ANLZ_NAME_REGEX.get_or_init(|| Regex::new(ANLZ_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Analysis files of one track, by extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnlzPaths {
    pub dat: Option<PathBuf>,
    pub ext: Option<PathBuf>,
    pub ex2: Option<PathBuf>,
}

impl AnlzPaths {
    /// Slot for an upper-case extension
    pub fn get(&self, extension: &str) -> Option<&Path> {
        match extension {
            "DAT" => self.dat.as_deref(),
            "EXT" => self.ext.as_deref(),
            "2EX" => self.ex2.as_deref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, extension: &str) -> Option<&mut Option<PathBuf>> {
        match extension {
            "DAT" => Some(&mut self.dat),
            "EXT" => Some(&mut self.ext),
            "2EX" => Some(&mut self.ex2),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dat.is_none() && self.ext.is_none() && self.ex2.is_none()
    }

    /// Present files as (extension, path), in DAT, EXT, 2EX order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        [
            ("DAT", self.dat.as_deref()),
            ("EXT", self.ext.as_deref()),
            ("2EX", self.ex2.as_deref()),
        ]
        .into_iter()
        .filter_map(|(ext, path)| path.map(|p| (ext, p)))
    }
}

fn has_anlz_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| anlz_name_regex().is_match(name))
        .unwrap_or(false)
}

/// Whether `path` is an existing file named like an analysis file
pub fn is_anlz_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    path.is_file() && has_anlz_name(path)
}

/// Group the analysis files directly inside `dir` by extension
pub fn get_anlz_paths<P: AsRef<Path>>(dir: P) -> Result<AnlzPaths> {
    let mut paths = AnlzPaths::default();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !is_anlz_file(&path) {
            continue;
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        if let Some(slot) = paths.slot_mut(&extension) {
            if slot.is_some() {
                warn!(
                    "Several .{} files in {}, keeping {}",
                    extension,
                    dir.as_ref().display(),
                    path.display()
                );
            }
            *slot = Some(path);
        }
    }
    Ok(paths)
}

/// Every directory below `root` (itself included) holding an analysis file,
/// sorted and without duplicates
pub fn walk_anlz_dirs<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();
    for entry in WalkDir::new(root.as_ref()).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && has_anlz_name(entry.path()) {
            if let Some(parent) = entry.path().parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
    }
    debug!("Found {} analysis directories in {}", dirs.len(), root.as_ref().display());
    dirs.into_iter().collect()
}

/// [`walk_anlz_dirs`] with the files of each directory grouped
pub fn walk_anlz_paths<P: AsRef<Path>>(root: P) -> Result<Vec<(PathBuf, AnlzPaths)>> {
    walk_anlz_dirs(root)
        .into_iter()
        .map(|dir| {
            let paths = get_anlz_paths(&dir)?;
            Ok((dir, paths))
        })
        .collect()
}

/// Open and parse every analysis file directly inside `dir`, keyed by path
pub fn read_anlz_files<P: AsRef<Path>>(dir: P) -> Result<Vec<(PathBuf, AnlzFile)>> {
    let paths = get_anlz_paths(dir)?;
    paths
        .iter()
        .map(|(_, path)| Ok((path.to_path_buf(), AnlzFile::open(path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern() {
        assert!(has_anlz_name(Path::new("/a/b/ANLZ0000.DAT")));
        assert!(has_anlz_name(Path::new("ANLZ1234.2EX")));
        assert!(!has_anlz_name(Path::new("ANLZ0000.dat")));
        assert!(!has_anlz_name(Path::new("ANLZ000.EXT")));
        assert!(!has_anlz_name(Path::new("ANLZ0000.DAT.bak")));
        assert!(!has_anlz_name(Path::new("xANLZ0000.DAT")));
    }

    #[test]
    fn test_locate_in_tree() {
        let root = tempfile::tempdir().unwrap();
        let track = root.path().join("PIONEER/USBANLZ/P016/0000875E");
        fs::create_dir_all(&track).unwrap();
        fs::create_dir_all(root.path().join("PIONEER/empty")).unwrap();
        for name in ["ANLZ0000.DAT", "ANLZ0000.EXT", "notes.txt"] {
            fs::write(track.join(name), b"").unwrap();
        }

        assert!(is_anlz_file(track.join("ANLZ0000.DAT")));
        assert!(!is_anlz_file(track.join("ANLZ0000.2EX")));
        assert!(!is_anlz_file(&track));

        let paths = get_anlz_paths(&track).unwrap();
        assert_eq!(paths.dat, Some(track.join("ANLZ0000.DAT")));
        assert_eq!(paths.ext, Some(track.join("ANLZ0000.EXT")));
        assert_eq!(paths.ex2, None);
        assert_eq!(paths.get("EXT"), Some(track.join("ANLZ0000.EXT").as_path()));
        assert_eq!(paths.iter().count(), 2);

        assert_eq!(walk_anlz_dirs(root.path()), vec![track.clone()]);
        let walked = walk_anlz_paths(root.path()).unwrap();
        assert_eq!(walked, vec![(track, paths)]);
    }

    #[test]
    fn test_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        assert!(get_anlz_paths(root.path()).unwrap().is_empty());
        assert!(walk_anlz_dirs(root.path()).is_empty());
        assert!(read_anlz_files(root.path()).unwrap().is_empty());
    }
}
