//! In-memory directory snapshot.
//!
//! A snapshot groups file contents by the base name of their immediate
//! parent directory. Directories at different depths that share a base name
//! land in the same bucket; when two of them hold a file with the same name,
//! the file visited last wins. Files are visited depth-first with entries
//! sorted by name, i.e. in component-wise sorted path order.

use crate::error::{Result, VpkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File name -> raw contents
pub type Folder = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    folders: BTreeMap<String, Folder>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file, returning the contents it replaced
    pub fn insert(
        &mut self,
        folder: impl Into<String>,
        file: impl Into<String>,
        contents: Vec<u8>,
    ) -> Option<Vec<u8>> {
        self.folders
            .entry(folder.into())
            .or_default()
            .insert(file.into(), contents)
    }

    pub fn get(&self, folder: &str, file: &str) -> Option<&[u8]> {
        self.folders
            .get(folder)
            .and_then(|files| files.get(file))
            .map(Vec::as_slice)
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.get(name)
    }

    /// Buckets in name order
    pub fn folders(&self) -> impl Iterator<Item = (&str, &Folder)> {
        self.folders.iter().map(|(name, files)| (name.as_str(), files))
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of distinct (folder, file) entries
    pub fn file_count(&self) -> usize {
        self.folders.values().map(BTreeMap::len).sum()
    }

    /// Sum of all file sizes
    pub fn total_bytes(&self) -> usize {
        self.folders
            .values()
            .flat_map(|files| files.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Serialize with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| VpkError::Serialization(e.to_string()))
    }

    /// Deserialize from bincode
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| VpkError::Serialization(e.to_string()))
    }

    /// Write every bucket as `<dest>/<folder>/<file>`.
    ///
    /// All names are checked before anything is written. Returns the number
    /// of files written.
    pub fn extract_to(&self, dest: &Path) -> Result<usize> {
        for (folder, files) in &self.folders {
            check_entry_name(folder)?;
            for file in files.keys() {
                check_entry_name(file)?;
            }
        }

        let mut written = 0;
        for (folder, files) in &self.folders {
            let dir = dest.join(folder);
            fs::create_dir_all(&dir)?;
            for (file, contents) in files {
                fs::write(dir.join(file), contents)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Walk `root` and collect every regular file into a snapshot.
///
/// Returns the snapshot and the number of files visited, which includes
/// files later overwritten by a name collision.
pub fn scan(root: &Path) -> Result<(Snapshot, usize)> {
    if !root.is_dir() {
        return Err(VpkError::DirectoryNotFound(root.to_path_buf()));
    }
    // Resolves "." and ".." so the root bucket gets a real name
    let root = fs::canonicalize(root)?;

    let mut snapshot = Snapshot::new();
    let mut visited = 0;

    for entry in WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let msg = e.to_string();
            VpkError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, msg)),
            )
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let folder = entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = entry.file_name().to_string_lossy().into_owned();

        let contents = fs::read(entry.path())?;
        debug!(folder = %folder, file = %file, bytes = contents.len(), "read file");

        if snapshot.insert(folder.as_str(), file.as_str(), contents).is_some() {
            warn!(folder = %folder, file = %file, path = %entry.path().display(), "file replaced an earlier entry with the same folder and name");
        }
        visited += 1;
    }

    Ok((snapshot, visited))
}

/// MIME type sniffed from the file contents.
///
/// Known binary signatures win; otherwise valid UTF-8 is `text/plain` and
/// anything else is `application/octet-stream`.
pub fn content_type(contents: &[u8]) -> &'static str {
    if contents.is_empty() {
        return "application/x-empty";
    }
    match infer::get(contents) {
        Some(kind) => kind.mime_type(),
        None if std::str::from_utf8(contents).is_ok() => "text/plain",
        None => "application/octet-stream",
    }
}

fn check_entry_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.contains(['/', '\\', '\0']) {
        return Err(VpkError::UnsafeEntryName(name.to_string()));
    }
    Ok(())
}
