use std::path::Path;

use crate::app::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Filesystem side of a directory listing. File contents are never read.
pub trait DirectoryLister {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>>;
}

/// Lists the local filesystem, folders first, then by name.
#[derive(Debug, Clone, Default)]
pub struct LocalLibrary;

impl DirectoryLister for LocalLibrary {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }

        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }
}
