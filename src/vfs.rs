use std::path::PathBuf;

/// A file staged in memory before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEntry {
    /// Path relative to the output root. Always confined under it.
    pub destination: PathBuf,
    /// Full file contents, written as UTF-8.
    pub content: String,
    /// Permission bits applied after the write.
    pub mode: Option<u32>,
}
/// Everything a document asks for, queued up before committing it to disk.
///
/// `directories` holds folders that must exist even when nothing is written
/// into them; parents of `files` are created on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFS {
    pub directories: Vec<PathBuf>,
    pub files: Vec<VirtualEntry>,
    /// Folder named by `project.name`, relative to the output root.
    pub project: Option<PathBuf>,
}
impl VirtualFS {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}
