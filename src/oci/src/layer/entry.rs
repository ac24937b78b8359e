//! Paths and entries of a resolved layer tree.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A normalized relative path inside a layer, stored as components.
///
/// Ordering is component-wise, so a directory always sorts before
/// everything nested under it and a subtree is contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalPath(Vec<OsString>);

impl CanonicalPath {
    /// The layer root (empty path).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Normalize a relative path: `.` is dropped, `..` pops (never above
    /// the root), and leading `/` is ignored.
    pub fn from_relative(path: &Path) -> Self {
        Self::root().join_relative(path)
    }

    /// Append `path` to this one with the same normalization rules as
    /// [`CanonicalPath::from_relative`].
    pub fn join_relative(&self, path: &Path) -> Self {
        let mut components = self.0.clone();
        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(name.to_os_string()),
                Component::ParentDir => {
                    components.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        Self(components)
    }

    /// Append a single name.
    pub fn join(&self, name: impl Into<OsString>) -> Self {
        let mut components = self.0.clone();
        components.push(name.into());
        Self(components)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.last().map(|c| c.as_os_str())
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn components(&self) -> &[OsString] {
        &self.0
    }

    /// Relative filesystem path (empty for the root).
    pub fn to_path_buf(&self) -> PathBuf {
        self.0.iter().collect()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", component.to_string_lossy())?;
        }
        Ok(())
    }
}

impl From<&str> for CanonicalPath {
    fn from(path: &str) -> Self {
        Self::from_relative(Path::new(path))
    }
}

impl From<&Path> for CanonicalPath {
    fn from(path: &Path) -> Self {
        Self::from_relative(path)
    }
}

/// Kind of a layer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    Regular,
    /// `.wh..wh..opq`, archived as a regular file
    OpaqueMarker,
    /// Symlink in the source tree, archived as a link and never followed
    Symlink,
    /// Fifo or device node
    Special,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::Regular => write!(f, "regular"),
            Self::OpaqueMarker => write!(f, "opaque-marker"),
            Self::Symlink => write!(f, "symlink"),
            Self::Special => write!(f, "special"),
        }
    }
}

/// Ownership, permission and timestamp metadata of a source object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    /// Permission bits (including setuid/setgid/sticky)
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Modification time (seconds since epoch)
    pub mtime: i64,
}

impl EntryMetadata {
    #[cfg(unix)]
    pub fn from_fs(metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            mode: metadata.mode() & 0o7777,
            uid: metadata.uid(),
            gid: metadata.gid(),
            mtime: metadata.mtime(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_fs(metadata: &std::fs::Metadata) -> Self {
        let mode = match (metadata.is_dir(), metadata.permissions().readonly()) {
            (true, false) => 0o755,
            (true, true) => 0o555,
            (false, false) => 0o644,
            (false, true) => 0o444,
        };
        let mtime = metadata
            .modified()
            .map(|t| {
                t.duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs() as i64
            })
            .unwrap_or(0);

        Self {
            mode,
            uid: 0,
            gid: 0,
            mtime,
        }
    }

    /// Whether two directories can be merged into one layer entry.
    pub fn same_mode_and_owner(&self, other: &EntryMetadata) -> bool {
        self.mode == other.mode && self.uid == other.uid && self.gid == other.gid
    }
}

/// One entry of a resolved layer tree, ready to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path inside the layer archive
    pub canonical_path: CanonicalPath,
    /// Object in the source tree the content and metadata come from
    pub source_path: PathBuf,
    pub kind: EntryKind,
    pub metadata: EntryMetadata,
}
