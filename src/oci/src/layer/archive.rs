//! Serialization of a resolved layer tree into a tar stream.

use std::io::Write;

use layerkit_core::error::{LayerkitError, Result};
use tar::{Builder, HeaderMode};

use super::entry::{EntryKind, TreeEntry};

/// Sequential tar writer for layer entries.
///
/// Content, mode, ownership and mtime come from each entry's source
/// object; the archive name is its canonical path.
pub struct LayerArchiver<W: Write> {
    builder: Builder<W>,
}

impl<W: Write> LayerArchiver<W> {
    pub fn new(writer: W) -> Self {
        let mut builder = Builder::new(writer);
        builder.mode(HeaderMode::Complete);
        builder.follow_symlinks(false);
        Self { builder }
    }

    /// Append one entry.
    pub fn append(&mut self, entry: &TreeEntry) -> Result<()> {
        let name = entry.canonical_path.to_path_buf();

        let result = match entry.kind {
            EntryKind::Directory => self.builder.append_dir(&name, &entry.source_path),
            EntryKind::Regular
            | EntryKind::OpaqueMarker
            | EntryKind::Symlink
            | EntryKind::Special => self.builder.append_path_with_name(&entry.source_path, &name),
        };

        result.map_err(|e| {
            LayerkitError::LayerArchivingError(format!(
                "Failed to add {} to layer as '{}': {}",
                entry.source_path.display(),
                entry.canonical_path,
                e
            ))
        })
    }

    /// Write the end-of-archive marker and return the writer.
    pub fn finish(self) -> Result<W> {
        self.builder.into_inner().map_err(|e| {
            LayerkitError::LayerArchivingError(format!("Failed to finalize layer: {}", e))
        })
    }
}

/// Archive `entries` in order into `writer`.
pub fn archive<W: Write>(entries: &[TreeEntry], writer: W) -> Result<W> {
    let mut archiver = LayerArchiver::new(writer);
    for entry in entries {
        archiver.append(entry)?;
    }
    archiver.finish()
}
