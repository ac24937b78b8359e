//! Walking a layer source directory into a resolved tree.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use layerkit_core::error::{LayerkitError, Result};

use super::canonical::{BaseTree, Canonicalizer};
use super::conflict::PathRegistry;
use super::entry::{CanonicalPath, EntryKind, EntryMetadata, TreeEntry};
use super::{is_whiteout, OPAQUE_MARKER};

/// A child of a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: OsString,
    pub kind: EntryKind,
    pub metadata: EntryMetadata,
}

/// Read-only view of a new layer's content.
pub trait SourceTree {
    /// Location of `path` reported in errors and read by the archiver.
    fn source_path(&self, path: &CanonicalPath) -> PathBuf;

    /// Children of the directory at `path` (the root is the empty path).
    fn read_dir(&self, path: &CanonicalPath) -> Result<Vec<SourceEntry>>;
}

/// A layer source directory on local storage.
#[derive(Debug, Clone)]
pub struct FsSourceTree {
    root: PathBuf,
}

impl FsSourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceTree for FsSourceTree {
    fn source_path(&self, path: &CanonicalPath) -> PathBuf {
        if path.is_root() {
            self.root.clone()
        } else {
            self.root.join(path.to_path_buf())
        }
    }

    fn read_dir(&self, path: &CanonicalPath) -> Result<Vec<SourceEntry>> {
        let dir = self.source_path(path);
        let read_dir = std::fs::read_dir(&dir).map_err(|e| {
            LayerkitError::LayerArchivingError(format!(
                "Failed to read directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut children = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| {
                LayerkitError::LayerArchivingError(format!(
                    "Failed to read directory entry in {}: {}",
                    dir.display(),
                    e
                ))
            })?;

            let child_path = entry.path();
            let metadata = std::fs::symlink_metadata(&child_path).map_err(|e| {
                LayerkitError::LayerArchivingError(format!(
                    "Failed to read metadata for {}: {}",
                    child_path.display(),
                    e
                ))
            })?;

            let name = entry.file_name();
            let file_type = metadata.file_type();

            // Sockets have no tar representation.
            #[cfg(unix)]
            {
                use std::os::unix::fs::FileTypeExt;
                if file_type.is_socket() {
                    tracing::debug!(path = %child_path.display(), "Skipping socket");
                    continue;
                }
            }

            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                if name == OPAQUE_MARKER {
                    EntryKind::OpaqueMarker
                } else {
                    EntryKind::Regular
                }
            } else {
                EntryKind::Special
            };

            children.push(SourceEntry {
                name,
                kind,
                metadata: EntryMetadata::from_fs(&metadata),
            });
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

/// Builds the ordered entry list of a layer from a source tree.
///
/// Directories are visited depth-first with siblings in name order. Paths
/// are remapped through the base tree unless an opaque marker marks the
/// directory (or an ancestor) as replacing the base content.
pub struct TreeBuilder<'a> {
    canonicalizer: Canonicalizer<'a>,
    registry: PathRegistry,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(base: Option<&'a dyn BaseTree>) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(base),
            registry: PathRegistry::new(),
        }
    }

    /// Walk `source` and return its entries, parents before contents.
    pub fn build(mut self, source: &dyn SourceTree) -> Result<Vec<TreeEntry>> {
        let root = CanonicalPath::root();
        let children = source.read_dir(&root)?;
        let opaque = has_opaque_marker(&children);
        self.visit_children(source, &root, &root, children, opaque)?;

        let entries = self.registry.into_entries();
        tracing::debug!(entries = entries.len(), "Resolved layer tree");
        Ok(entries)
    }

    fn visit_dir(
        &mut self,
        source: &dyn SourceTree,
        naive: CanonicalPath,
        metadata: EntryMetadata,
        inherited_opaque: bool,
    ) -> Result<()> {
        let children = source.read_dir(&naive)?;
        let opaque = inherited_opaque || has_opaque_marker(&children);
        let source_path = source.source_path(&naive);

        let canonical = if opaque {
            naive.clone()
        } else {
            let resolution = self.canonicalizer.resolve(&naive)?;
            if resolution.aliased {
                // The base symlink must survive; only the contents move.
                tracing::debug!(
                    path = %naive,
                    target = %resolution.canonical,
                    "Skipping directory that is a symlink in the base layer"
                );
                return self.visit_children(
                    source,
                    &naive,
                    &resolution.canonical,
                    children,
                    opaque,
                );
            }
            resolution.canonical
        };

        self.registry.register(TreeEntry {
            canonical_path: canonical.clone(),
            source_path,
            kind: EntryKind::Directory,
            metadata,
        })?;

        self.visit_children(source, &naive, &canonical, children, opaque)
    }

    fn visit_children(
        &mut self,
        source: &dyn SourceTree,
        naive_dir: &CanonicalPath,
        canonical_dir: &CanonicalPath,
        children: Vec<SourceEntry>,
        opaque: bool,
    ) -> Result<()> {
        for child in children {
            let naive = naive_dir.join(child.name.clone());

            if child.kind.is_dir() {
                self.visit_dir(source, naive, child.metadata, opaque)?;
                continue;
            }

            if child.kind != EntryKind::OpaqueMarker && is_whiteout(&child.name) {
                tracing::debug!(path = %naive, "Passing through whiteout");
            }

            self.registry.register(TreeEntry {
                canonical_path: canonical_dir.join(child.name),
                source_path: source.source_path(&naive),
                kind: child.kind,
                metadata: child.metadata,
            })?;
        }
        Ok(())
    }
}

fn has_opaque_marker(children: &[SourceEntry]) -> bool {
    children.iter().any(|c| c.kind == EntryKind::OpaqueMarker)
}

/// Resolve the entries of a layer built from `source` on top of `base`.
pub fn build_tree(source: &dyn SourceTree, base: Option<&dyn BaseTree>) -> Result<Vec<TreeEntry>> {
    TreeBuilder::new(base).build(source)
}
