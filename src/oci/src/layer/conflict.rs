//! Registry of layer entries keyed by canonical path.
//!
//! Independently discovered source paths can resolve to the same place in
//! the layer (`bin/dir1` and `usr/bin/dir1` when `bin -> usr/bin`).
//! Directories with identical mode and ownership merge into one entry;
//! anything else is a conflict the caller has to fix in the source tree.

use std::collections::BTreeMap;

use layerkit_core::error::{LayerkitError, Result};

use super::entry::{CanonicalPath, TreeEntry};

/// First-seen entry per canonical path.
#[derive(Debug, Default)]
pub struct PathRegistry {
    entries: BTreeMap<CanonicalPath, TreeEntry>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry, merging it into an equivalent directory or failing
    /// with `LayerArchivingError` naming both source paths.
    pub fn register(&mut self, entry: TreeEntry) -> Result<()> {
        let Some(existing) = self.entries.get(&entry.canonical_path) else {
            self.entries.insert(entry.canonical_path.clone(), entry);
            return Ok(());
        };

        let mergeable = existing.kind.is_dir()
            && entry.kind.is_dir()
            && existing.metadata.same_mode_and_owner(&entry.metadata);

        if mergeable {
            tracing::debug!(
                path = %entry.canonical_path,
                first = %existing.source_path.display(),
                merged = %entry.source_path.display(),
                "Merged directories resolving to the same layer path"
            );
            return Ok(());
        }

        Err(LayerkitError::LayerArchivingError(format!(
            "Conflicting paths pointing to '{}': {}, {}",
            entry.canonical_path,
            existing.source_path.display(),
            entry.source_path.display()
        )))
    }

    pub fn get(&self, path: &CanonicalPath) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical order: parents before their contents.
    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::entry::{EntryKind, EntryMetadata};
    use std::path::PathBuf;

    fn entry(canonical: &str, source: &str, kind: EntryKind, mode: u32) -> TreeEntry {
        TreeEntry {
            canonical_path: CanonicalPath::from(canonical),
            source_path: PathBuf::from(source),
            kind,
            metadata: EntryMetadata {
                mode,
                uid: 1000,
                gid: 1000,
                mtime: 0,
            },
        }
    }

    #[test]
    fn test_register_distinct_paths() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("usr", "/l/usr", EntryKind::Directory, 0o755))
            .unwrap();
        registry
            .register(entry("usr/a.txt", "/l/usr/a.txt", EntryKind::Regular, 0o644))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_equal_directories_merge_keeping_first() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("usr/bin/dir1", "/l/bin/dir1", EntryKind::Directory, 0o755))
            .unwrap();
        registry
            .register(entry(
                "usr/bin/dir1",
                "/l/usr/bin/dir1",
                EntryKind::Directory,
                0o755,
            ))
            .unwrap();

        assert_eq!(registry.len(), 1);
        let kept = registry.get(&CanonicalPath::from("usr/bin/dir1")).unwrap();
        assert_eq!(kept.source_path, PathBuf::from("/l/bin/dir1"));
    }

    #[test]
    fn test_directories_with_different_mode_conflict() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("usr/bin/dir1", "/l/bin/dir1", EntryKind::Directory, 0o770))
            .unwrap();
        let err = registry
            .register(entry(
                "usr/bin/dir1",
                "/l/usr/bin/dir1",
                EntryKind::Directory,
                0o775,
            ))
            .unwrap_err();

        assert!(matches!(err, LayerkitError::LayerArchivingError(_)));
        assert_eq!(
            err.to_string(),
            "Conflicting paths pointing to 'usr/bin/dir1': /l/bin/dir1, /l/usr/bin/dir1"
        );
    }

    #[test]
    fn test_directories_with_different_owner_conflict() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("opt", "/l/a/opt", EntryKind::Directory, 0o755))
            .unwrap();
        let mut other = entry("opt", "/l/b/opt", EntryKind::Directory, 0o755);
        other.metadata.uid = 0;
        assert!(registry.register(other).is_err());
    }

    #[test]
    fn test_files_never_merge() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry(
                "usr/bin/dir1/same.txt",
                "/l/bin/dir1/same.txt",
                EntryKind::Regular,
                0o644,
            ))
            .unwrap();
        let err = registry
            .register(entry(
                "usr/bin/dir1/same.txt",
                "/l/usr/bin/dir1/same.txt",
                EntryKind::Regular,
                0o644,
            ))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Conflicting paths pointing to 'usr/bin/dir1/same.txt': \
             /l/bin/dir1/same.txt, /l/usr/bin/dir1/same.txt"
        );
    }

    #[test]
    fn test_file_and_directory_conflict() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("etc/app", "/l/etc/app", EntryKind::Directory, 0o755))
            .unwrap();
        assert!(registry
            .register(entry("etc/app", "/l/alias/app", EntryKind::Symlink, 0o777))
            .is_err());
    }

    #[test]
    fn test_into_entries_orders_parents_first() {
        let mut registry = PathRegistry::new();
        registry
            .register(entry("usr/bin/dir1", "/l/bin/dir1", EntryKind::Directory, 0o755))
            .unwrap();
        registry
            .register(entry(
                "usr/bin/dir1/a.txt",
                "/l/bin/dir1/a.txt",
                EntryKind::Regular,
                0o644,
            ))
            .unwrap();
        registry
            .register(entry("usr", "/l/usr", EntryKind::Directory, 0o755))
            .unwrap();
        registry
            .register(entry("usr/bin", "/l/usr/bin", EntryKind::Directory, 0o755))
            .unwrap();

        let order: Vec<String> = registry
            .into_entries()
            .iter()
            .map(|e| e.canonical_path.to_string())
            .collect();
        assert_eq!(
            order,
            vec!["usr", "usr/bin", "usr/bin/dir1", "usr/bin/dir1/a.txt"]
        );
    }
}
