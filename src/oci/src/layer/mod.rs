//! Layer creation from a source directory on top of an extracted base.
//!
//! ```text
//!   source dir ──► TreeBuilder ──► [TreeEntry] ──► LayerArchiver ──► tar
//!                    │    │
//!                    │    └── PathRegistry (merge / conflict per canonical path)
//!                    └─────── Canonicalizer ◄── BaseTree (symlinks of the base rootfs)
//! ```

pub mod archive;
pub mod canonical;
pub mod conflict;
pub mod entry;
pub mod tree;

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

use layerkit_core::error::Result;

pub use archive::{archive, LayerArchiver};
pub use canonical::{BaseNode, BaseTree, Canonicalizer, FsBaseTree, Resolution};
pub use conflict::PathRegistry;
pub use entry::{CanonicalPath, EntryKind, EntryMetadata, TreeEntry};
pub use tree::{build_tree, FsSourceTree, SourceEntry, SourceTree, TreeBuilder};

/// Marker file declaring that a directory replaces the base directory.
pub const OPAQUE_MARKER: &str = ".wh..wh..opq";

/// Prefix of a file that deletes its sibling `<name>` from the base.
pub const WHITEOUT_PREFIX: &str = ".wh.";

/// Whether `name` is a whiteout or opaque marker.
pub fn is_whiteout(name: &OsStr) -> bool {
    name.to_str()
        .map(|n| n.starts_with(WHITEOUT_PREFIX))
        .unwrap_or(false)
}

/// Resolve the tree of `layer_dir` against an optional extracted base and
/// archive it into `writer`.
///
/// Returns the archived entries.
pub fn archive_layer<W: Write>(
    layer_dir: &Path,
    base_layer_dir: Option<&Path>,
    writer: W,
) -> Result<Vec<TreeEntry>> {
    let source = FsSourceTree::new(layer_dir);
    let base = base_layer_dir.map(FsBaseTree::new);
    let entries = build_tree(&source, base.as_ref().map(|b| b as &dyn BaseTree))?;

    archive(&entries, writer)?;

    tracing::debug!(
        layer = %layer_dir.display(),
        entries = entries.len(),
        "Archived layer"
    );
    Ok(entries)
}
