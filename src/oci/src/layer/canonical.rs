//! Resolution of layer paths through the symlinks of a base rootfs.
//!
//! A base image commonly ships directories that are symlinks
//! (`bin -> usr/bin`). Content a new layer places under such a path must
//! land at the symlink target, otherwise unpacking the layer would replace
//! the symlink with a real directory and shadow the base content.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use layerkit_core::error::{LayerkitError, Result};

use super::entry::CanonicalPath;

/// Maximum symlinks followed while resolving one path.
pub const MAX_SYMLINK_HOPS: usize = 40;

/// What a base tree holds at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseNode {
    Directory,
    File,
    Symlink(PathBuf),
}

/// Read-only view of an extracted base rootfs.
pub trait BaseTree {
    /// Inspect `path` without following a symlink at its final component.
    ///
    /// Every ancestor of `path` handed in by the canonicalizer is already
    /// resolved, so implementations never need to follow symlinks.
    fn lookup(&self, path: &CanonicalPath) -> Option<BaseNode>;
}

/// A base rootfs extracted on local storage.
#[derive(Debug, Clone)]
pub struct FsBaseTree {
    root: PathBuf,
}

impl FsBaseTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BaseTree for FsBaseTree {
    fn lookup(&self, path: &CanonicalPath) -> Option<BaseNode> {
        let full_path = self.root.join(path.to_path_buf());
        let metadata = std::fs::symlink_metadata(&full_path).ok()?;

        if metadata.file_type().is_symlink() {
            std::fs::read_link(&full_path).ok().map(BaseNode::Symlink)
        } else if metadata.is_dir() {
            Some(BaseNode::Directory)
        } else {
            Some(BaseNode::File)
        }
    }
}

/// Result of resolving a naive layer path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Real location of the path in the base tree
    pub canonical: CanonicalPath,
    /// The final component of the naive path is a symlink in the base tree
    pub aliased: bool,
}

/// Maps naive layer paths to their canonical location in a base tree.
///
/// Without a base tree every path is its own canonical path. Resolutions
/// are cached for the lifetime of the canonicalizer.
pub struct Canonicalizer<'a> {
    base: Option<&'a dyn BaseTree>,
    cache: HashMap<CanonicalPath, Resolution>,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(base: Option<&'a dyn BaseTree>) -> Self {
        Self {
            base,
            cache: HashMap::new(),
        }
    }

    /// Canonical path of `naive`.
    pub fn canonicalize(&mut self, naive: &CanonicalPath) -> Result<CanonicalPath> {
        Ok(self.resolve(naive)?.canonical)
    }

    /// Resolve `naive`, reporting whether its last component is itself a
    /// base tree symlink.
    pub fn resolve(&mut self, naive: &CanonicalPath) -> Result<Resolution> {
        let Some(base) = self.base else {
            return Ok(Resolution {
                canonical: naive.clone(),
                aliased: false,
            });
        };

        if let Some(hit) = self.cache.get(naive) {
            return Ok(hit.clone());
        }

        let components: Vec<Component<'_>> = naive
            .components()
            .iter()
            .map(|name| Component::Normal(name.as_os_str()))
            .collect();
        let mut hops = 0;
        let resolution =
            resolve_components(base, CanonicalPath::root(), &components, &mut hops, naive)?;

        if resolution.canonical != *naive {
            tracing::debug!(
                path = %naive,
                canonical = %resolution.canonical,
                "Remapped path through base layer symlink"
            );
        }

        self.cache.insert(naive.clone(), resolution.clone());
        Ok(resolution)
    }
}

/// Walk `components` from the already resolved `start`.
///
/// `..` pops the resolved path (never above the root), so it applies to the
/// real location of the preceding component rather than its spelling.
fn resolve_components(
    base: &dyn BaseTree,
    start: CanonicalPath,
    components: &[Component<'_>],
    hops: &mut usize,
    original: &CanonicalPath,
) -> Result<Resolution> {
    let mut resolved = start;
    let mut aliased = false;

    for (i, component) in components.iter().enumerate() {
        let name = match component {
            Component::Normal(name) => *name,
            Component::ParentDir => {
                resolved = resolved.parent().unwrap_or_default();
                aliased = false;
                continue;
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => continue,
        };
        let candidate = resolved.join(name);

        match base.lookup(&candidate) {
            None => {
                // Absent from the base: nothing below it can be remapped.
                let rest: PathBuf = components[i + 1..].iter().collect();
                return Ok(Resolution {
                    canonical: candidate.join_relative(&rest),
                    aliased: false,
                });
            }
            Some(BaseNode::Symlink(target)) => {
                *hops += 1;
                if *hops > MAX_SYMLINK_HOPS {
                    return Err(LayerkitError::LayerArchivingError(format!(
                        "Too many levels of symbolic links resolving '{}' in base layer",
                        original
                    )));
                }

                // Absolute targets are relative to the base root, not the host.
                let target_start = if target.is_absolute() {
                    CanonicalPath::root()
                } else {
                    resolved
                };
                let target_components: Vec<Component<'_>> = target.components().collect();

                let inner =
                    resolve_components(base, target_start, &target_components, hops, original)?;
                resolved = inner.canonical;
                aliased = true;
            }
            Some(BaseNode::Directory) | Some(BaseNode::File) => {
                resolved = candidate;
                aliased = false;
            }
        }
    }

    Ok(Resolution {
        canonical: resolved,
        aliased,
    })
}
