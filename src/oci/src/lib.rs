//! layerkit OCI - Layer building and image manipulation.
//!
//! This crate turns a directory into an OCI layer on top of an extracted
//! base image, resolving paths through the base's symlinks so the layer
//! never shadows them, and drives the external image toolchain for the
//! rest of the image lifecycle.

pub mod image;
pub mod layer;

// Re-export common types
pub use image::{inject_variant, CommandRunner, Image, OciLayout, ProcessRunner, Toolchain};
pub use layer::{archive_layer, build_tree, CanonicalPath, EntryKind, TreeEntry};

/// layerkit OCI version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
