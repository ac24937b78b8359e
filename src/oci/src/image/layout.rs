//! OCI image layout access: blob addressing, digests and typed reads.
//!
//! ```text
//! image/
//! ├── oci-layout           (OCI layout marker)
//! ├── index.json           (Image index, fixed entry point)
//! └── blobs/
//!     └── sha256/
//!         ├── <manifest>   (Image manifest)
//!         ├── <config>     (Image configuration)
//!         └── <layers>     (Filesystem layers)
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use layerkit_core::error::{LayerkitError, Result};
use oci_spec::image::{ImageConfiguration, ImageIndex, ImageManifest};
use sha2::{Digest, Sha256};

pub const OCI_LAYOUT_FILE: &str = "oci-layout";
pub const INDEX_FILE: &str = "index.json";
pub const BLOBS_DIR: &str = "blobs";

/// Content descriptor: digest and byte length of a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    /// Digest with "sha256:" prefix
    pub digest: String,
    pub size: u64,
}

/// Compute SHA256 digest of raw bytes (hex, without prefix).
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Split and validate a `sha256:<hex>` digest, returning the hex part.
pub fn digest_hex(digest: &str) -> Result<&str> {
    let (algorithm, hash) = digest.split_once(':').ok_or_else(|| {
        LayerkitError::ImageFormatError(format!("Digest '{}' has no algorithm prefix", digest))
    })?;

    if algorithm != "sha256" {
        return Err(LayerkitError::ImageFormatError(format!(
            "Unsupported digest algorithm '{}' in '{}'",
            algorithm, digest
        )));
    }

    if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LayerkitError::ImageFormatError(format!(
            "Malformed sha256 digest '{}'",
            digest
        )));
    }

    Ok(hash)
}

/// Path of the blob addressed by `digest` inside an image layout.
pub fn blob_path(root: &Path, digest: &str) -> Result<PathBuf> {
    let hash = digest_hex(digest)?;
    Ok(root.join(BLOBS_DIR).join("sha256").join(hash))
}

/// Replace `path` with `data` via a temporary sibling and a rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        LayerkitError::Other(format!(
            "Failed to create temporary file in {}: {}",
            dir.display(),
            e
        ))
    })?;

    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| {
        LayerkitError::Other(format!("Failed to write {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

/// Store `data` under its content address and return its descriptor.
pub fn write_blob(root: &Path, data: &[u8]) -> Result<BlobRef> {
    let digest = format!("sha256:{}", sha256_bytes(data));
    let path = blob_path(root, &digest)?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    write_atomic(&path, data)?;

    tracing::debug!(digest = %digest, size = data.len(), "Wrote blob");
    Ok(BlobRef {
        digest,
        size: data.len() as u64,
    })
}

/// Typed, read-only view of an OCI image layout.
#[derive(Debug)]
pub struct OciLayout {
    root: PathBuf,
    manifest_digest: String,
    manifest: ImageManifest,
    config: ImageConfiguration,
}

impl OciLayout {
    /// Open the image whose manifest is the first entry of `index.json`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        Self::validate(&root)?;

        let index: ImageIndex = read_json_file(&root.join(INDEX_FILE), "index.json")?;
        let manifest_digest = index
            .manifests()
            .first()
            .ok_or_else(|| {
                LayerkitError::ImageFormatError("No manifests in index.json".to_string())
            })?
            .digest()
            .to_string();

        let manifest: ImageManifest =
            read_json_file(&blob_path(&root, &manifest_digest)?, "manifest")?;
        let config_digest = manifest.config().digest().to_string();
        let config: ImageConfiguration =
            read_json_file(&blob_path(&root, &config_digest)?, "config")?;

        Ok(Self {
            root,
            manifest_digest,
            manifest,
            config,
        })
    }

    fn validate(root: &Path) -> Result<()> {
        for required in [OCI_LAYOUT_FILE, INDEX_FILE, BLOBS_DIR] {
            if !root.join(required).exists() {
                return Err(LayerkitError::ImageFormatError(format!(
                    "Not a valid OCI layout: missing {} in {}",
                    required,
                    root.display()
                )));
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_digest(&self) -> &str {
        &self.manifest_digest
    }

    pub fn manifest(&self) -> &ImageManifest {
        &self.manifest
    }

    pub fn config(&self) -> &ImageConfiguration {
        &self.config
    }

    pub fn architecture(&self) -> String {
        self.config.architecture().to_string()
    }

    pub fn variant(&self) -> Option<&str> {
        self.config.variant().as_deref()
    }

    /// Layer digests, bottom to top.
    pub fn layer_digests(&self) -> Vec<String> {
        self.manifest
            .layers()
            .iter()
            .map(|l| l.digest().to_string())
            .collect()
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read(path).map_err(|e| {
        LayerkitError::ImageFormatError(format!(
            "Failed to read {} at {}: {}",
            what,
            path.display(),
            e
        ))
    })?;

    serde_json::from_slice(&content)
        .map_err(|e| LayerkitError::ImageFormatError(format!("Failed to parse {}: {}", what, e)))
}
