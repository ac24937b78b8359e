//! OCI images on disk and the operations that build them.
//!
//! An [`Image`] is a named reference (`name:tag`) inside an OCI layout
//! directory. Copying, unpacking and configuration go through the external
//! toolchain; layer trees and variant rewriting are done in-process.

pub mod layout;
pub mod toolchain;
pub mod variant;

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use layerkit_core::error::{LayerkitError, Result};

use crate::layer::{archive_layer, TreeEntry};

pub use layout::{BlobRef, OciLayout};
pub use toolchain::{CommandRunner, ProcessRunner, Toolchain};
pub use variant::inject_variant;

/// Default name of the directory holding image control data.
pub const DEFAULT_CONTROL_DATA_DIR: &str = ".rock";

const TEMP_LAYER_PREFIX: &str = ".temp_layer.";
const TEMP_CONTROL_DATA_PREFIX: &str = ".temp_layer.control_data.";

/// A named image inside an OCI layout directory.
#[derive(Debug, Clone)]
pub struct Image {
    image_name: String,
    path: PathBuf,
    toolchain: Toolchain,
    control_data_dir: String,
}

impl Image {
    pub fn new(
        image_name: impl Into<String>,
        path: impl Into<PathBuf>,
        toolchain: Toolchain,
    ) -> Self {
        Self {
            image_name: image_name.into(),
            path: path.into(),
            toolchain,
            control_data_dir: DEFAULT_CONTROL_DATA_DIR.to_string(),
        }
    }

    /// Use `dir` instead of `.rock` for control data.
    pub fn with_control_data_dir(mut self, dir: impl Into<String>) -> Self {
        self.control_data_dir = dir.into();
        self
    }

    /// Pull `name` from `registry` into `image_dir`.
    ///
    /// Returns the image and the source reference it was copied from.
    pub fn from_registry(
        name: &str,
        image_dir: &Path,
        registry: &str,
        arch: &str,
        variant: Option<&str>,
        toolchain: Toolchain,
    ) -> Result<(Self, String)> {
        std::fs::create_dir_all(image_dir)?;

        let source = format!("docker://{}/{}", registry, name);
        let mut args = vec![
            "--insecure-policy".to_string(),
            "--override-arch".to_string(),
            arch.to_string(),
        ];
        if let Some(variant) = variant {
            args.push("--override-variant".to_string());
            args.push(variant.to_string());
        }
        args.push("copy".to_string());
        args.push(source.clone());
        args.push(format!("oci:{}/{}", image_dir.display(), name));
        toolchain.skopeo(args)?;

        tracing::info!(image = name, source = %source, "Pulled image");
        Ok((Self::new(name, image_dir, toolchain), source))
    }

    /// Create an empty image for `arch` (and optional `variant`).
    ///
    /// Returns the image and its `oci:` source reference.
    pub fn new_oci_image(
        name: &str,
        image_dir: &Path,
        arch: &str,
        variant: Option<&str>,
        toolchain: Toolchain,
    ) -> Result<(Self, String)> {
        std::fs::create_dir_all(image_dir)?;

        let base = base_name(name);
        let layout = format!("{}/{}", image_dir.display(), base);
        let reference = format!("{}/{}", image_dir.display(), name);

        toolchain.umoci(["init", "--layout", layout.as_str()])?;
        toolchain.umoci(["new", "--image", reference.as_str()])?;
        toolchain.umoci([
            "config",
            "--image",
            reference.as_str(),
            "--architecture",
            arch,
            "--no-history",
        ])?;

        if let Some(variant) = variant {
            inject_variant(&image_dir.join(base), variant)?;
        }

        Ok((Self::new(name, image_dir, toolchain), format!("oci:{}", reference)))
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory of the OCI layout holding this image.
    pub fn layout_dir(&self) -> PathBuf {
        self.path.join(base_name(&self.image_name))
    }

    /// `<path>/<name:tag>` as understood by the toolchain.
    fn reference(&self) -> String {
        format!("{}/{}", self.path.display(), self.image_name)
    }

    /// Copy this image to `image_name` in `image_dir`.
    pub fn copy_to(&self, image_name: &str, image_dir: &Path) -> Result<Self> {
        self.toolchain.skopeo([
            "--insecure-policy".to_string(),
            "copy".to_string(),
            format!("oci:{}", self.reference()),
            format!("oci:{}/{}", image_dir.display(), image_name),
        ])?;

        Ok(Self {
            image_name: image_name.to_string(),
            path: image_dir.to_path_buf(),
            toolchain: self.toolchain.clone(),
            control_data_dir: self.control_data_dir.clone(),
        })
    }

    /// Unpack into a bundle under `bundle_dir`, replacing a previous one.
    ///
    /// Returns the bundle's rootfs directory.
    pub fn extract_to(&self, bundle_dir: &Path, rootless: bool) -> Result<PathBuf> {
        std::fs::create_dir_all(bundle_dir)?;

        let bundle_path = bundle_dir.join(self.image_name.replace(':', "-"));
        if bundle_path.exists() {
            tracing::debug!(bundle = %bundle_path.display(), "Removing previous bundle");
            std::fs::remove_dir_all(&bundle_path)?;
        }

        let mut args = vec!["unpack".to_string()];
        if rootless {
            args.push("--rootless".to_string());
        }
        args.push("--image".to_string());
        args.push(self.reference());
        args.push(bundle_path.display().to_string());
        self.toolchain.umoci(args)?;

        Ok(bundle_path.join("rootfs"))
    }

    /// Archive `layer_dir` as a new top layer, optionally tagging the result.
    ///
    /// With `base_layer_dir`, paths are canonicalized against the symlinks
    /// of that extracted rootfs so the layer never shadows them.
    pub fn add_layer(
        &self,
        tag: Option<&str>,
        layer_dir: &Path,
        base_layer_dir: Option<&Path>,
    ) -> Result<Vec<TreeEntry>> {
        self.add_layer_with_prefix(TEMP_LAYER_PREFIX, tag, layer_dir, base_layer_dir)
    }

    fn add_layer_with_prefix(
        &self,
        prefix: &str,
        tag: Option<&str>,
        layer_dir: &Path,
        base_layer_dir: Option<&Path>,
    ) -> Result<Vec<TreeEntry>> {
        let temp_tar = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".tar")
            .tempfile_in(&self.path)
            .map_err(|e| {
                LayerkitError::LayerArchivingError(format!(
                    "Failed to create temporary layer in {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let entries = {
            let mut writer = BufWriter::new(temp_tar.as_file());
            let entries = archive_layer(layer_dir, base_layer_dir, &mut writer)?;
            writer.flush()?;
            entries
        };

        let mut args = vec![
            "raw".to_string(),
            "add-layer".to_string(),
            "--image".to_string(),
            self.reference(),
            temp_tar.path().display().to_string(),
        ];
        if let Some(tag) = tag {
            args.push("--tag".to_string());
            args.push(tag.to_string());
        }
        let created_by = std::iter::once(self.toolchain.umoci_program().to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        args.push("--history.created_by".to_string());
        args.push(created_by);
        self.toolchain.umoci(args)?;

        tracing::info!(
            image = %self.image_name,
            layer = %layer_dir.display(),
            entries = entries.len(),
            "Added layer"
        );
        Ok(entries)
    }

    /// Copy `<base>:<tag>` into the local docker daemon.
    pub fn to_docker_daemon(&self, tag: &str) -> Result<()> {
        let base = base_name(&self.image_name);
        self.toolchain.skopeo([
            "--insecure-policy".to_string(),
            "copy".to_string(),
            format!("oci:{}/{}:{}", self.path.display(), base, tag),
            format!("docker-daemon:{}:{}", base, tag),
        ])?;
        Ok(())
    }

    /// Export `<base>:<tag>` as an OCI archive file.
    pub fn to_oci_archive(&self, tag: &str, filename: &str) -> Result<()> {
        let base = base_name(&self.image_name);
        self.toolchain.skopeo([
            "--insecure-policy".to_string(),
            "copy".to_string(),
            format!("oci:{}/{}:{}", self.path.display(), base, tag),
            format!("oci-archive:{}:{}", filename, tag),
        ])?;
        Ok(())
    }

    /// Raw manifest digest of `source_image`.
    pub fn digest(&self, source_image: &str) -> Result<Vec<u8>> {
        let output = self.toolchain.skopeo([
            "inspect",
            "--format",
            "{{.Digest}}",
            "-n",
            source_image,
        ])?;

        let trimmed = output.trim();
        let hash = trimmed.strip_prefix("sha256:").unwrap_or(trimmed);
        hex::decode(hash).map_err(|e| {
            LayerkitError::ImageFormatError(format!(
                "Invalid digest '{}' for {}: {}",
                trimmed, source_image, e
            ))
        })
    }

    pub fn set_entrypoint(&self, entrypoint: &[String]) -> Result<()> {
        self.set_list("config.entrypoint", "--config.entrypoint", entrypoint)
    }

    pub fn set_cmd(&self, cmd: &[String]) -> Result<()> {
        self.set_list("config.cmd", "--config.cmd", cmd)
    }

    /// Replace the environment with `env` (in order).
    pub fn set_env(&self, env: &[(String, String)]) -> Result<()> {
        let pairs: Vec<String> = env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.set_list("config.env", "--config.env", &pairs)
    }

    /// Replace config labels and manifest annotations with `annotations`,
    /// passed to the toolchain in the given order.
    pub fn set_annotations(&self, annotations: &[(String, String)]) -> Result<()> {
        let pairs: Vec<String> = annotations
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        self.set_list("config.labels", "--config.label", &pairs)?;
        self.set_list("manifest.annotations", "--manifest.annotation", &pairs)
    }

    fn set_list(&self, field: &str, flag: &str, values: &[String]) -> Result<()> {
        let mut args = vec![
            "config".to_string(),
            "--image".to_string(),
            self.reference(),
            format!("--clear={}", field),
        ];
        for value in values {
            args.push(flag.to_string());
            args.push(value.clone());
        }
        self.toolchain.umoci(args)?;
        Ok(())
    }

    /// Add `<control dir>/metadata.yaml` holding `metadata` as an untagged layer.
    pub fn set_control_data(&self, metadata: &BTreeMap<String, serde_yaml::Value>) -> Result<()> {
        let workspace = tempfile::tempdir()?;
        let control_dir = workspace.path().join(&self.control_data_dir);
        std::fs::create_dir_all(&control_dir)?;

        let yaml = serde_yaml::to_string(metadata)?;
        std::fs::write(control_dir.join("metadata.yaml"), yaml)?;

        tracing::debug!(
            image = %self.image_name,
            dir = %self.control_data_dir,
            keys = metadata.len(),
            "Writing control data"
        );
        self.add_layer_with_prefix(TEMP_CONTROL_DATA_PREFIX, None, workspace.path(), None)?;
        Ok(())
    }

    /// Toolchain view of the image (`umoci stat --json`).
    pub fn stat(&self) -> Result<serde_json::Value> {
        let output = self
            .toolchain
            .umoci(["stat", "--json", "--image", self.reference().as_str()])?;
        Ok(serde_json::from_str(&output)?)
    }
}

/// Image name without its tag.
fn base_name(image_name: &str) -> &str {
    image_name.split(':').next().unwrap_or(image_name)
}
