//! Architecture variant injection.
//!
//! The variant lives in the image config, which is content-addressed, so
//! changing it cascades: new config digest → manifest rewrite → new
//! manifest digest → index rewrite. Superseded blobs are left in place.

use std::path::Path;

use layerkit_core::error::{LayerkitError, Result};
use serde_json::{Map, Value};

use super::layout::{blob_path, write_atomic, write_blob, BlobRef, INDEX_FILE};

/// Set `variant` in the config of the image at `image_path`, updating the
/// manifest and index so every digest matches the bytes it references.
pub fn inject_variant(image_path: &Path, variant: &str) -> Result<()> {
    let index_path = image_path.join(INDEX_FILE);
    let mut index = read_json(&index_path, "index.json")?;

    let manifests = index
        .get("manifests")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LayerkitError::ImageFormatError("index.json has no manifests list".to_string())
        })?;
    if manifests.len() > 1 {
        tracing::warn!(
            image = %image_path.display(),
            manifests = manifests.len(),
            "Index lists several manifests, injecting variant into the first"
        );
    }
    let manifest_descriptor = manifests
        .first()
        .and_then(Value::as_object)
        .ok_or_else(|| {
            LayerkitError::ImageFormatError("No manifest descriptor in index.json".to_string())
        })?;
    let manifest_digest = descriptor_digest(manifest_descriptor, "index manifest")?;
    let mut manifest = read_json(&blob_path(image_path, &manifest_digest)?, "manifest")?;

    let config_descriptor = manifest
        .get("config")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            LayerkitError::ImageFormatError("Manifest has no config descriptor".to_string())
        })?;
    let config_digest = descriptor_digest(config_descriptor, "manifest config")?;
    let mut config = read_json(&blob_path(image_path, &config_digest)?, "config")?;

    config
        .as_object_mut()
        .ok_or_else(|| LayerkitError::ImageFormatError("Config is not a JSON object".to_string()))?
        .insert("variant".to_string(), Value::String(variant.to_string()));
    let new_config = write_blob(image_path, &serde_json::to_vec(&config)?)?;

    update_descriptor(manifest.get_mut("config"), &new_config);
    let new_manifest = write_blob(image_path, &serde_json::to_vec(&manifest)?)?;

    update_descriptor(
        index
            .get_mut("manifests")
            .and_then(|m| m.get_mut(0)),
        &new_manifest,
    );
    write_atomic(&index_path, &serde_json::to_vec(&index)?)?;

    tracing::info!(
        image = %image_path.display(),
        variant,
        config = %new_config.digest,
        manifest = %new_manifest.digest,
        "Injected architecture variant"
    );
    Ok(())
}

fn read_json(path: &Path, what: &str) -> Result<Value> {
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

fn descriptor_digest(descriptor: &Map<String, Value>, what: &str) -> Result<String> {
    descriptor
        .get("digest")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LayerkitError::ImageFormatError(format!("{} descriptor has no digest", what)))
}

fn update_descriptor(descriptor: Option<&mut Value>, blob: &BlobRef) {
    // Presence was checked while reading.
    if let Some(Value::Object(fields)) = descriptor {
        fields.insert("digest".to_string(), Value::String(blob.digest.clone()));
        fields.insert("size".to_string(), Value::from(blob.size));
    }
}
