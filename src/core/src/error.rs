use thiserror::Error;

/// layerkit error types
#[derive(Error, Debug)]
pub enum LayerkitError {
    /// Two source paths resolve to the same layer path with incompatible
    /// kinds or metadata, or a base layer symlink cannot be resolved.
    #[error("{0}")]
    LayerArchivingError(String),

    /// Index, manifest or config of an OCI image is missing or malformed
    #[error("Image format error: {0}")]
    ImageFormatError(String),

    /// An external image tool exited with a failure status
    #[error("Failed to run {command}: {output}")]
    ToolchainError { command: String, output: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for LayerkitError {
    fn from(err: serde_json::Error) -> Self {
        LayerkitError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for LayerkitError {
    fn from(err: serde_yaml::Error) -> Self {
        LayerkitError::SerializationError(err.to_string())
    }
}

/// Result type alias for layerkit operations
pub type Result<T> = std::result::Result<T, LayerkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_archiving_error_display() {
        let error = LayerkitError::LayerArchivingError(
            "Conflicting paths pointing to 'usr/bin': /a/bin, /a/usr/bin".to_string(),
        );
        assert_eq!(
            error.to_string(),
            "Conflicting paths pointing to 'usr/bin': /a/bin, /a/usr/bin"
        );
    }

    #[test]
    fn test_image_format_error_display() {
        let error = LayerkitError::ImageFormatError("missing config descriptor".to_string());
        assert_eq!(
            error.to_string(),
            "Image format error: missing config descriptor"
        );
    }

    #[test]
    fn test_toolchain_error_display() {
        let error = LayerkitError::ToolchainError {
            command: "umoci stat --json --image img:latest".to_string(),
            output: "image not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to run umoci stat --json --image img:latest: image not found"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: LayerkitError = io_error.into();
        assert!(matches!(error, LayerkitError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_config_error_display() {
        let error = LayerkitError::ConfigError("Missing required field".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field"
        );
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ invalid");
        let error: LayerkitError = result.unwrap_err().into();
        assert!(matches!(error, LayerkitError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: LayerkitError = result.unwrap_err().into();
        assert!(matches!(error, LayerkitError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = LayerkitError::Other("Unknown error occurred".to_string());
        assert_eq!(error.to_string(), "Unknown error occurred");
    }
}
