//! layerkit Core - Foundational Types
//!
//! Error and configuration types shared by the layerkit crates.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{LayerkitConfig, LogLevel, ToolchainConfig};
pub use error::{LayerkitError, Result};

/// layerkit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
