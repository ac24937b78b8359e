//! layerkit CLI - build OCI image layers on top of symlinked base images.

pub mod commands;
pub mod output;
