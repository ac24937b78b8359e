//! External image tools (`skopeo`, `umoci`) behind a runner seam.

use std::process::Command;
use std::sync::Arc;

use layerkit_core::error::{LayerkitError, Result};
use layerkit_core::ToolchainConfig;

/// Runs an external command and returns its standard output.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first). A non-zero exit is a `ToolchainError`.
    fn run(&self, argv: &[String]) -> Result<String>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<String> {
        let command = argv.join(" ");
        let (program, args) = argv.split_first().ok_or_else(|| {
            LayerkitError::Other("Cannot run an empty command line".to_string())
        })?;

        tracing::debug!(command = %command, "Running external command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| LayerkitError::ToolchainError {
                command: command.clone(),
                output: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LayerkitError::ToolchainError {
                command,
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

/// Command lines for the configured `skopeo` and `umoci` programs.
#[derive(Clone)]
pub struct Toolchain {
    runner: Arc<dyn CommandRunner>,
    config: ToolchainConfig,
}

impl Toolchain {
    pub fn new(runner: Arc<dyn CommandRunner>, config: ToolchainConfig) -> Self {
        Self { runner, config }
    }

    /// Toolchain running the default program names as real processes.
    pub fn system() -> Self {
        Self::new(Arc::new(ProcessRunner), ToolchainConfig::default())
    }

    /// Program invoked for `umoci` commands.
    pub fn umoci_program(&self) -> &str {
        &self.config.umoci
    }

    pub fn skopeo<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(&self.config.skopeo, args)
    }

    pub fn umoci<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(&self.config.umoci, args)
    }

    fn run<I, S>(&self, program: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = std::iter::once(program.to_string())
            .chain(args.into_iter().map(Into::into))
            .collect();
        self.runner.run(&argv)
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("skopeo", &self.config.skopeo)
            .field("umoci", &self.config.umoci)
            .finish()
    }
}
