//! CLI command definitions and dispatch.

mod add_layer;
mod config;
mod control_data;
mod copy;
mod digest;
mod export;
mod init;
mod inject_variant;
mod inspect;
mod plan;
mod pull;
mod stat;
mod unpack;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use layerkit_core::LayerkitConfig;
use layerkit_oci::{Image, ProcessRunner, Toolchain};

/// layerkit - build OCI image layers on top of symlinked base images.
#[derive(Parser)]
#[command(name = "layerkit", version, about)]
pub struct Cli {
    /// Configuration file (defaults to $LAYERKIT_CONFIG or ~/.layerkit/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Pull an image from the registry into an OCI layout
    Pull(pull::PullArgs),
    /// Create an empty image
    Init(init::InitArgs),
    /// Archive a directory and add it as a new layer
    AddLayer(add_layer::AddLayerArgs),
    /// Show the resolved layer tree without writing anything
    Plan(plan::PlanArgs),
    /// Set the architecture variant in an image layout
    InjectVariant(inject_variant::InjectVariantArgs),
    /// Set entrypoint, command, environment or annotations
    Config(config::ConfigArgs),
    /// Add a control data layer
    ControlData(control_data::ControlDataArgs),
    /// Unpack an image into a runtime bundle
    Unpack(unpack::UnpackArgs),
    /// Export an image to the docker daemon or an OCI archive
    Export(export::ExportArgs),
    /// Copy an image to another name or directory
    Copy(copy::CopyArgs),
    /// Print the manifest digest of an image source
    Digest(digest::DigestArgs),
    /// Print toolchain statistics for an image as JSON
    Stat(stat::StatArgs),
    /// Show the manifest and config of an image layout
    Inspect(inspect::InspectArgs),
}

/// An image reference inside a directory of OCI layouts.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image name and tag (e.g., "ubuntu:22.04")
    pub image: String,

    /// Directory holding the image layout
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

impl ImageArgs {
    pub(crate) fn open(&self, config: &LayerkitConfig) -> Image {
        Image::new(&self.image, &self.dir, toolchain(config))
            .with_control_data_dir(&config.control_data_dir)
    }
}

/// Toolchain running the configured programs.
pub(crate) fn toolchain(config: &LayerkitConfig) -> Toolchain {
    Toolchain::new(Arc::new(ProcessRunner), config.toolchain.clone())
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub fn dispatch(cli: Cli, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Pull(args) => pull::execute(args, config),
        Command::Init(args) => init::execute(args, config),
        Command::AddLayer(args) => add_layer::execute(args, config),
        Command::Plan(args) => plan::execute(args),
        Command::InjectVariant(args) => inject_variant::execute(args),
        Command::Config(args) => config::execute(args, config),
        Command::ControlData(args) => control_data::execute(args, config),
        Command::Unpack(args) => unpack::execute(args, config),
        Command::Export(args) => export::execute(args, config),
        Command::Copy(args) => copy::execute(args, config),
        Command::Digest(args) => digest::execute(args, config),
        Command::Stat(args) => stat::execute(args, config),
        Command::Inspect(args) => inspect::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "layerkit",
            "digest",
            "docker://ubuntu:22.04",
            "--verbose",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Digest(_)));
    }

    #[test]
    fn test_parse_add_layer() {
        let cli = Cli::try_parse_from([
            "layerkit",
            "add-layer",
            "ubuntu:22.04",
            "./layer",
            "--dir",
            "/images",
            "--base",
            "/bundle/rootfs",
            "--tag",
            "latest",
        ])
        .unwrap();

        match cli.command {
            Command::AddLayer(args) => {
                assert_eq!(args.image.image, "ubuntu:22.04");
                assert_eq!(args.image.dir, PathBuf::from("/images"));
                assert_eq!(args.base, Some(PathBuf::from("/bundle/rootfs")));
                assert_eq!(args.tag.as_deref(), Some("latest"));
            }
            _ => panic!("expected add-layer"),
        }
    }

    #[test]
    fn test_parse_config_pairs() {
        let cli = Cli::try_parse_from([
            "layerkit",
            "config",
            "app:1",
            "--env",
            "A=1",
            "--env",
            "B=2",
            "--annotation",
            "org.opencontainers.image.version=1",
        ])
        .unwrap();

        match cli.command {
            Command::Config(args) => {
                assert_eq!(
                    args.env,
                    vec![
                        ("A".to_string(), "1".to_string()),
                        ("B".to_string(), "2".to_string())
                    ]
                );
                assert_eq!(args.annotation.len(), 1);
                assert!(args.entrypoint.is_none());
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_parse_annotations_keep_order() {
        let cli = Cli::try_parse_from([
            "layerkit",
            "config",
            "app:1",
            "--annotation",
            "B=1",
            "--annotation",
            "A=2",
            "--annotation",
            "B=3",
        ])
        .unwrap();

        match cli.command {
            Command::Config(args) => assert_eq!(
                args.annotation,
                vec![
                    ("B".to_string(), "1".to_string()),
                    ("A".to_string(), "2".to_string()),
                    ("B".to_string(), "3".to_string())
                ]
            ),
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_export_requires_target() {
        assert!(Cli::try_parse_from(["layerkit", "export", "app:1", "latest"]).is_err());
        assert!(Cli::try_parse_from([
            "layerkit", "export", "app:1", "latest", "--docker", "--archive", "x.tar"
        ])
        .is_err());
    }

    #[test]
    fn test_dispatch_plan() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("etc")).unwrap();
        std::fs::write(tmp.path().join("etc/motd"), "hi").unwrap();

        let dir = tmp.path().display().to_string();
        let cli = Cli::try_parse_from(["layerkit", "plan", dir.as_str(), "--json"]).unwrap();
        dispatch(cli, &LayerkitConfig::default()).unwrap();
    }

    #[test]
    fn test_dispatch_inspect_rejects_non_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().display().to_string();

        let cli = Cli::try_parse_from(["layerkit", "inspect", dir.as_str()]).unwrap();
        let err = dispatch(cli, &LayerkitConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Not a valid OCI layout"));
    }

    #[test]
    fn test_image_args_default_dir() {
        let cli = Cli::try_parse_from(["layerkit", "stat", "app:1"]).unwrap();
        match cli.command {
            Command::Stat(args) => assert_eq!(args.image.dir, PathBuf::from(".")),
            _ => panic!("expected stat"),
        }
    }
}
