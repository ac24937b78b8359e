//! `layerkit export` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;

#[derive(Args)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["docker", "archive"])))]
pub struct ExportArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Tag to export
    pub tag: String,

    /// Copy into the local docker daemon
    #[arg(long)]
    pub docker: bool,

    /// Write an OCI archive file
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

pub fn execute(args: ExportArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let image = args.image.open(config);

    match &args.archive {
        Some(archive) => {
            image.to_oci_archive(&args.tag, &archive.display().to_string())?;
            println!("Exported {} to {}", args.tag, archive.display());
        }
        None => {
            image.to_docker_daemon(&args.tag)?;
            println!("Exported {} to docker daemon", args.tag);
        }
    }
    Ok(())
}
