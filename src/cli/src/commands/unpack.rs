//! `layerkit unpack` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;

#[derive(Args)]
pub struct UnpackArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Directory to create the bundle in
    pub bundle_dir: PathBuf,

    /// Unpack without requiring root privileges
    #[arg(long)]
    pub rootless: bool,
}

pub fn execute(args: UnpackArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rootfs = args
        .image
        .open(config)
        .extract_to(&args.bundle_dir, args.rootless)?;

    println!("{}", rootfs.display());
    Ok(())
}
