//! `layerkit copy` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;

#[derive(Args)]
pub struct CopyArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Name and tag of the copy
    pub target: String,

    /// Directory to place the copy in (defaults to the source directory)
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
}

pub fn execute(args: CopyArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let target_dir = args.target_dir.as_ref().unwrap_or(&args.image.dir);
    let copy = args.image.open(config).copy_to(&args.target, target_dir)?;

    println!("{}/{}", copy.path().display(), copy.image_name());
    Ok(())
}
