//! `layerkit init` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;
use layerkit_oci::Image;

#[derive(Args)]
pub struct InitArgs {
    /// Image name and tag (e.g., "bare:latest")
    pub image: String,

    /// Directory to create the image layout in
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Target architecture
    #[arg(long, default_value = "amd64")]
    pub arch: String,

    /// Target architecture variant (e.g., "v8")
    #[arg(long)]
    pub variant: Option<String>,
}

pub fn execute(args: InitArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (_, source) = Image::new_oci_image(
        &args.image,
        &args.dir,
        &args.arch,
        args.variant.as_deref(),
        super::toolchain(config),
    )?;

    println!("{source}");
    Ok(())
}
