//! `layerkit pull` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;
use layerkit_oci::Image;

#[derive(Args)]
pub struct PullArgs {
    /// Image name and tag (e.g., "ubuntu:22.04")
    pub image: String,

    /// Directory to store the image layout in
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Target architecture
    #[arg(long, default_value = "amd64")]
    pub arch: String,

    /// Target architecture variant (e.g., "v8")
    #[arg(long)]
    pub variant: Option<String>,

    /// Registry to pull from (overrides the configured registry)
    #[arg(long)]
    pub registry: Option<String>,
}

pub fn execute(args: PullArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = args.registry.as_deref().unwrap_or(&config.registry_url);

    println!("Pulling {}...", args.image);
    let (image, source) = Image::from_registry(
        &args.image,
        &args.dir,
        registry,
        &args.arch,
        args.variant.as_deref(),
        super::toolchain(config),
    )?;

    println!(
        "Pulled: {} ({}/{})",
        source,
        image.path().display(),
        image.image_name()
    );
    Ok(())
}
