//! `layerkit digest` command.

use clap::Args;
use layerkit_core::LayerkitConfig;
use layerkit_oci::Image;

#[derive(Args)]
pub struct DigestArgs {
    /// Image source in toolchain transport syntax (e.g., "docker://ubuntu:22.04")
    pub source: String,
}

pub fn execute(args: DigestArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    // The digest query does not touch a local layout.
    let image = Image::new(&args.source, ".", super::toolchain(config));
    let digest = image.digest(&args.source)?;

    println!("sha256:{}", hex::encode(digest));
    Ok(())
}
