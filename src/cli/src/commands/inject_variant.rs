//! `layerkit inject-variant` command.

use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct InjectVariantArgs {
    /// Path to the OCI image layout
    pub layout: PathBuf,

    /// Architecture variant to set (e.g., "v8")
    pub variant: String,
}

pub fn execute(args: InjectVariantArgs) -> Result<(), Box<dyn std::error::Error>> {
    layerkit_oci::inject_variant(&args.layout, &args.variant)?;

    let layout = layerkit_oci::OciLayout::open(&args.layout)?;
    println!("{}", layout.manifest_digest());
    Ok(())
}
