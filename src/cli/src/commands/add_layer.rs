//! `layerkit add-layer` command.

use std::path::PathBuf;

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;

#[derive(Args)]
pub struct AddLayerArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Directory whose contents become the layer
    pub layer_dir: PathBuf,

    /// Extracted base rootfs whose symlinks the layer must respect
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Tag to give the resulting image
    #[arg(long)]
    pub tag: Option<String>,

    /// Only print the image reference
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn execute(
    args: AddLayerArgs,
    config: &LayerkitConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = args.image.open(config);
    let entries = image.add_layer(args.tag.as_deref(), &args.layer_dir, args.base.as_deref())?;

    let reference = match &args.tag {
        Some(tag) => format!("{}:{}", image.image_name().split(':').next().unwrap_or_default(), tag),
        None => image.image_name().to_string(),
    };

    if args.quiet {
        println!("{reference}");
    } else {
        println!(
            "Added layer from {} to {} ({} entries)",
            args.layer_dir.display(),
            reference,
            entries.len()
        );
    }
    Ok(())
}
