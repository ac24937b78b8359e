//! `layerkit stat` command.

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;

#[derive(Args)]
pub struct StatArgs {
    #[command(flatten)]
    pub image: ImageArgs,
}

pub fn execute(args: StatArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stat = args.image.open(config).stat()?;
    println!("{}", serde_json::to_string_pretty(&stat)?);
    Ok(())
}
