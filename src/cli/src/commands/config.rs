//! `layerkit config` command.

use clap::Args;
use layerkit_core::LayerkitConfig;

use super::ImageArgs;
use crate::output::parse_key_value;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Replace the entrypoint
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub entrypoint: Option<Vec<String>>,

    /// Replace the default command
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub cmd: Option<Vec<String>>,

    /// Environment variable (KEY=VALUE, repeatable; replaces the environment)
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Label and manifest annotation (KEY=VALUE, repeatable; replaces existing)
    #[arg(long, value_parser = parse_key_value)]
    pub annotation: Vec<(String, String)>,
}

pub fn execute(args: ConfigArgs, config: &LayerkitConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.entrypoint.is_none()
        && args.cmd.is_none()
        && args.env.is_empty()
        && args.annotation.is_empty()
    {
        return Err("Nothing to configure: pass --entrypoint, --cmd, --env or --annotation".into());
    }

    let image = args.image.open(config);

    if let Some(entrypoint) = &args.entrypoint {
        image.set_entrypoint(entrypoint)?;
    }
    if let Some(cmd) = &args.cmd {
        image.set_cmd(cmd)?;
    }
    if !args.env.is_empty() {
        image.set_env(&args.env)?;
    }
    if !args.annotation.is_empty() {
        image.set_annotations(&args.annotation)?;
    }

    println!("Configured {}", image.image_name());
    Ok(())
}
