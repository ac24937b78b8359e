//! `layerkit inspect` command: typed view of an OCI image layout.

use std::path::PathBuf;

use clap::Args;
use layerkit_oci::OciLayout;

use crate::output::{format_bytes, new_table};

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the OCI image layout
    pub layout: PathBuf,

    /// Print the image configuration as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let layout = OciLayout::open(&args.layout)?;

    if args.json {
        let output = serde_json::json!({
            "Manifest": layout.manifest_digest(),
            "Config": layout.config(),
            "Layers": layout.layer_digests(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let config = layout.config();
    let mut summary = new_table(&["FIELD", "VALUE"]);
    summary.add_row(vec!["Manifest".to_string(), layout.manifest_digest().to_string()]);
    summary.add_row(vec!["OS".to_string(), config.os().to_string()]);
    summary.add_row(vec!["Architecture".to_string(), layout.architecture()]);
    summary.add_row(vec![
        "Variant".to_string(),
        layout.variant().unwrap_or("-").to_string(),
    ]);
    println!("{summary}");

    let mut layers = new_table(&["#", "DIGEST", "SIZE"]);
    for (i, layer) in layout.manifest().layers().iter().enumerate() {
        layers.add_row(vec![
            i.to_string(),
            layer.digest().to_string(),
            format_bytes(layer.size().max(0) as u64),
        ]);
    }
    println!();
    println!("{layers}");
    Ok(())
}
