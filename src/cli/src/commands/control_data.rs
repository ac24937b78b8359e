//! `layerkit control-data` command.

use std::collections::BTreeMap;

use clap::Args;
use layerkit_core::LayerkitConfig;
use serde_yaml::Value;

use super::ImageArgs;
use crate::output::parse_key_value;

const CREATED_KEY: &str = "created";

#[derive(Args)]
pub struct ControlDataArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Metadata entry (KEY=VALUE, repeatable; VALUE is read as YAML)
    #[arg(long = "set", value_parser = parse_key_value)]
    pub entries: Vec<(String, String)>,

    /// Do not add a creation timestamp
    #[arg(long)]
    pub no_created: bool,
}

pub fn execute(
    args: ControlDataArgs,
    config: &LayerkitConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let created = (!args.no_created).then(chrono::Utc::now);
    let metadata = build_metadata(&args.entries, created)?;

    let image = args.image.open(config);
    image.set_control_data(&metadata)?;

    println!(
        "Added control data to {} ({} keys)",
        image.image_name(),
        metadata.len()
    );
    Ok(())
}

/// Metadata map from `KEY=VALUE` pairs, with an optional `created` timestamp
/// unless one is given explicitly.
fn build_metadata(
    entries: &[(String, String)],
    created: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<BTreeMap<String, Value>, serde_yaml::Error> {
    let mut metadata = BTreeMap::new();

    for (key, raw) in entries {
        let value = if raw.is_empty() {
            Value::String(String::new())
        } else {
            serde_yaml::from_str(raw)?
        };
        metadata.insert(key.clone(), value);
    }

    if let Some(created) = created {
        metadata
            .entry(CREATED_KEY.to_string())
            .or_insert_with(|| Value::String(created.to_rfc3339()));
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_metadata_parses_yaml_values() {
        let metadata =
            build_metadata(&pairs(&[("name", "rock-name"), ("version", "1")]), None).unwrap();

        assert_eq!(metadata["name"], Value::from("rock-name"));
        assert_eq!(metadata["version"], Value::from(1));
        assert!(!metadata.contains_key(CREATED_KEY));
    }

    #[test]
    fn test_build_metadata_adds_created() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let metadata = build_metadata(&pairs(&[("name", "x")]), Some(now)).unwrap();

        assert_eq!(
            metadata[CREATED_KEY],
            Value::from("2024-06-01T12:00:00+00:00")
        );
    }

    #[test]
    fn test_build_metadata_keeps_explicit_created() {
        let now = chrono::Utc::now();
        let metadata = build_metadata(&pairs(&[("created", "yesterday")]), Some(now)).unwrap();
        assert_eq!(metadata[CREATED_KEY], Value::from("yesterday"));
    }

    #[test]
    fn test_build_metadata_empty_value() {
        let metadata = build_metadata(&pairs(&[("summary", "")]), None).unwrap();
        assert_eq!(metadata["summary"], Value::from(""));
    }

    #[test]
    fn test_build_metadata_serializes_sorted() {
        let metadata =
            build_metadata(&pairs(&[("version", "1"), ("name", "rock-name")]), None).unwrap();
        assert_eq!(
            serde_yaml::to_string(&metadata).unwrap(),
            "name: rock-name\nversion: 1\n"
        );
    }
}
