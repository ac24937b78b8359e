//! `layerkit plan` command: show the resolved layer tree.

use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use layerkit_oci::layer::{build_tree, BaseTree, FsBaseTree, FsSourceTree, TreeEntry};

use crate::output::{format_ago, format_mode, new_table};

#[derive(Args)]
pub struct PlanArgs {
    /// Directory whose contents would become the layer
    pub layer_dir: PathBuf,

    /// Extracted base rootfs whose symlinks the layer must respect
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = FsSourceTree::new(&args.layer_dir);
    let base = args.base.as_ref().map(FsBaseTree::new);
    let entries = build_tree(&source, base.as_ref().map(|b| b as &dyn BaseTree))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&entries))?);
    } else {
        println!("{}", render_table(&entries, chrono::Utc::now()));
    }
    Ok(())
}

fn render_table(entries: &[TreeEntry], now: chrono::DateTime<chrono::Utc>) -> Table {
    let mut table = new_table(&["PATH", "TYPE", "MODE", "OWNER", "MODIFIED", "SOURCE"]);
    for entry in entries {
        table.add_row(vec![
            entry.canonical_path.to_string(),
            entry.kind.to_string(),
            format_mode(entry.metadata.mode),
            format!("{}:{}", entry.metadata.uid, entry.metadata.gid),
            format_ago(entry.metadata.mtime, now),
            entry.source_path.display().to_string(),
        ]);
    }
    table
}

fn to_json(entries: &[TreeEntry]) -> serde_json::Value {
    entries
        .iter()
        .map(|entry| {
            serde_json::json!({
                "path": entry.canonical_path.to_string(),
                "type": entry.kind.to_string(),
                "mode": format!("{:o}", entry.metadata.mode),
                "uid": entry.metadata.uid,
                "gid": entry.metadata.gid,
                "mtime": entry.metadata.mtime,
                "source": entry.source_path.display().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use layerkit_oci::layer::{CanonicalPath, EntryKind, EntryMetadata};

    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry {
                canonical_path: CanonicalPath::from("usr/bin"),
                source_path: PathBuf::from("/layer/bin"),
                kind: EntryKind::Directory,
                metadata: EntryMetadata {
                    mode: 0o755,
                    uid: 0,
                    gid: 0,
                    mtime: 1_717_243_200 - 120,
                },
            },
            TreeEntry {
                canonical_path: CanonicalPath::from("usr/bin/tool"),
                source_path: PathBuf::from("/layer/bin/tool"),
                kind: EntryKind::Regular,
                metadata: EntryMetadata {
                    mode: 0o644,
                    uid: 1000,
                    gid: 100,
                    mtime: 1_717_243_200 - 120,
                },
            },
        ]
    }

    #[test]
    fn test_render_table() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let rendered = render_table(&entries(), now).to_string();

        assert!(rendered.contains("usr/bin/tool"));
        assert!(rendered.contains("/layer/bin/tool"));
        assert!(rendered.contains("rw-r--r--"));
        assert!(rendered.contains("1000:100"));
        assert!(rendered.contains("2 minutes ago"));
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&entries());

        assert_eq!(json[0]["path"], "usr/bin");
        assert_eq!(json[0]["source"], "/layer/bin");
        assert_eq!(json[0]["mode"], "755");
        assert_eq!(json[1]["uid"], 1000);
    }
}
