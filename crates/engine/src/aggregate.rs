//! Multi-node merging: several per-node Bundles become one Bundle whose
//! series are re-keyed `<node> | <key>`. Canonical timestamps sort
//! chronologically as plain strings, so the merged axis is the sorted
//! union; slots a node never sampled stay at the missing-marker.

use std::collections::BTreeSet;
use std::path::Path;

use crate::bundle::{Bundle, SeriesBuilder};

/// Node identifier from the `nodes/<node id>/logs/<file>` layout
/// diagnostic tarballs use. Falls back to the file stem when the path
/// does not follow the convention.
pub fn node_id(path: &Path) -> Option<String> {
    let mut components = path.components();
    while let Some(part) = components.next() {
        if part.as_os_str() == "nodes" {
            return components
                .next()
                .map(|c| c.as_os_str().to_string_lossy().into_owned());
        }
    }
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Merge per-node bundles onto one shared timestamp axis. Sentinel-only
/// bundles (nodes whose parse extracted nothing) contribute neither series
/// nor timestamps; their synthetic stamp would only add an all-NaN slot.
pub fn merge(bundles: &[(String, Bundle)]) -> Bundle {
    let stamps: BTreeSet<&str> = bundles
        .iter()
        .filter(|(_, b)| !b.is_sentinel())
        .flat_map(|(_, b)| b.timestamps.iter().map(String::as_str))
        .collect();

    let mut builder = SeriesBuilder::new("1970-01-01T00:00:00".to_string());
    for stamp in &stamps {
        builder.touch((*stamp).to_string());
    }

    for (node, bundle) in bundles {
        if bundle.is_sentinel() {
            continue;
        }
        for (key, series) in &bundle.series {
            let merged_key = format!("{} | {}", node, key);
            builder.register(&merged_key);
            for (i, value) in series.iter().enumerate() {
                if value.is_nan() {
                    continue;
                }
                let index = builder.touch(bundle.timestamps[i].clone());
                builder.set(&merged_key, index, *value);
            }
        }
        let meta = &bundle.metadata;
        for pool in &meta.pools {
            builder.note_pool(&format!("{} | {}", node, pool));
        }
        for table in &meta.tables {
            builder.note_table(&format!("{} | {}", node, table));
        }
        for device in &meta.devices {
            builder.note_device(&format!("{} | {}", node, device));
        }
        for process in &meta.processes {
            builder.note_process(&format!("{} | {}", node, process));
        }
        builder.skip_rows(meta.rows_skipped);
        builder.note_synthesized(meta.synthesized_timestamps);
    }

    builder.finish()
}
