//! Per-table storage/latency percentiles. Blocks are delimited by a
//! `<keyspace>/<table> histograms` banner; inside, the same seven
//! percentile rows cross five operation columns. Keys are
//! `<table> | <operation> | <row>`, written at the current timestamp
//! index.

use crate::bundle::SeriesBuilder;
use crate::columns::{parse_value, OffsetColumnResolver};
use crate::model::Family;
use crate::scanner::{block_end, Cursor};
use crate::timestamp::Clock;

const FAMILY: Family = Family::TableHistogram;

const OPERATIONS: &[&str] = &[
    "SSTables",
    "Write Latency",
    "Read Latency",
    "Partition Size",
    "Cell Count",
];

const ROW_LABELS: &[&str] = &["50%", "75%", "95%", "98%", "99%", "Min", "Max"];

pub(crate) fn extract(
    table: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    // Find the column header inside the block.
    while cur.peek().map(|l| l.trim().is_empty()).unwrap_or(false) {
        cur.bump();
    }
    let header = match cur.peek() {
        Some(line) if line.trim_start().starts_with("Percentile") => line,
        _ => {
            tracing::warn!("Table histogram block for {:?} has no header", table);
            return;
        }
    };
    let mut expected = vec!["Percentile"];
    expected.extend_from_slice(OPERATIONS);
    let resolver = OffsetColumnResolver::locate(header, &expected);
    cur.bump();

    // Units line under the header.
    if cur.peek().map(|l| l.trim_start().starts_with('(')).unwrap_or(false) {
        cur.bump();
    }

    builder.note_table(table);
    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        let cells = resolver.cells(line);
        let label = cells.first().copied().flatten().unwrap_or("");
        if ROW_LABELS.contains(&label) {
            let labels = resolver.labels();
            for (i, cell) in cells.iter().enumerate().skip(1) {
                if let Some(value) = cell.and_then(parse_value) {
                    builder.set(
                        &format!("{} | {} | {}", table, labels[i], label),
                        index,
                        value,
                    );
                }
            }
        } else {
            tracing::warn!("Skipping unrecognized histogram row: {:?}", line);
            builder.skip_row();
        }
        cur.bump();
    }
}
