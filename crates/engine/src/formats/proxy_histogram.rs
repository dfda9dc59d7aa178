//! Client-request latency percentiles: fixed percentile rows crossed with
//! the coordinator operation columns. Operation headers contain embedded
//! spaces ("Read Latency"), so columns are resolved by offset, not tokens.
//! Values are already microseconds; no unit conversion happens at parse
//! time.

use crate::bundle::SeriesBuilder;
use crate::columns::{parse_value, OffsetColumnResolver};
use crate::model::Family;
use crate::scanner::{block_end, Cursor};
use crate::timestamp::Clock;

const FAMILY: Family = Family::ProxyHistogram;

const OPERATIONS: &[&str] = &[
    "Read Latency",
    "Write Latency",
    "Range Latency",
    "CAS Read Latency",
    "CAS Write Latency",
    "View Write Latency",
];

/// Percentile rows become a short key prefix; Min/Max keep their spelling.
fn row_prefix(label: &str) -> Option<&'static str> {
    match label {
        "50%" => Some("p50"),
        "75%" => Some("p75"),
        "95%" => Some("p95"),
        "98%" => Some("p98"),
        "99%" => Some("p99"),
        "Min" => Some("Min"),
        "Max" => Some("Max"),
        _ => None,
    }
}

pub(crate) fn extract(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    let mut expected = vec!["Percentile"];
    expected.extend_from_slice(OPERATIONS);
    let resolver = OffsetColumnResolver::locate(header, &expected);
    if resolver.is_empty() {
        return;
    }

    // Units line ("(micros)" per column) directly under the header.
    if cur.peek().map(|l| l.trim_start().starts_with('(')).unwrap_or(false) {
        cur.bump();
    }

    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        let cells = resolver.cells(line);
        let label = cells.first().copied().flatten().unwrap_or("");
        match row_prefix(label) {
            Some(prefix) => {
                let labels = resolver.labels();
                for (i, cell) in cells.iter().enumerate().skip(1) {
                    if let Some(value) = cell.and_then(parse_value) {
                        builder.set(&format!("{} {}", prefix, labels[i]), index, value);
                    }
                }
            }
            None => {
                tracing::warn!("Skipping unrecognized percentile row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}
