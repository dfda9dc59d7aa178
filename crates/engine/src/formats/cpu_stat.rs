//! Per-CPU utilization rows. The header and every data row repeat the
//! interval timestamp, so rows are stripped of their stamp before token
//! resolution. Keys are `CPU <id> <column>`; the id is `all` or a core
//! number.

use crate::bundle::SeriesBuilder;
use crate::columns::TokenColumnResolver;
use crate::scanner::Cursor;
use crate::timestamp::{split_token, Clock};

pub(crate) fn extract_per_cpu(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    // Header arrives with the timestamp already stripped: "CPU %usr ..."
    let labels: Vec<String> = header
        .split_whitespace()
        .skip(1)
        .map(str::to_string)
        .collect();
    let resolver = TokenColumnResolver::new(labels);

    while let Some(line) = cur.peek() {
        if line.trim().is_empty() {
            break;
        }
        let row = clock.strip_prefix(line).unwrap_or(line);
        // The id itself can be numeric ("0", "1"), so it is split off
        // before value resolution rather than left for the resolver.
        let (id, rest) = split_token(row);
        if !is_cpu_id(id) {
            break;
        }
        match resolver.resolve(rest) {
            Some(parsed) => {
                for &(col, value) in &parsed.values {
                    builder.set(&format!("CPU {} {}", id, resolver.labels()[col]), index, value);
                }
                builder.note_cpu(id);
            }
            None => {
                tracing::warn!("Skipping malformed per-CPU row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}

fn is_cpu_id(token: &str) -> bool {
    token == "all" || (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
}
