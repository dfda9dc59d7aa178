//! Thread-pool statistics: three independent sub-tables per dump. Pools
//! (Active/Pending/Completed/Blocked/All time blocked), message types
//! (Dropped plus optional queue-latency percentiles), and meters (named
//! counters with the dropwizard column vocabulary).
//!
//! Pool metrics are emitted under both the legacy flat key
//! (`ReadStage | Active`) and the hierarchical key
//! (`Pool | ReadStage | Active`) so older consumers keep working.

use crate::bundle::SeriesBuilder;
use crate::columns::TokenColumnResolver;
use crate::headers;
use crate::model::Family;
use crate::scanner::{block_end, Cursor};
use crate::timestamp::Clock;

const FAMILY: Family = Family::ThreadPool;

/// Build a token resolver from a header line, skipping the row-label
/// header tokens ("Pool Name", "Message type", "Meter") that precede the
/// first known column.
fn resolver_from_header(header: &str) -> TokenColumnResolver {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|t| headers::is_known(t) || t.ends_with('%'))
        .unwrap_or(tokens.len());
    TokenColumnResolver::new(headers::header_labels(&tokens[start..]))
}

pub(crate) fn extract_pools(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    let resolver = resolver_from_header(header);
    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        match resolver.resolve(line) {
            Some(row) if !row.label.is_empty() => {
                for &(col, value) in &row.values {
                    let column = &resolver.labels()[col];
                    builder.set(&format!("{} | {}", row.label, column), index, value);
                    builder.set(&format!("Pool | {} | {}", row.label, column), index, value);
                }
                builder.note_pool(&row.label);
            }
            _ => {
                tracing::warn!("Skipping malformed pool row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}

pub(crate) fn extract_message_types(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    let resolver = resolver_from_header(header);
    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        match resolver.resolve(line) {
            Some(row) if !row.label.is_empty() => {
                for &(col, value) in &row.values {
                    let column = &resolver.labels()[col];
                    builder.set(&format!("{} | {}", row.label, column), index, value);
                }
            }
            _ => {
                tracing::warn!("Skipping malformed message-type row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}

pub(crate) fn extract_meters(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    let resolver = resolver_from_header(header);
    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        match resolver.resolve(line) {
            Some(row) if !row.label.is_empty() => {
                for &(col, value) in &row.values {
                    let column = &resolver.labels()[col];
                    builder.set(&format!("Meter | {} | {}", row.label, column), index, value);
                }
            }
            _ => {
                tracing::warn!("Skipping malformed meter row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}
