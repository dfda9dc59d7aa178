//! Diagnostic dump normalization engine.
//!
//! Turns heterogeneous textual diagnostic dumps (thread-pool statistics,
//! I/O utilization, per-CPU utilization, latency percentile histograms,
//! top-like process captures) into one canonical gap-filled time-series
//! [`Bundle`] a charting boundary can render directly.
//!
//! # Architecture
//!
//! - `timestamp.rs`: stamp recognition and canonicalization
//! - `headers.rs`: column-label spelling normalization
//! - `columns.rs`: token- and offset-based column resolution
//! - `scanner.rs`: single forward pass, section dispatch
//! - `formats/`: one extractor per dump family
//! - `bundle.rs`: the series assembler and output invariants
//! - `detector.rs`: family detection with confidence scores
//! - `aggregate.rs`: multi-node bundle merging
//!
//! # Guarantees
//!
//! - Every series is exactly as long as the timestamp axis
//! - Missing samples are NaN, never zero
//! - A parse call never returns an error and never panics through the
//!   boundary (catch_unwind wrapper); the worst outcome is a sentinel
//!   Bundle
//! - Identical input yields bitwise-identical output

pub mod aggregate;
pub mod bundle;
pub mod columns;
pub mod detector;
pub mod formats;
pub mod headers;
pub mod model;
pub mod options;
pub mod timestamp;

mod scanner;

pub use aggregate::{merge, node_id};
pub use bundle::{Bundle, BundleMeta, SeriesBuilder, MISSING, NO_DATA_METRIC};
pub use detector::detect;
pub use formats::process_snapshot::{ProcessRow, Snapshot, SystemSummary};
pub use model::{Detection, Family, OptionsError};
pub use options::ParseOptions;
pub use timestamp::{Clock, CANONICAL_FORMAT};

// Constants
pub const DETECTION_SAMPLE_LINES: usize = 30; // Lines to sample for detection
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.95;
pub const MEDIUM_CONFIDENCE_THRESHOLD: f32 = 0.70;

/// Parse a dump of a known family with options resolved from the
/// environment (see [`ParseOptions::load`]).
pub fn parse(text: &str, family: Family) -> Bundle {
    parse_with(text, family, &ParseOptions::load())
}

/// Detect the family from the file name and content, then parse.
/// An undetected document yields the sentinel Bundle.
pub fn parse_file(file_name: &str, text: &str) -> Bundle {
    parse_file_with(file_name, text, &ParseOptions::load())
}

pub fn parse_file_with(file_name: &str, text: &str, options: &ParseOptions) -> Bundle {
    let detection = detector::detect(file_name, text);
    if detection.family == Family::Unknown {
        tracing::warn!("Could not detect dump family for {:?}", file_name);
    }
    parse_with(text, detection.family, options)
}

/// Parse a dump of a known family. Never returns an error and never
/// panics: a fault anywhere in extraction degrades to the sentinel
/// Bundle.
pub fn parse_with(text: &str, family: Family, options: &ParseOptions) -> Bundle {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        parse_inner(text, family, options)
    }));
    match result {
        Ok(bundle) => bundle,
        Err(_) => {
            tracing::error!("Parse fault in {} extraction, emitting sentinel", family.as_str());
            SeriesBuilder::new(Clock::new(options).fallback_stamp()).finish()
        }
    }
}

fn parse_inner(text: &str, family: Family, options: &ParseOptions) -> Bundle {
    let mut clock = Clock::new(options);
    let mut builder = SeriesBuilder::new(clock.fallback_stamp());

    match family {
        Family::ProcessSnapshot => {
            formats::process_snapshot::extract(text, &mut builder, &mut clock)
        }
        Family::Unknown => {}
        _ => scanner::scan(text, family, &mut builder, &mut clock),
    }

    builder.note_synthesized(clock.synthesized());
    builder.finish()
}
