//! The canonical time-series bundle and its assembler.
//!
//! A [`Bundle`] is the sole data product of a parse: ordered canonical
//! timestamps, a map from metric name to value sequence where every one is
//! exactly `timestamps.len()` long, and auxiliary metadata for selection
//! UIs. Missing samples are NaN; zero is a valid measurement.
//!
//! [`SeriesBuilder`] is the single owner of the output shape during a
//! parse. Extractors only call `touch`/`register`/`set`; the length
//! invariant is enforced once, in `finish`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// Sentinel for "no sample at this timestamp".
pub const MISSING: f64 = f64::NAN;

/// Metric injected when extraction yields nothing, so the boundary always
/// has something renderable.
pub const NO_DATA_METRIC: &str = "No data extracted";

/// Family-specific auxiliary facts for selection UIs, plus parse counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BundleMeta {
    /// Thread-pool names discovered in pool tables
    pub pools: Vec<String>,
    /// Table names discovered in table-histogram blocks
    pub tables: Vec<String>,
    /// Storage devices discovered in I/O device tables
    pub devices: Vec<String>,
    /// CPU ids ("all" first, then numeric ascending)
    pub cpus: Vec<String>,
    /// `<command> (<pid>)` labels from process snapshots
    pub processes: Vec<String>,
    /// Rows skipped as malformed
    pub rows_skipped: u64,
    /// Timestamps that had to be synthesized
    pub synthesized_timestamps: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    pub timestamps: Vec<String>,
    pub series: BTreeMap<String, Vec<f64>>,
    pub metadata: BundleMeta,
}

impl Bundle {
    pub fn get(&self, metric: &str) -> Option<&[f64]> {
        self.series.get(metric).map(Vec::as_slice)
    }

    pub fn value(&self, metric: &str, index: usize) -> Option<f64> {
        self.get(metric).and_then(|s| s.get(index)).copied()
    }

    /// True when extraction produced nothing and the bundle carries only
    /// the injected sentinel metric.
    pub fn is_sentinel(&self) -> bool {
        self.series.contains_key(NO_DATA_METRIC)
    }

    /// NaN-aware equality (NaN == NaN), for determinism checks.
    pub fn bitwise_eq(&self, other: &Bundle) -> bool {
        if self.timestamps != other.timestamps || self.metadata != other.metadata {
            return false;
        }
        if self.series.len() != other.series.len() {
            return false;
        }
        self.series.iter().zip(other.series.iter()).all(|((ka, va), (kb, vb))| {
            ka == kb
                && va.len() == vb.len()
                && va.iter().zip(vb).all(|(a, b)| a.to_bits() == b.to_bits())
        })
    }
}

/// Accumulates one parse's output. Created empty, mutated by exactly one
/// parse call, consumed by [`SeriesBuilder::finish`].
#[derive(Debug)]
pub struct SeriesBuilder {
    timestamps: Vec<String>,
    index: HashMap<String, usize>,
    series: BTreeMap<String, Vec<f64>>,
    meta: BundleMeta,
    fallback_stamp: String,
}

impl SeriesBuilder {
    pub fn new(fallback_stamp: String) -> Self {
        Self {
            timestamps: Vec::new(),
            index: HashMap::new(),
            series: BTreeMap::new(),
            meta: BundleMeta::default(),
            fallback_stamp,
        }
    }

    /// Look up or append a canonical timestamp; a repeated stamp reuses
    /// its existing slot.
    pub fn touch(&mut self, canonical: String) -> usize {
        if let Some(&i) = self.index.get(&canonical) {
            return i;
        }
        let i = self.timestamps.len();
        self.index.insert(canonical.clone(), i);
        self.timestamps.push(canonical);
        i
    }

    /// Lazily allocate a series, pre-filled with missing-markers for every
    /// timestamp already seen.
    pub fn register(&mut self, metric: &str) {
        let len = self.timestamps.len();
        self.series
            .entry(metric.to_string())
            .or_insert_with(|| vec![MISSING; len]);
    }

    /// Write one sample, allocating and padding on demand.
    pub fn set(&mut self, metric: &str, index: usize, value: f64) {
        let len = self.timestamps.len();
        let series = self
            .series
            .entry(metric.to_string())
            .or_insert_with(|| vec![MISSING; len]);
        if series.len() <= index {
            series.resize(index + 1, MISSING);
        }
        series[index] = value;
    }

    pub fn note_pool(&mut self, name: &str) {
        push_unique(&mut self.meta.pools, name);
    }

    pub fn note_table(&mut self, name: &str) {
        push_unique(&mut self.meta.tables, name);
    }

    pub fn note_device(&mut self, name: &str) {
        push_unique(&mut self.meta.devices, name);
    }

    pub fn note_cpu(&mut self, id: &str) {
        push_unique(&mut self.meta.cpus, id);
    }

    pub fn note_process(&mut self, label: &str) {
        push_unique(&mut self.meta.processes, label);
    }

    /// Record a malformed row that was skipped.
    pub fn skip_row(&mut self) {
        self.meta.rows_skipped += 1;
    }

    /// Carry skip counts over from an already-built bundle.
    pub fn skip_rows(&mut self, count: u64) {
        self.meta.rows_skipped += count;
    }

    pub fn note_synthesized(&mut self, count: u64) {
        self.meta.synthesized_timestamps += count;
    }

    /// Enforce the invariants and produce the immutable snapshot:
    /// every series padded/truncated to `timestamps.len()`, a synthetic
    /// timestamp for empty documents, a sentinel metric for empty output,
    /// metadata lists sorted.
    pub fn finish(mut self) -> Bundle {
        if self.timestamps.is_empty() {
            self.timestamps.push(self.fallback_stamp.clone());
            self.meta.synthesized_timestamps += 1;
        }
        let want = self.timestamps.len();
        for series in self.series.values_mut() {
            series.resize(want, MISSING);
        }
        if self.series.is_empty() {
            self.series
                .insert(NO_DATA_METRIC.to_string(), vec![MISSING; want]);
        }

        self.meta.pools.sort();
        self.meta.tables.sort();
        self.meta.devices.sort();
        self.meta.processes.sort();
        self.meta.cpus.sort_by(cpu_order);

        Bundle {
            timestamps: self.timestamps,
            series: self.series,
            metadata: self.meta,
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|x| x == item) {
        list.push(item.to_string());
    }
}

/// "all" sorts first; numeric ids sort numerically ascending.
fn cpu_order(a: &String, b: &String) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.as_str(), b.as_str()) {
        ("all", "all") => Ordering::Equal,
        ("all", _) => Ordering::Less,
        (_, "all") => Ordering::Greater,
        (a, b) => match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_timestamps_share_a_slot() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        let i0 = b.touch("2023-04-05T10:00:00".into());
        let i1 = b.touch("2023-04-05T10:00:05".into());
        let again = b.touch("2023-04-05T10:00:00".into());
        assert_eq!(i0, 0);
        assert_eq!(i1, 1);
        assert_eq!(again, 0);
        assert_eq!(b.finish().timestamps.len(), 2);
    }

    #[test]
    fn test_late_metric_is_left_padded() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        b.touch("2023-04-05T10:00:00".into());
        let i1 = b.touch("2023-04-05T10:00:05".into());
        b.set("late", i1, 7.0);
        let bundle = b.finish();
        let series = bundle.get("late").unwrap();
        assert_eq!(series.len(), 2);
        assert!(series[0].is_nan());
        assert_eq!(series[1], 7.0);
    }

    #[test]
    fn test_finish_pads_series_seen_before_later_timestamps() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        let i0 = b.touch("2023-04-05T10:00:00".into());
        b.set("early", i0, 1.0);
        b.touch("2023-04-05T10:00:05".into());
        b.touch("2023-04-05T10:00:10".into());
        let bundle = b.finish();
        let series = bundle.get("early").unwrap();
        assert_eq!(series.len(), bundle.timestamps.len());
        assert_eq!(series[0], 1.0);
        assert!(series[1].is_nan() && series[2].is_nan());
    }

    #[test]
    fn test_empty_builder_yields_renderable_bundle() {
        let bundle = SeriesBuilder::new("2023-04-05T00:00:00".into()).finish();
        assert_eq!(bundle.timestamps, vec!["2023-04-05T00:00:00"]);
        assert!(bundle.series.contains_key(NO_DATA_METRIC));
        assert_eq!(bundle.metadata.synthesized_timestamps, 1);
    }

    #[test]
    fn test_register_prefills_missing() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        b.touch("2023-04-05T10:00:00".into());
        b.register("m");
        let bundle = b.finish();
        assert!(bundle.get("m").unwrap()[0].is_nan());
    }

    #[test]
    fn test_cpu_ordering() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        for id in ["10", "2", "all", "0"] {
            b.note_cpu(id);
        }
        assert_eq!(b.finish().metadata.cpus, vec!["all", "0", "2", "10"]);
    }

    #[test]
    fn test_bundle_serializes_for_the_boundary() {
        let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
        let i = b.touch("2023-04-05T10:00:00".into());
        b.set("m", i, 1.5);
        let json = serde_json::to_value(b.finish()).unwrap();
        assert_eq!(json["timestamps"][0], "2023-04-05T10:00:00");
        assert_eq!(json["series"]["m"][0], 1.5);
    }

    #[test]
    fn test_bitwise_eq_treats_nan_as_equal() {
        let mk = || {
            let mut b = SeriesBuilder::new("2023-04-05T00:00:00".into());
            let i = b.touch("2023-04-05T10:00:00".into());
            b.touch("2023-04-05T10:00:05".into());
            b.set("m", i, 1.0);
            b.finish()
        };
        assert!(mk().bitwise_eq(&mk()));
    }
}
