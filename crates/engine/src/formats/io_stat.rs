//! I/O utilization dumps: one `avg-cpu:` block plus one device table per
//! interval. The two historical timestamp dialects (ISO vs locale AM/PM)
//! differ only in their stamp spelling, which the shared clock absorbs;
//! extraction itself is one path.

use crate::bundle::SeriesBuilder;
use crate::columns::TokenColumnResolver;
use crate::model::Family;
use crate::scanner::{block_end, Cursor};
use crate::timestamp::Clock;

const FAMILY: Family = Family::IoStat;

/// Per-device metrics worth charting; other device columns are dropped.
const DEVICE_METRICS: &[&str] = &["r/s", "w/s", "rkB/s", "wkB/s", "avgqu-sz", "await", "%util"];

pub(crate) fn extract_cpu_average(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    let labels: Vec<String> = header
        .split_whitespace()
        .filter(|t| *t != "avg-cpu:")
        .map(str::to_string)
        .collect();
    let resolver = TokenColumnResolver::new(labels);

    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        match resolver.resolve(line) {
            Some(row) => {
                for &(col, value) in &row.values {
                    builder.set(&resolver.labels()[col], index, value);
                }
            }
            None => {
                tracing::warn!("Skipping malformed avg-cpu row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}

pub(crate) fn extract_device_table(
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    // Header spells "Device:" (older) or "Device" (newer).
    let labels: Vec<String> = header
        .split_whitespace()
        .skip(1)
        .map(str::to_string)
        .collect();
    let resolver = TokenColumnResolver::new(labels);

    while let Some(line) = cur.peek() {
        if block_end(FAMILY, clock, line) {
            break;
        }
        match resolver.resolve(line) {
            Some(row) if !row.label.is_empty() => {
                for &(col, value) in &row.values {
                    let column = &resolver.labels()[col];
                    if DEVICE_METRICS.contains(&column.as_str()) {
                        builder.set(&format!("{} {}", row.label, column), index, value);
                    }
                }
                builder.note_device(&row.label);
            }
            _ => {
                tracing::warn!("Skipping malformed device row: {:?}", line);
                builder.skip_row();
            }
        }
        cur.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;
    use chrono::NaiveDate;

    fn parse(doc: &str) -> crate::Bundle {
        let options = ParseOptions::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2023, 4, 5).unwrap());
        crate::parse_with(doc, Family::IoStat, &options)
    }

    const ISO_DOC: &str = "\
Linux 4.15.0 (node1)  04/05/2023  _x86_64_  (8 CPU)

2023-04-05T10:00:00
avg-cpu:  %user   %nice %system %iowait  %steal   %idle
          10.00    0.00    5.00    2.00    0.00   83.00

Device:         rrqm/s   wrqm/s     r/s     w/s    rkB/s    wkB/s avgrq-sz avgqu-sz   await  svctm  %util
sda               0.00     1.00    2.00    3.00    40.00    60.00     8.00     0.10    1.00   0.50   0.30
";

    #[test]
    fn test_cpu_metrics_named_by_header() {
        let bundle = parse(ISO_DOC);
        assert_eq!(bundle.value("%user", 0), Some(10.0));
        assert_eq!(bundle.value("%idle", 0), Some(83.0));
        assert_eq!(bundle.value("%iowait", 0), Some(2.0));
    }

    #[test]
    fn test_device_metrics_filtered_to_vocabulary() {
        let bundle = parse(ISO_DOC);
        assert_eq!(bundle.value("sda r/s", 0), Some(2.0));
        assert_eq!(bundle.value("sda rkB/s", 0), Some(40.0));
        assert_eq!(bundle.value("sda %util", 0), Some(0.3));
        // Not in the seven-metric vocabulary:
        assert_eq!(bundle.get("sda rrqm/s"), None);
        assert_eq!(bundle.get("sda avgrq-sz"), None);
        assert_eq!(bundle.metadata.devices, vec!["sda"]);
    }

    #[test]
    fn test_locale_dialect_shares_the_path() {
        let doc = "\
04/05/2023 10:00:00 AM
avg-cpu:  %user   %nice %system %iowait  %steal   %idle
           9.50    0.00    4.00    1.00    0.00   85.50
";
        let bundle = parse(doc);
        assert_eq!(bundle.timestamps, vec!["2023-04-05T10:00:00"]);
        assert_eq!(bundle.value("%user", 0), Some(9.5));
    }

    #[test]
    fn test_two_intervals_align_to_their_stamps() {
        let doc = "\
2023-04-05T10:00:00
avg-cpu:  %user   %nice %system %iowait  %steal   %idle
          10.00    0.00    5.00    2.00    0.00   83.00

2023-04-05T10:00:05
avg-cpu:  %user   %nice %system %iowait  %steal   %idle
          20.00    0.00    6.00    2.00    0.00   72.00
";
        let bundle = parse(doc);
        assert_eq!(bundle.get("%user"), Some(&[10.0, 20.0][..]));
    }

    #[test]
    fn test_device_appearing_mid_document_is_left_padded() {
        let doc = "\
2023-04-05T10:00:00
Device:           r/s     w/s   %util
sda              2.00    3.00    0.30

2023-04-05T10:00:05
Device:           r/s     w/s   %util
sda              2.50    3.50    0.40
sdb              9.00    1.00    0.80
";
        let bundle = parse(doc);
        let sdb = bundle.get("sdb r/s").unwrap();
        assert!(sdb[0].is_nan());
        assert_eq!(sdb[1], 9.0);
    }
}
