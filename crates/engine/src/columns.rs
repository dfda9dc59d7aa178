//! Column-position resolution.
//!
//! Two strategies, picked per family:
//!
//! - [`TokenColumnResolver`] splits a data line on whitespace; everything
//!   before the first numeric (or not-available) token is the row label,
//!   everything after is matched 1:1 against the header columns.
//! - [`OffsetColumnResolver`] locates each expected header label's byte
//!   offset in the raw header line and slices data rows by those offsets.
//!   Required where a label contains embedded spaces (`Read Latency`) and
//!   alignment, not separators, delimits the columns.
//!
//! Both tolerate short rows by losing only the trailing columns.

/// Parse one numeric cell. Thousands separators are stripped; explicit
/// not-available markers become NaN (a missing value, not an absent cell).
pub fn parse_value(token: &str) -> Option<f64> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }
    if matches!(t, "N/A" | "n/a" | "NaN" | "nan" | "-") {
        return Some(f64::NAN);
    }
    if t.contains(',') {
        t.replace(',', "").parse().ok()
    } else {
        t.parse().ok()
    }
}

/// One data row resolved against token-based columns.
#[derive(Debug)]
pub struct TokenRow {
    /// Leading non-numeric tokens, joined with single spaces. May be empty
    /// for rows that are all values (iostat's avg-cpu row).
    pub label: String,
    /// `(column index, value)` pairs, capped at the header column count.
    pub values: Vec<(usize, f64)>,
}

#[derive(Debug)]
pub struct TokenColumnResolver {
    labels: Vec<String>,
}

impl TokenColumnResolver {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Resolve a data line. Returns `None` when the line holds no value
    /// tokens at all (not a data row).
    pub fn resolve(&self, line: &str) -> Option<TokenRow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let first_value = tokens.iter().position(|t| parse_value(t).is_some())?;
        let label = tokens[..first_value].join(" ");
        let values = tokens[first_value..]
            .iter()
            .take(self.labels.len())
            .enumerate()
            .filter_map(|(i, t)| parse_value(t).map(|v| (i, v)))
            .collect();
        Some(TokenRow { label, values })
    }
}

#[derive(Debug)]
struct OffsetColumn {
    label: String,
    start: usize,
    end: Option<usize>,
}

#[derive(Debug)]
pub struct OffsetColumnResolver {
    columns: Vec<OffsetColumn>,
}

impl OffsetColumnResolver {
    /// Locate each expected label in the raw (unstripped) header line.
    /// Longer labels claim their region first so `Read Latency` never
    /// matches inside `CAS Read Latency`. Labels not present in this
    /// header revision are simply absent from the resolver.
    pub fn locate(header: &str, expected: &[&str]) -> Self {
        let mut by_length: Vec<&str> = expected.to_vec();
        by_length.sort_by_key(|l| std::cmp::Reverse(l.len()));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut found: Vec<(usize, String)> = Vec::new();
        for label in by_length {
            let mut from = 0;
            while let Some(at) = header[from..].find(label) {
                let start = from + at;
                let end = start + label.len();
                if claimed.iter().all(|&(s, e)| end <= s || start >= e) {
                    claimed.push((start, end));
                    found.push((start, label.to_string()));
                    break;
                }
                from = start + 1;
            }
        }
        found.sort_by_key(|&(start, _)| start);

        let starts: Vec<usize> = found.iter().map(|&(s, _)| s).collect();
        let columns = found
            .into_iter()
            .enumerate()
            .map(|(i, (start, label))| OffsetColumn {
                label,
                start,
                end: starts.get(i + 1).copied(),
            })
            .collect();
        Self { columns }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Slice a data row into one trimmed cell per column. Cells past the
    /// end of a short row come back as `None`.
    pub fn cells<'a>(&self, line: &'a str) -> Vec<Option<&'a str>> {
        self.columns
            .iter()
            .map(|col| {
                if col.start >= line.len() {
                    return None;
                }
                let end = col.end.unwrap_or(line.len()).min(line.len());
                line.get(col.start..end).map(str::trim)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_plain_and_separated() {
        assert_eq!(parse_value("1023"), Some(1023.0));
        assert_eq!(parse_value("1,023"), Some(1023.0));
        assert_eq!(parse_value("83.0"), Some(83.0));
        assert!(parse_value("N/A").unwrap().is_nan());
        assert_eq!(parse_value("ReadStage"), None);
        assert_eq!(parse_value("10:00:00"), None);
    }

    #[test]
    fn test_token_resolver_pool_row() {
        let resolver = TokenColumnResolver::new(
            ["Active", "Pending", "Completed", "Blocked", "All time blocked"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let row = resolver.resolve("ReadStage  5  0  1023  0  12").unwrap();
        assert_eq!(row.label, "ReadStage");
        assert_eq!(row.values, vec![(0, 5.0), (1, 0.0), (2, 1023.0), (3, 0.0), (4, 12.0)]);
    }

    #[test]
    fn test_token_resolver_multiword_label() {
        let resolver = TokenColumnResolver::new(vec!["Dropped".to_string()]);
        let row = resolver.resolve("HINT dispatch  3").unwrap();
        assert_eq!(row.label, "HINT dispatch");
        assert_eq!(row.values, vec![(0, 3.0)]);
    }

    #[test]
    fn test_token_resolver_short_row_loses_trailing_columns() {
        let resolver = TokenColumnResolver::new(
            ["Active", "Pending", "Completed"].iter().map(|s| s.to_string()).collect(),
        );
        let row = resolver.resolve("MutationStage 1 2").unwrap();
        assert_eq!(row.values, vec![(0, 1.0), (1, 2.0)]);
    }

    #[test]
    fn test_token_resolver_extra_values_are_capped() {
        let resolver = TokenColumnResolver::new(vec!["Active".to_string()]);
        let row = resolver.resolve("ReadStage 1 2 3").unwrap();
        assert_eq!(row.values, vec![(0, 1.0)]);
    }

    #[test]
    fn test_token_resolver_non_data_line() {
        let resolver = TokenColumnResolver::new(vec!["Active".to_string()]);
        assert!(resolver.resolve("Pool Name and nothing numeric").is_none());
    }

    const PROXY_HEADER: &str = "Percentile       Read Latency      Write Latency      Range Latency   CAS Read Latency  CAS Write Latency";

    #[test]
    fn test_offset_resolver_locates_in_order() {
        let resolver = OffsetColumnResolver::locate(
            PROXY_HEADER,
            &["Percentile", "Read Latency", "Write Latency", "Range Latency", "CAS Read Latency", "CAS Write Latency"],
        );
        assert_eq!(
            resolver.labels(),
            vec!["Percentile", "Read Latency", "Write Latency", "Range Latency", "CAS Read Latency", "CAS Write Latency"]
        );
    }

    #[test]
    fn test_offset_resolver_embedded_label_not_double_claimed() {
        // Only the CAS columns are present: "Read Latency" must not match
        // inside "CAS Read Latency".
        let header = "Percentile   CAS Read Latency  CAS Write Latency";
        let resolver = OffsetColumnResolver::locate(
            header,
            &["Percentile", "Read Latency", "CAS Read Latency", "CAS Write Latency"],
        );
        assert_eq!(resolver.labels(), vec!["Percentile", "CAS Read Latency", "CAS Write Latency"]);
    }

    #[test]
    fn test_offset_resolver_slices_aligned_row() {
        let resolver = OffsetColumnResolver::locate(
            PROXY_HEADER,
            &["Percentile", "Read Latency", "Write Latency", "Range Latency", "CAS Read Latency", "CAS Write Latency"],
        );
        let row = "50%                    315.85             379.02             446.83               0.00               0.00";
        let cells = resolver.cells(row);
        assert_eq!(cells[0], Some("50%"));
        assert_eq!(cells[1].and_then(parse_value), Some(315.85));
        assert_eq!(cells[2].and_then(parse_value), Some(379.02));
    }

    #[test]
    fn test_offset_resolver_short_row() {
        let resolver = OffsetColumnResolver::locate(
            PROXY_HEADER,
            &["Percentile", "Read Latency", "Write Latency", "Range Latency", "CAS Read Latency", "CAS Write Latency"],
        );
        let cells = resolver.cells("Min                      10.00");
        assert_eq!(cells[0], Some("Min"));
        assert_eq!(cells[1].and_then(parse_value), Some(10.0));
        assert_eq!(cells[2], None);
        assert_eq!(cells[5], None);
    }
}
