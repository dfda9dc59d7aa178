//! Header-label canonicalization.
//!
//! The source tool has been through several revisions that spell the same
//! column differently (`AllTimeBlocked`, `all-time-blocked`, `ATB`,
//! `All time blocked`). Lookups are case-insensitive and ignore separator
//! characters, so one table row covers every spelling. Unknown labels pass
//! through unchanged.

/// Canonical label, then every known spelling in squashed form
/// (lowercase, separators removed). The canonical label's own squashed
/// form is always listed, which makes normalization idempotent.
const CANONICAL_LABELS: &[(&str, &[&str])] = &[
    ("Active", &["active", "activetasks"]),
    ("Pending", &["pending", "pendingtasks"]),
    ("Completed", &["completed", "completedtasks"]),
    ("Blocked", &["blocked", "currentlyblockedtasks"]),
    (
        "All time blocked",
        &["alltimeblocked", "atb", "totalblockedtasks"],
    ),
    ("Dropped", &["dropped", "droppedtasks"]),
    // Meter-table metric types (dropwizard vocabulary)
    ("Count", &["count"]),
    ("MeanRate", &["meanrate"]),
    ("1MinuteRate", &["1minuterate", "oneminuterate", "m1rate"]),
    ("5MinuteRate", &["5minuterate", "fiveminuterate", "m5rate"]),
    ("15MinuteRate", &["15minuterate", "fifteenminuterate", "m15rate"]),
];

/// Longest canonical label, in tokens, for the multi-token matcher.
const MAX_LABEL_TOKENS: usize = 3;

/// Lowercase a label and drop separator characters.
pub fn squash(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.' | '(' | ')'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup(squashed: &str) -> Option<&'static str> {
    CANONICAL_LABELS
        .iter()
        .find(|(_, variants)| variants.contains(&squashed))
        .map(|(canonical, _)| *canonical)
}

/// Map a raw column label to its canonical form; unknown labels pass
/// through (trimmed) unchanged.
pub fn normalize(label: &str) -> String {
    let trimmed = label.trim();
    match lookup(&squash(trimmed)) {
        Some(canonical) => canonical.to_string(),
        None => trimmed.to_string(),
    }
}

/// Whether a single token is a known column label.
pub fn is_known(token: &str) -> bool {
    lookup(&squash(token)).is_some()
}

/// Resolve a run of header tokens into column labels, merging multi-token
/// spellings (`All time blocked`) greedily, longest match first.
pub fn header_labels(tokens: &[&str]) -> Vec<String> {
    let mut labels = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let mut matched = false;
        let max_span = MAX_LABEL_TOKENS.min(tokens.len() - i);
        for span in (2..=max_span).rev() {
            let joined = tokens[i..i + span].join(" ");
            if let Some(canonical) = lookup(&squash(&joined)) {
                labels.push(canonical.to_string());
                i += span;
                matched = true;
                break;
            }
        }
        if !matched {
            labels.push(normalize(tokens[i]));
            i += 1;
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spelling_variants_converge() {
        for spelling in ["AllTimeBlocked", "all-time-blocked", "ATB", "All time blocked"] {
            assert_eq!(normalize(spelling), "All time blocked", "spelling: {}", spelling);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for (canonical, _) in CANONICAL_LABELS {
            assert_eq!(normalize(canonical), *canonical);
            assert_eq!(normalize(&normalize(canonical)), *canonical);
        }
    }

    #[test]
    fn test_unknown_labels_pass_through() {
        assert_eq!(normalize("%util"), "%util");
        assert_eq!(normalize("  rkB/s "), "rkB/s");
    }

    #[test]
    fn test_header_labels_merges_multiword() {
        let tokens = ["Active", "Pending", "Completed", "Blocked", "All", "time", "blocked"];
        assert_eq!(
            header_labels(&tokens),
            vec!["Active", "Pending", "Completed", "Blocked", "All time blocked"]
        );
    }

    #[test]
    fn test_header_labels_keeps_unknown_tokens() {
        let tokens = ["Dropped", "50%", "95%", "99%", "Max"];
        assert_eq!(header_labels(&tokens), vec!["Dropped", "50%", "95%", "99%", "Max"]);
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("Pending"));
        assert!(is_known("dropped"));
        assert!(!is_known("ReadStage"));
    }
}
