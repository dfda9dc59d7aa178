//! Timestamp recognition and canonicalization.
//!
//! The dumps mix three timestamp spellings across tool revisions:
//! ISO `YYYY-MM-DDTHH:MM:SS[±offset]`, locale `MM/DD/YYYY HH:MM:SS AM|PM`,
//! and a bare `HH:MM:SS [AM|PM]` time with no date at all. All of them
//! canonicalize to `%Y-%m-%dT%H:%M:%S`. A token that has the right shape
//! but an impossible value (month 13, hour 25) still yields a stamp: the
//! clock synthesizes one step past the last recognized stamp, so the axis
//! never goes backwards and the record is never dropped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::options::ParseOptions;

pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw timestamp pieces found at the start of a line.
#[derive(Debug, PartialEq, Eq)]
enum Shape<'a> {
    Iso { stamp: &'a str },
    /// "YYYY-MM-DD HH:MM:SS", ISO with a space instead of 'T'
    IsoSplit { date: &'a str, time: &'a str },
    Locale {
        date: &'a str,
        time: &'a str,
        meridiem: Option<&'a str>,
    },
    BareTime {
        time: &'a str,
        meridiem: Option<&'a str>,
    },
}

/// Recognizes timestamps and owns the synthetic fallback counter for one
/// parse call.
#[derive(Debug)]
pub struct Clock {
    reference_date: NaiveDate,
    fallback_base: NaiveDateTime,
    fallback_step: i64,
    last_seen: Option<NaiveDateTime>,
    synthesized: u64,
}

impl Clock {
    pub fn new(options: &ParseOptions) -> Self {
        let reference_date = options
            .reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let fallback_base = options
            .fallback_start
            .or_else(|| reference_date.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN);
        Self {
            reference_date,
            fallback_base,
            fallback_step: i64::from(options.fallback_step_secs.max(1)),
            last_seen: None,
            synthesized: 0,
        }
    }

    /// Number of synthesized (non-recognized) timestamps handed out so far.
    pub fn synthesized(&self) -> u64 {
        self.synthesized
    }

    /// Canonical stamp to use when the document yields no timestamps at all.
    pub fn fallback_stamp(&self) -> String {
        self.fallback_base.format(CANONICAL_FORMAT).to_string()
    }

    /// If the line begins with a recognizable timestamp, return its
    /// canonical form plus the unconsumed remainder of the line.
    ///
    /// A shape match with an out-of-range value returns a synthesized stamp
    /// rather than `None`, so a mangled timestamp never drops a record.
    pub fn recognize<'a>(&mut self, line: &'a str) -> Option<(String, &'a str)> {
        let text = line.trim_start();
        if text.is_empty() {
            return None;
        }
        let (shape, rest) = match_shape(text)?;
        let canonical = match self.canonicalize(&shape) {
            Some(stamp) => {
                self.last_seen = Some(stamp);
                stamp.format(CANONICAL_FORMAT).to_string()
            }
            None => self.synthesize(),
        };
        Some((canonical, rest))
    }

    /// Shape-only check, usable while a `&mut` borrow is not available.
    pub fn matches(&self, line: &str) -> bool {
        match_shape(line.trim_start()).is_some()
    }

    /// Strip a leading timestamp token without canonicalizing it.
    /// Used for data rows that repeat the interval stamp (per-CPU rows).
    pub fn strip_prefix<'a>(&self, line: &'a str) -> Option<&'a str> {
        match_shape(line.trim_start()).map(|(_, rest)| rest)
    }

    /// Next synthetic timestamp: one step past the last recognized (or
    /// synthesized) stamp, so the axis never moves backwards. Starts from
    /// the configured base when nothing has been seen yet.
    pub fn synthesize(&mut self) -> String {
        let stamp = match self.last_seen {
            Some(last) => last + Duration::seconds(self.fallback_step),
            None => self.fallback_base,
        };
        self.last_seen = Some(stamp);
        self.synthesized += 1;
        stamp.format(CANONICAL_FORMAT).to_string()
    }

    fn canonicalize(&self, shape: &Shape<'_>) -> Option<NaiveDateTime> {
        let stamp = match shape {
            Shape::Iso { stamp } => {
                NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S").ok()?
            }
            Shape::IsoSplit { date, time } => {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
                date.and_time(parse_clock(time, None)?)
            }
            Shape::Locale { date, time, meridiem } => {
                let date = NaiveDate::parse_from_str(date, "%m/%d/%Y")
                    .or_else(|_| NaiveDate::parse_from_str(date, "%m/%d/%y"))
                    .ok()?;
                date.and_time(parse_clock(time, *meridiem)?)
            }
            Shape::BareTime { time, meridiem } => {
                self.reference_date.and_time(parse_clock(time, *meridiem)?)
            }
        };
        Some(stamp)
    }
}

/// Parse `HH:MM:SS` with optional AM/PM, converting 12h to 24h.
fn parse_clock(time: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    match meridiem {
        Some(m) => {
            let joined = format!("{} {}", time, m);
            NaiveTime::parse_from_str(&joined, "%I:%M:%S %p").ok()
        }
        None => NaiveTime::parse_from_str(time, "%H:%M:%S").ok(),
    }
}

fn match_shape(text: &str) -> Option<(Shape<'_>, &str)> {
    match_iso(text)
        .or_else(|| match_locale(text))
        .or_else(|| match_bare_time(text))
}

fn match_iso(text: &str) -> Option<(Shape<'_>, &str)> {
    let (token, rest) = split_token(text);
    // "YYYY-MM-DD HH:MM:SS" (space instead of 'T') splits into two tokens
    // and shares the canonical form with the 'T' spelling.
    if looks_like_date(token) {
        let (time_tok, rest2) = split_token(rest);
        if looks_like_clock(time_tok) {
            return Some((Shape::IsoSplit { date: token, time: time_tok }, rest2));
        }
        return None;
    }
    // dddd-dd-ddTdd:dd:dd, optionally with a trailing offset in the token
    if token.len() < 19 {
        return None;
    }
    let b = token.as_bytes();
    let punct_ok = b[4] == b'-' && b[7] == b'-' && b[10] == b'T' && b[13] == b':' && b[16] == b':';
    if !punct_ok {
        return None;
    }
    let digits_ok = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18]
        .iter()
        .all(|&i| b[i].is_ascii_digit());
    if !digits_ok {
        return None;
    }
    Some((Shape::Iso { stamp: &token[..19] }, rest))
}

fn match_locale(text: &str) -> Option<(Shape<'_>, &str)> {
    let (date_tok, rest1) = split_token(text);
    if date_tok.matches('/').count() != 2 || !date_tok.bytes().all(|b| b.is_ascii_digit() || b == b'/') {
        return None;
    }
    let (time_tok, rest2) = split_token(rest1);
    if !looks_like_clock(time_tok) {
        return None;
    }
    let (ampm_tok, rest3) = split_token(rest2);
    if ampm_tok.eq_ignore_ascii_case("AM") || ampm_tok.eq_ignore_ascii_case("PM") {
        Some((
            Shape::Locale {
                date: date_tok,
                time: time_tok,
                meridiem: Some(ampm_tok),
            },
            rest3,
        ))
    } else {
        Some((
            Shape::Locale {
                date: date_tok,
                time: time_tok,
                meridiem: None,
            },
            rest2,
        ))
    }
}

fn match_bare_time(text: &str) -> Option<(Shape<'_>, &str)> {
    let (time_tok, rest1) = split_token(text);
    if !looks_like_clock(time_tok) {
        return None;
    }
    let (ampm_tok, rest2) = split_token(rest1);
    if ampm_tok.eq_ignore_ascii_case("AM") || ampm_tok.eq_ignore_ascii_case("PM") {
        Some((
            Shape::BareTime {
                time: time_tok,
                meridiem: Some(ampm_tok),
            },
            rest2,
        ))
    } else {
        Some((
            Shape::BareTime {
                time: time_tok,
                meridiem: None,
            },
            rest1,
        ))
    }
}

fn looks_like_date(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && [0, 1, 2, 3, 5, 6, 8, 9].iter().all(|&i| b[i].is_ascii_digit())
}

fn looks_like_clock(token: &str) -> bool {
    token.matches(':').count() == 2
        && !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit() || b == b':')
}

/// Split the first whitespace-delimited token off a line.
pub(crate) fn split_token(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}
