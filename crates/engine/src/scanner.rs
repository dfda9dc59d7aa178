//! Single forward pass over a document: recognize timestamp boundaries,
//! classify section headers, dispatch the family's extractor.
//!
//! Sections never nest and only one is open at a time. The scanner does
//! not pre-compute section boundaries; each extractor consumes forward
//! lines until it meets the next timestamp, the next section header, or a
//! blank separator line, then returns control at that line.

use crate::bundle::SeriesBuilder;
use crate::formats;
use crate::model::Family;
use crate::timestamp::Clock;

/// Forward-only line cursor shared between the scanner and extractors.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    pub fn bump(&mut self) {
        self.pos += 1;
    }
}

/// Named sub-sections within one timestamp's dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SectionKind {
    ThreadPools,
    MessageTypes,
    Meters,
    CpuAverage,
    DeviceTable,
    PerCpu,
    ProxyPercentiles,
    TableHistogram(String),
}

/// Classify a line as a section header for the given family.
pub(crate) fn section_header(family: Family, line: &str) -> Option<SectionKind> {
    let t = line.trim();
    if t.is_empty() {
        return None;
    }
    match family {
        Family::ThreadPool => {
            if t.contains("Active")
                && t.contains("Pending")
                && (t.contains("Blocked") || t.contains("Completed"))
            {
                return Some(SectionKind::ThreadPools);
            }
            if t.starts_with("Message type") {
                return Some(SectionKind::MessageTypes);
            }
            if t.contains("Count") && t.contains("Rate") {
                return Some(SectionKind::Meters);
            }
            None
        }
        Family::IoStat => {
            if t.contains("avg-cpu:") {
                return Some(SectionKind::CpuAverage);
            }
            if t.starts_with("Device") {
                return Some(SectionKind::DeviceTable);
            }
            None
        }
        Family::CpuStat => {
            if t.starts_with("CPU") && t.contains('%') {
                return Some(SectionKind::PerCpu);
            }
            None
        }
        Family::ProxyHistogram => {
            if t.starts_with("Percentile") {
                return Some(SectionKind::ProxyPercentiles);
            }
            None
        }
        Family::TableHistogram => {
            let name = t.strip_suffix(" histograms")?.trim();
            if name.is_empty() {
                return None;
            }
            // "keyspace/table histograms": key on the short table name
            let short = name.rsplit('/').next().unwrap_or(name);
            Some(SectionKind::TableHistogram(short.to_string()))
        }
        Family::ProcessSnapshot | Family::Unknown => None,
    }
}

/// An extractor's generic exit condition: blank separator, next section
/// header, or next timestamp line.
pub(crate) fn block_end(family: Family, clock: &Clock, line: &str) -> bool {
    line.trim().is_empty() || section_header(family, line).is_some() || clock.matches(line)
}

/// Walk the document once, dispatching each recognized section.
pub(crate) fn scan(text: &str, family: Family, builder: &mut SeriesBuilder, clock: &mut Clock) {
    let mut cur = Cursor::new(text);
    let mut current: Option<usize> = None;

    while let Some(line) = cur.peek() {
        if let Some((canonical, rest)) = clock.recognize(line) {
            let index = builder.touch(canonical);
            current = Some(index);
            cur.bump();
            // Per-CPU headers share a line with the interval stamp.
            if let Some(kind) = section_header(family, rest) {
                formats::extract_section(kind, rest, &mut cur, builder, index, clock);
            }
            continue;
        }
        if let Some(kind) = section_header(family, line) {
            cur.bump();
            let index = match current {
                Some(index) => index,
                None => {
                    // Section before any timestamp: synthesize one.
                    let index = builder.touch(clock.synthesize());
                    current = Some(index);
                    index
                }
            };
            formats::extract_section(kind, line, &mut cur, builder, index, clock);
            continue;
        }
        cur.bump();
    }
}
