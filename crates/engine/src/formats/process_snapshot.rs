//! top-like process captures. A document holds one or more snapshots,
//! delimited by the `top -` banner or by standalone timestamp lines; when
//! neither appears the whole document is one snapshot. Each snapshot
//! carries system summary lines (load, CPU breakdown, memory, swap) and a
//! fixed-column process table.
//!
//! The structured snapshot model is public so boundary consumers can
//! build process pickers without re-parsing metric keys.

use serde::Serialize;

use crate::bundle::SeriesBuilder;
use crate::columns::parse_value;
use crate::timestamp::Clock;

/// System-wide summary figures from one snapshot.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SystemSummary {
    pub load_1m: Option<f64>,
    pub load_5m: Option<f64>,
    pub load_15m: Option<f64>,
    pub cpu_user: Option<f64>,
    pub cpu_system: Option<f64>,
    pub cpu_nice: Option<f64>,
    pub cpu_idle: Option<f64>,
    pub cpu_iowait: Option<f64>,
    /// KiB
    pub mem_total: Option<f64>,
    pub mem_free: Option<f64>,
    pub mem_used: Option<f64>,
    pub swap_total: Option<f64>,
    pub swap_used: Option<f64>,
}

/// One process-table row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessRow {
    pub pid: u64,
    pub user: String,
    pub priority: String,
    pub nice: String,
    /// KiB
    pub virt: Option<f64>,
    pub res: Option<f64>,
    pub shr: Option<f64>,
    pub status: String,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub time: String,
    pub command: String,
}

impl ProcessRow {
    /// `<command> (<pid>)`, the label used in metric keys and pickers.
    pub fn label(&self) -> String {
        format!("{} ({})", self.command, self.pid)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub system: SystemSummary,
    pub processes: Vec<ProcessRow>,
}

/// Segment a document into structured snapshots.
pub fn snapshots(text: &str, clock: &mut Clock) -> Vec<Snapshot> {
    let lines: Vec<&str> = text.lines().collect();

    // Separator token first, then timestamp lines, then whole-document.
    let mut starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim_start().starts_with("top -"))
        .map(|(i, _)| i)
        .collect();
    if starts.is_empty() {
        starts = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| {
                !l.trim().is_empty()
                    && clock
                        .strip_prefix(l)
                        .map(|rest| rest.is_empty())
                        .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect();
    }
    if starts.is_empty() && !lines.is_empty() {
        starts.push(0);
    }

    let mut result = Vec::new();
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(lines.len());
        let block = &lines[start..end];
        let timestamp = snapshot_stamp(block[0], clock);
        result.push(parse_snapshot(timestamp, block));
    }
    result
}

fn snapshot_stamp(first_line: &str, clock: &mut Clock) -> String {
    let head = first_line.trim_start();
    let head = head.strip_prefix("top -").unwrap_or(head).trim_start();
    match clock.recognize(head) {
        Some((stamp, _)) => stamp,
        None => clock.synthesize(),
    }
}

fn parse_snapshot(timestamp: String, lines: &[&str]) -> Snapshot {
    let mut system = SystemSummary::default();
    let mut processes = Vec::new();
    let mut columns: Option<Vec<String>> = None;

    for line in lines {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        if let Some(loads) = t.split("load average:").nth(1) {
            let mut parts = loads.split(',').map(|p| parse_value(p.trim()));
            system.load_1m = parts.next().flatten();
            system.load_5m = parts.next().flatten();
            system.load_15m = parts.next().flatten();
            continue;
        }
        if let Some(rest) = t.strip_prefix("%Cpu(s):").or_else(|| t.strip_prefix("Cpu(s):")) {
            parse_cpu_breakdown(rest, &mut system);
            continue;
        }
        if t.contains("Mem") && t.contains(':') && !t.contains("Swap") {
            parse_mem_line(t, &mut system.mem_total, &mut system.mem_free, &mut system.mem_used);
            continue;
        }
        if t.contains("Swap") && t.contains(':') {
            let mut free = None;
            parse_mem_line(t, &mut system.swap_total, &mut free, &mut system.swap_used);
            continue;
        }
        if t.contains("PID") && t.contains("COMMAND") {
            columns = Some(t.split_whitespace().map(str::to_string).collect());
            continue;
        }
        if let Some(columns) = &columns {
            match parse_process_row(t, columns) {
                Some(row) => processes.push(row),
                None => tracing::warn!("Skipping malformed process row: {:?}", t),
            }
        }
    }

    Snapshot {
        timestamp,
        system,
        processes,
    }
}

/// "10.0 us,  5.0 sy,  0.0 ni, 83.0 id,  2.0 wa, ..."
fn parse_cpu_breakdown(rest: &str, system: &mut SystemSummary) {
    for segment in rest.split(',') {
        let mut parts = segment.split_whitespace();
        let value = parts.next().and_then(parse_value);
        let tag = parts.next().unwrap_or("");
        let slot = match tag {
            "us" => &mut system.cpu_user,
            "sy" => &mut system.cpu_system,
            "ni" => &mut system.cpu_nice,
            "id" => &mut system.cpu_idle,
            "wa" => &mut system.cpu_iowait,
            _ => continue,
        };
        *slot = value;
    }
}

/// "KiB Mem : 16393188 total,  8144 free,  90360 used, ..." and the older
/// "Mem: 16393188k total, ..." spelling.
fn parse_mem_line(
    line: &str,
    total: &mut Option<f64>,
    free: &mut Option<f64>,
    used: &mut Option<f64>,
) {
    let rest = match line.split_once(':') {
        Some((_, rest)) => rest,
        None => return,
    };
    for segment in rest.split(',') {
        let mut parts = segment.split_whitespace();
        let value = parts.next().and_then(parse_kib);
        match parts.next().unwrap_or("") {
            "total" => *total = value,
            "free" => *free = value,
            "used" => *used = value,
            _ => {}
        }
    }
}

/// Memory figure in KiB; accepts the k/m/g/t suffixes top appends.
fn parse_kib(token: &str) -> Option<f64> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }
    let (number, factor) = match t.as_bytes()[t.len() - 1].to_ascii_lowercase() {
        b'k' => (&t[..t.len() - 1], 1.0),
        b'm' => (&t[..t.len() - 1], 1024.0),
        b'g' => (&t[..t.len() - 1], 1024.0 * 1024.0),
        b't' => (&t[..t.len() - 1], 1024.0 * 1024.0 * 1024.0),
        _ => (t, 1.0),
    };
    parse_value(number).map(|v| v * factor)
}

fn parse_process_row(line: &str, columns: &[String]) -> Option<ProcessRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < columns.len() {
        return None;
    }
    let col = |name: &str| columns.iter().position(|c| c == name);
    let get = |name: &str| col(name).and_then(|i| tokens.get(i)).copied();

    let pid: u64 = get("PID")?.parse().ok()?;
    let command_at = col("COMMAND")?;
    let command = tokens.get(command_at..)?.join(" ");

    Some(ProcessRow {
        pid,
        user: get("USER").unwrap_or("").to_string(),
        priority: get("PR").unwrap_or("").to_string(),
        nice: get("NI").unwrap_or("").to_string(),
        virt: get("VIRT").and_then(parse_kib),
        res: get("RES").and_then(parse_kib),
        shr: get("SHR").and_then(parse_kib),
        status: get("S").unwrap_or("").to_string(),
        cpu_pct: get("%CPU").and_then(parse_value).unwrap_or(f64::NAN),
        mem_pct: get("%MEM").and_then(parse_value).unwrap_or(f64::NAN),
        time: get("TIME+").unwrap_or("").to_string(),
        command,
    })
}

/// Fold snapshots into per-process CPU/MEM series plus the system-wide
/// CPU breakdown.
pub(crate) fn extract(text: &str, builder: &mut SeriesBuilder, clock: &mut Clock) {
    for snapshot in snapshots(text, clock) {
        let index = builder.touch(snapshot.timestamp.clone());
        if let Some(v) = snapshot.system.cpu_user {
            builder.set("%user", index, v);
        }
        if let Some(v) = snapshot.system.cpu_system {
            builder.set("%system", index, v);
        }
        if let Some(v) = snapshot.system.cpu_idle {
            builder.set("%idle", index, v);
        }
        for process in &snapshot.processes {
            let label = process.label();
            builder.set(&format!("CPU | {}", label), index, process.cpu_pct);
            builder.set(&format!("MEM | {}", label), index, process.mem_pct);
            builder.note_process(&label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Family;
    use crate::options::ParseOptions;
    use chrono::NaiveDate;

    fn options() -> ParseOptions {
        ParseOptions::default().with_reference_date(NaiveDate::from_ymd_opt(2023, 4, 5).unwrap())
    }

    fn parse(doc: &str) -> crate::Bundle {
        crate::parse_with(doc, Family::ProcessSnapshot, &options())
    }

    const DOC: &str = "\
top - 10:00:00 up 5 days,  3:02,  1 user,  load average: 0.52, 0.44, 0.38
Tasks: 201 total,   1 running, 200 sleeping,   0 stopped,   0 zombie
%Cpu(s): 10.0 us,  5.0 sy,  0.0 ni, 83.0 id,  2.0 wa,  0.0 hi,  0.0 si,  0.0 st
KiB Mem : 16393188 total,  8144000 free,  6090360 used,  2158828 buff/cache
KiB Swap:  2097148 total,  2097148 free,        0 used.  9539392 avail Mem

  PID USER      PR  NI    VIRT    RES    SHR S  %CPU %MEM     TIME+ COMMAND
 1234 cassandra 20   0   10.5g   4.2g  12345 S  50.0 25.0 100:00.00 java -Xmx4g
 5678 root      20   0  115680   2112   1024 S   0.3  0.1   0:01.20 sshd

top - 10:00:05 up 5 days,  3:02,  1 user,  load average: 0.60, 0.46, 0.39
%Cpu(s): 12.0 us,  6.0 sy,  0.0 ni, 80.0 id,  2.0 wa,  0.0 hi,  0.0 si,  0.0 st

  PID USER      PR  NI    VIRT    RES    SHR S  %CPU %MEM     TIME+ COMMAND
 1234 cassandra 20   0   10.5g   4.2g  12345 S  55.0 25.1 100:02.50 java -Xmx4g
";

    #[test]
    fn test_banner_segmentation_and_stamps() {
        let mut clock = Clock::new(&options());
        let snaps = snapshots(DOC, &mut clock);
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].timestamp, "2023-04-05T10:00:00");
        assert_eq!(snaps[1].timestamp, "2023-04-05T10:00:05");
    }

    #[test]
    fn test_system_summary() {
        let mut clock = Clock::new(&options());
        let snaps = snapshots(DOC, &mut clock);
        let system = &snaps[0].system;
        assert_eq!(system.load_1m, Some(0.52));
        assert_eq!(system.cpu_user, Some(10.0));
        assert_eq!(system.cpu_iowait, Some(2.0));
        assert_eq!(system.mem_total, Some(16393188.0));
        assert_eq!(system.mem_free, Some(8144000.0));
        assert_eq!(system.swap_total, Some(2097148.0));
    }

    #[test]
    fn test_process_rows() {
        let mut clock = Clock::new(&options());
        let snaps = snapshots(DOC, &mut clock);
        let java = &snaps[0].processes[0];
        assert_eq!(java.pid, 1234);
        assert_eq!(java.command, "java -Xmx4g");
        assert_eq!(java.cpu_pct, 50.0);
        assert_eq!(java.virt, Some(10.5 * 1024.0 * 1024.0));
        assert_eq!(snaps[0].processes[1].command, "sshd");
    }

    #[test]
    fn test_folded_series() {
        let bundle = parse(DOC);
        assert_eq!(bundle.timestamps.len(), 2);
        assert_eq!(bundle.get("CPU | java -Xmx4g (1234)"), Some(&[50.0, 55.0][..]));
        assert_eq!(bundle.value("MEM | java -Xmx4g (1234)", 1), Some(25.1));
        assert_eq!(bundle.get("%user"), Some(&[10.0, 12.0][..]));
        // sshd only appears in the first snapshot.
        let sshd = bundle.get("CPU | sshd (5678)").unwrap();
        assert_eq!(sshd[0], 0.3);
        assert!(sshd[1].is_nan());
    }

    #[test]
    fn test_timestamp_line_segmentation() {
        let doc = "\
2023-04-05T10:00:00
%Cpu(s): 10.0 us,  5.0 sy,  0.0 ni, 83.0 id
2023-04-05T10:00:05
%Cpu(s): 11.0 us,  5.0 sy,  0.0 ni, 82.0 id
";
        let bundle = parse(doc);
        assert_eq!(
            bundle.timestamps,
            vec!["2023-04-05T10:00:00", "2023-04-05T10:00:05"]
        );
        assert_eq!(bundle.get("%user"), Some(&[10.0, 11.0][..]));
    }

    #[test]
    fn test_whole_document_fallback() {
        let doc = "\
%Cpu(s): 10.0 us,  5.0 sy,  0.0 ni, 83.0 id
  PID USER      PR  NI    VIRT    RES    SHR S  %CPU %MEM     TIME+ COMMAND
 1234 root      20   0  115680   2112   1024 S   1.5  0.1   0:01.20 bash
";
        let bundle = parse(doc);
        assert_eq!(bundle.timestamps.len(), 1);
        // Synthesized stamp: midnight of the reference date.
        assert_eq!(bundle.timestamps[0], "2023-04-05T00:00:00");
        assert_eq!(bundle.value("CPU | bash (1234)", 0), Some(1.5));
        assert_eq!(bundle.metadata.processes, vec!["bash (1234)"]);
    }
}
