use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One recognized diagnostic dump format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Thread-pool statistics (pools, message types, meters)
    ThreadPool,
    /// CPU + per-device I/O utilization
    IoStat,
    /// Per-CPU utilization rows
    CpuStat,
    /// Client-request latency percentiles
    ProxyHistogram,
    /// Per-table storage/latency percentiles
    TableHistogram,
    /// top-like process captures
    ProcessSnapshot,
    /// Undetected format
    Unknown,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::ThreadPool => "thread_pool",
            Family::IoStat => "io_stat",
            Family::CpuStat => "cpu_stat",
            Family::ProxyHistogram => "proxy_histogram",
            Family::TableHistogram => "table_histogram",
            Family::ProcessSnapshot => "process_snapshot",
            Family::Unknown => "unknown",
        }
    }
}

/// Outcome of family detection over a document sample.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub family: Family,
    /// Confidence level (0.0 - 1.0)
    /// - 0.0-0.5: Low confidence (might be wrong)
    /// - 0.5-0.8: Medium confidence (likely correct)
    /// - 0.8-1.0: High confidence (very likely correct)
    pub confidence: f32,
}

impl Detection {
    pub fn new(family: Family, confidence: f32) -> Self {
        Self {
            family,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn no_match() -> Self {
        Self {
            family: Family::Unknown,
            confidence: 0.0,
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= crate::HIGH_CONFIDENCE_THRESHOLD
    }

    pub fn is_medium_confidence(&self) -> bool {
        self.confidence >= crate::MEDIUM_CONFIDENCE_THRESHOLD
    }
}

/// Errors from loading [`crate::ParseOptions`] out of a file.
///
/// The parse path itself never returns an error: malformed input degrades
/// to a sentinel Bundle instead.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Parse(#[from] toml::de::Error),
}
