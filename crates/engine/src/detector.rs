//! Family detection over the file name plus a bounded sample of lines.
//!
//! One detector per family; the orchestrator runs all of them and keeps
//! the best-scoring result. File-name keywords score higher than content
//! signatures because operators name dumps after the tool that produced
//! them; content signatures cover renamed or concatenated captures.

use crate::model::{Detection, Family};

pub trait FamilyDetector: Send + Sync {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection;
    fn family(&self) -> Family;
}

/// Runs every family detector and keeps the best-scoring result.
pub struct DetectorOrchestrator {
    detectors: Vec<Box<dyn FamilyDetector>>,
}

impl DetectorOrchestrator {
    pub fn new() -> Self {
        let detectors: Vec<Box<dyn FamilyDetector>> = vec![
            // Order matters! More specific detectors first
            Box::new(TableHistogramDetector),
            Box::new(ProxyHistogramDetector),
            Box::new(ThreadPoolDetector),
            Box::new(IoStatDetector),
            Box::new(CpuStatDetector),
            Box::new(ProcessSnapshotDetector),
        ];

        Self { detectors }
    }

    pub fn detect(&self, file_name: &str, text: &str) -> Detection {
        let file_name = file_name.to_ascii_lowercase();
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(crate::DETECTION_SAMPLE_LINES)
            .collect();

        let mut best = Detection::no_match();
        for detector in &self.detectors {
            let result = detector.detect(&file_name, &lines);
            if result.confidence > best.confidence {
                best = result;
                if best.is_high_confidence() {
                    break;
                }
            }
        }
        best
    }
}

impl Default for DetectorOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the dump family from a file name and its content.
pub fn detect(file_name: &str, text: &str) -> Detection {
    DetectorOrchestrator::new().detect(file_name, text)
}

struct ThreadPoolDetector;

impl FamilyDetector for ThreadPoolDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        if file_name.contains("tpstats") {
            return Detection::new(self.family(), 0.95);
        }
        for line in lines {
            if line.contains("Pool Name") && line.contains("Active") && line.contains("Pending") {
                return Detection::new(self.family(), 0.9);
            }
            if line.starts_with("Message type") && line.contains("Dropped") {
                return Detection::new(self.family(), 0.7);
            }
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::ThreadPool
    }
}

struct IoStatDetector;

impl FamilyDetector for IoStatDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        if file_name.contains("iostat") {
            return Detection::new(self.family(), 0.95);
        }
        for line in lines {
            if line.contains("avg-cpu:") {
                return Detection::new(self.family(), 0.9);
            }
            if line.trim_start().starts_with("Device") && line.contains("r/s") {
                return Detection::new(self.family(), 0.75);
            }
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::IoStat
    }
}

struct CpuStatDetector;

impl FamilyDetector for CpuStatDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        if file_name.contains("mpstat") {
            return Detection::new(self.family(), 0.95);
        }
        // mpstat headers spell "%usr"; iostat's avg-cpu spells "%user".
        for line in lines {
            if line.contains("CPU") && line.contains("%usr") {
                return Detection::new(self.family(), 0.85);
            }
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::CpuStat
    }
}

struct ProxyHistogramDetector;

impl FamilyDetector for ProxyHistogramDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        if file_name.contains("proxyhistograms") {
            return Detection::new(self.family(), 0.95);
        }
        for line in lines {
            if line.trim_start().starts_with("Percentile")
                && line.contains("Read Latency")
                && !line.contains("SSTables")
            {
                return Detection::new(self.family(), 0.85);
            }
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::ProxyHistogram
    }
}

struct TableHistogramDetector;

impl FamilyDetector for TableHistogramDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        if file_name.contains("tablehistograms") || file_name.contains("cfhistograms") {
            return Detection::new(self.family(), 0.95);
        }
        for line in lines {
            if line.trim_start().starts_with("Percentile") && line.contains("SSTables") {
                return Detection::new(self.family(), 0.9);
            }
            if line.trim_end().ends_with(" histograms") {
                return Detection::new(self.family(), 0.85);
            }
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::TableHistogram
    }
}

struct ProcessSnapshotDetector;

impl FamilyDetector for ProcessSnapshotDetector {
    fn detect(&self, file_name: &str, lines: &[&str]) -> Detection {
        for line in lines {
            if line.trim_start().starts_with("top -") {
                return Detection::new(self.family(), 0.95);
            }
            if line.trim_start().starts_with("%Cpu(s)") {
                return Detection::new(self.family(), 0.9);
            }
        }
        // "top" is too short a word to trust on its own.
        if file_name.contains("top") {
            return Detection::new(self.family(), 0.6);
        }
        Detection::no_match()
    }

    fn family(&self) -> Family {
        Family::ProcessSnapshot
    }
}
