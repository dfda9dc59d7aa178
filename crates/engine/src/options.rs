//! Parse options, loaded from environment variables or a TOML file.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::OptionsError;

/// Tuning knobs for a parse call.
///
/// Everything has a working default; callers that need reproducible output
/// (tests, multi-pass tooling) pin `reference_date` and `fallback_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Date combined with bare `HH:MM:SS` timestamps, which carry no date
    /// of their own. Defaults to the current UTC date at parse time.
    pub reference_date: Option<NaiveDate>,

    /// Base instant for synthesized timestamps (unparseable stamps, empty
    /// documents). Defaults to midnight of the reference date.
    pub fallback_start: Option<NaiveDateTime>,

    /// Seconds between consecutive synthesized timestamps.
    pub fallback_step_secs: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            reference_date: None,
            fallback_start: None,
            fallback_step_secs: 1,
        }
    }
}

impl ParseOptions {
    /// Load options from file or environment variables.
    /// Priority: Environment Variables > Options File > Defaults
    pub fn load() -> Self {
        let path = std::env::var("DIAGSERIES_OPTIONS_FILE")
            .unwrap_or_else(|_| "diagseries.toml".to_string());

        let mut options = if Path::new(&path).exists() {
            match Self::from_file(&path) {
                Ok(options) => options,
                Err(err) => {
                    tracing::warn!("Ignoring options file {}: {}", path, err);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if let Some(date) = env_date("DIAGSERIES_REFERENCE_DATE") {
            options.reference_date = Some(date);
        }
        if let Ok(step) = std::env::var("DIAGSERIES_FALLBACK_STEP_SECS") {
            if let Ok(step) = step.parse() {
                options.fallback_step_secs = step;
            }
        }

        options
    }

    /// Load options from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, OptionsError> {
        let contents = std::fs::read_to_string(path)?;
        let options: ParseOptions = toml::from_str(&contents)?;
        Ok(options)
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn with_fallback_start(mut self, start: NaiveDateTime) -> Self {
        self.fallback_start = Some(start);
        self
    }
}

fn env_date(key: &str) -> Option<NaiveDate> {
    std::env::var(key)
        .ok()
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}
