use crate::schedule::SearchLimits;
use crate::scoring::{validate_scoring, ScoringConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MIN_SIZE: usize = 2;
pub const DEFAULT_MAX_SIZE: usize = 4;
pub const DEFAULT_MAX_INPUT_COURSES: usize = 13;
pub const DEFAULT_MAX_SCHEDULES: usize = 20_000;
pub const DEFAULT_MAX_DISPLAY: usize = 2_000;
pub const DEFAULT_DEADLINE: &str = "5s";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one `<term>.json` course table per term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Term used when the command line names none, e.g. "202540"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,

    #[serde(default = "default_min_size")]
    pub min_size: usize,

    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Requests naming more courses than this are refused with a warning
    #[serde(default = "default_max_input_courses")]
    pub max_input_courses: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
}

fn default_min_size() -> usize {
    DEFAULT_MIN_SIZE
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_max_input_courses() -> usize {
    DEFAULT_MAX_INPUT_COURSES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            term: None,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            max_input_courses: DEFAULT_MAX_INPUT_COURSES,
            limits: None,
            scoring: None,
        }
    }
}

/// Caps on enumeration work and on how many ranked schedules are returned.
///
/// `max_schedules: 0` or `deadline: "0s"` turns that limit off.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(default)]
    pub max_schedules: Option<usize>,
    #[serde(default)]
    pub max_display: Option<usize>,
    /// humantime duration, e.g. "5s" or "1m 30s"
    #[serde(default)]
    pub deadline: Option<String>,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(super::default_data_dir)
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn max_display(&self) -> usize {
        self.limits
            .as_ref()
            .and_then(|l| l.max_display)
            .unwrap_or(DEFAULT_MAX_DISPLAY)
    }

    pub fn search_limits(&self) -> Result<SearchLimits> {
        let limits = self.limits.clone().unwrap_or_default();

        let mut search = SearchLimits::unbounded();
        match limits.max_schedules.unwrap_or(DEFAULT_MAX_SCHEDULES) {
            0 => {}
            n => search = search.with_max_schedules(n),
        }

        let deadline = limits.deadline.as_deref().unwrap_or(DEFAULT_DEADLINE);
        let deadline = humantime::parse_duration(deadline.trim())
            .with_context(|| format!("limits.deadline: invalid duration '{}'", deadline))?;
        if !deadline.is_zero() {
            search = search.with_deadline(deadline);
        }

        Ok(search)
    }

    /// Validate the whole file, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.min_size == 0 {
            errors.push("min_size: must be at least 1".to_string());
        }
        if self.max_size == 0 {
            errors.push("max_size: must be at least 1".to_string());
        }
        if self.max_input_courses == 0 {
            errors.push("max_input_courses: must be at least 1".to_string());
        }
        if let Some(0) = self.limits.as_ref().and_then(|l| l.max_display) {
            errors.push("limits.max_display: must be at least 1".to_string());
        }
        if let Err(e) = self.search_limits() {
            errors.push(format!("{:#}", e));
        }
        if let Some(ref scoring) = self.scoring {
            if let Err(scoring_errors) = validate_scoring(scoring) {
                errors.extend(scoring_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
