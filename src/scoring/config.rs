use serde::{Deserialize, Serialize};

/// How sub-scores are folded into one ranking score.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Unweighted mean of the sub-scores that could be computed
    #[default]
    Mean,
    /// Weighted mean using `weights`, over the computable sub-scores only
    Weighted,
}

/// Main scoring configuration.
///
/// Every field is optional; anything left out falls back to the defaults
/// below, which score a schedule on GPA, start time, end time and gaps.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   combine: weighted
///   weights: { gpa: 5, start: 2, end: 2, gap: 1 }
///   start:
///     ramp_up: "08:00-10:00"
///     ramp_down: "11:00-13:00"
///   end: "14:00-16:00"
///   gap:
///     per_transition: "10m"
///     tolerance: "2h"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub combine: Option<CombineMode>,

    /// Per-criterion weights, only used when `combine: weighted`
    #[serde(default)]
    pub weights: Option<CriterionWeights>,

    /// Start-of-day preference curve
    #[serde(default)]
    pub start: Option<StartConfig>,

    /// End-of-day window: full score at or before its start, zero after its end.
    /// Format: "HH:MM-HH:MM"
    #[serde(default)]
    pub end: Option<String>,

    /// Idle-time allowance between classes
    #[serde(default)]
    pub gap: Option<GapConfig>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            combine: Some(CombineMode::Mean),
            weights: Some(CriterionWeights::default()),
            start: Some(StartConfig::default()),
            end: Some(DEFAULT_END_RAMP.to_string()),
            gap: Some(GapConfig::default()),
        }
    }
}

pub const DEFAULT_START_RAMP_UP: &str = "08:00-10:00";
pub const DEFAULT_START_RAMP_DOWN: &str = "11:00-13:00";
pub const DEFAULT_END_RAMP: &str = "14:00-16:00";
pub const DEFAULT_GAP_PER_TRANSITION: &str = "10m";
pub const DEFAULT_GAP_TOLERANCE: &str = "2h";

/// Relative importance of each criterion in weighted mode.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CriterionWeights {
    #[serde(default = "default_gpa_weight")]
    pub gpa: f64,
    #[serde(default = "default_start_weight")]
    pub start: f64,
    #[serde(default = "default_end_weight")]
    pub end: f64,
    #[serde(default = "default_gap_weight")]
    pub gap: f64,
}

fn default_gpa_weight() -> f64 {
    5.0
}

fn default_start_weight() -> f64 {
    2.0
}

fn default_end_weight() -> f64 {
    2.0
}

fn default_gap_weight() -> f64 {
    1.0
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            gpa: default_gpa_weight(),
            start: default_start_weight(),
            end: default_end_weight(),
            gap: default_gap_weight(),
        }
    }
}

/// Start-time curve: rises from 0 to 1 across `ramp_up`, stays at 1 until
/// `ramp_down` begins, then falls back to 0.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StartConfig {
    #[serde(default)]
    pub ramp_up: Option<String>,
    #[serde(default)]
    pub ramp_down: Option<String>,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            ramp_up: Some(DEFAULT_START_RAMP_UP.to_string()),
            ramp_down: Some(DEFAULT_START_RAMP_DOWN.to_string()),
        }
    }
}

/// Gap allowance. Durations use humantime syntax ("10m", "1h 30m").
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GapConfig {
    /// Idle time per class-to-class transition that still scores 1
    #[serde(default)]
    pub per_transition: Option<String>,
    /// Extra idle time over the allowance at which the score reaches 0
    #[serde(default)]
    pub tolerance: Option<String>,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            per_transition: Some(DEFAULT_GAP_PER_TRANSITION.to_string()),
            tolerance: Some(DEFAULT_GAP_TOLERANCE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.combine, Some(CombineMode::Mean));
        assert_eq!(config.end, Some("14:00-16:00".to_string()));
        assert_eq!(config.weights.unwrap().gpa, 5.0);
        assert!(config.start.is_some());
        assert!(config.gap.is_some());
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
combine: weighted
end: "15:00-17:00"
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.combine, Some(CombineMode::Weighted));
        assert_eq!(config.end, Some("15:00-17:00".to_string()));
        assert!(config.weights.is_none());
        assert!(config.start.is_none());
        assert!(config.gap.is_none());
    }

    #[test]
    fn test_partial_weights_use_defaults() {
        let yaml = r#"
weights:
  gpa: 1
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let weights = config.weights.unwrap();
        assert_eq!(weights.gpa, 1.0);
        assert_eq!(weights.start, 2.0);
        assert_eq!(weights.gap, 1.0);
    }

    #[test]
    fn test_full_scoring_config_parse() {
        let yaml = r#"
combine: mean
start:
  ramp_up: "07:30-09:30"
  ramp_down: "12:00-14:00"
end: "1500-1700"
gap:
  per_transition: "15m"
  tolerance: "90m"
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let start = config.start.unwrap();
        assert_eq!(start.ramp_up, Some("07:30-09:30".to_string()));
        assert_eq!(start.ramp_down, Some("12:00-14:00".to_string()));
        let gap = config.gap.unwrap();
        assert_eq!(gap.per_transition, Some("15m".to_string()));
        assert_eq!(gap.tolerance, Some("90m".to_string()));
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.combine.is_none());
        assert!(config.weights.is_none());
        assert!(config.start.is_none());
        assert!(config.end.is_none());
        assert!(config.gap.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "base_score: 100\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }
}
