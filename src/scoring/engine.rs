use super::config::{
    CombineMode, CriterionWeights, ScoringConfig, DEFAULT_END_RAMP, DEFAULT_GAP_PER_TRANSITION,
    DEFAULT_GAP_TOLERANCE, DEFAULT_START_RAMP_DOWN, DEFAULT_START_RAMP_UP,
};
use super::factors::{
    clock_label, parse_minutes, round2, EndCurve, GapCurve, StartCurve, TimeWindow,
};
use super::validation::validate_scoring;
use crate::schedule::Schedule;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// GPA scale used to normalise historical averages
const GPA_SCALE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Gpa,
    Start,
    End,
    Gap,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Gpa,
        Criterion::Start,
        Criterion::End,
        Criterion::Gap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Gpa => "gpa",
            Criterion::Start => "start",
            Criterion::End => "end",
            Criterion::Gap => "gap",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Criterion::Gpa => "GPA",
            Criterion::Start => "Start",
            Criterion::End => "End",
            Criterion::Gap => "Gaps",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-criterion sub-scores, each in [0, 1] or `None` when not computable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Weights {
    pub gpa: Option<f64>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub gap: Option<f64>,
}

impl Weights {
    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        match criterion {
            Criterion::Gpa => self.gpa,
            Criterion::Start => self.start,
            Criterion::End => self.end,
            Criterion::Gap => self.gap,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, Option<f64>)> + '_ {
        Criterion::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    fn defined(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.iter().filter_map(|(c, v)| v.map(|v| (c, v)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub criterion: Criterion,
    pub value: Option<f64>,
    pub description: String, // e.g. "earliest start 08:00", "no GPA data"
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: Option<f64>,
    /// At least one sub-score could not be computed
    pub incomplete: bool,
    pub weights: Weights,
    #[serde(skip)]
    pub breakdown: Vec<FactorContribution>,
}

/// A schedule annotated with its score; the schedule itself is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSchedule {
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(flatten)]
    pub result: ScoreResult,
}

impl ScoredSchedule {
    pub fn score(&self) -> Option<f64> {
        self.result.score
    }
}

/// Scoring configuration resolved into curves, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer {
    combine: CombineMode,
    weights: CriterionWeights,
    start: StartCurve,
    end: EndCurve,
    gap: GapCurve,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            combine: CombineMode::Mean,
            weights: CriterionWeights::default(),
            start: StartCurve {
                ramp_up: TimeWindow::new(8 * 60, 10 * 60),
                ramp_down: TimeWindow::new(11 * 60, 13 * 60),
            },
            end: EndCurve {
                ramp: TimeWindow::new(14 * 60, 16 * 60),
            },
            gap: GapCurve {
                per_transition: 10,
                tolerance: 120,
            },
        }
    }
}

impl Scorer {
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        validate_scoring(config).map_err(|errors| anyhow!(errors.join("; ")))?;

        let start = config.start.clone().unwrap_or_default();
        let gap = config.gap.clone().unwrap_or_default();

        let ramp_up = start.ramp_up.as_deref().unwrap_or(DEFAULT_START_RAMP_UP);
        let ramp_down = start.ramp_down.as_deref().unwrap_or(DEFAULT_START_RAMP_DOWN);
        let end = config.end.as_deref().unwrap_or(DEFAULT_END_RAMP);
        let per_transition = gap
            .per_transition
            .as_deref()
            .unwrap_or(DEFAULT_GAP_PER_TRANSITION);
        let tolerance = gap.tolerance.as_deref().unwrap_or(DEFAULT_GAP_TOLERANCE);

        Ok(Self {
            combine: config.combine.unwrap_or_default(),
            weights: config.weights.unwrap_or_default(),
            start: StartCurve {
                ramp_up: TimeWindow::parse(ramp_up).context("scoring.start.ramp_up")?,
                ramp_down: TimeWindow::parse(ramp_down).context("scoring.start.ramp_down")?,
            },
            end: EndCurve {
                ramp: TimeWindow::parse(end).context("scoring.end")?,
            },
            gap: GapCurve {
                per_transition: parse_minutes(per_transition)
                    .context("scoring.gap.per_transition")?,
                tolerance: parse_minutes(tolerance).context("scoring.gap.tolerance")?,
            },
        })
    }

    pub fn combine_mode(&self) -> CombineMode {
        self.combine
    }

    /// Score one schedule. Never fails: missing data leaves that sub-score `None`.
    pub fn score(&self, schedule: &Schedule) -> ScoreResult {
        let mut breakdown = Vec::with_capacity(Criterion::ALL.len());

        let gpa = self.gpa_score(schedule, &mut breakdown);
        let start = self.start_score(schedule, &mut breakdown);
        let end = self.end_score(schedule, &mut breakdown);
        let gap = self.gap_score(schedule, &mut breakdown);

        let weights = Weights {
            gpa,
            start,
            end,
            gap,
        };
        let incomplete = weights.iter().any(|(_, v)| v.is_none());

        ScoreResult {
            score: self.combine(&weights),
            incomplete,
            weights,
            breakdown,
        }
    }

    /// Score every schedule in parallel. Output order matches input order.
    pub fn score_all(&self, schedules: Vec<Schedule>) -> Vec<ScoredSchedule> {
        schedules
            .into_par_iter()
            .map(|schedule| {
                let result = self.score(&schedule);
                ScoredSchedule { schedule, result }
            })
            .collect()
    }

    fn combine(&self, weights: &Weights) -> Option<f64> {
        match self.combine {
            CombineMode::Mean => {
                let (sum, count) = weights
                    .defined()
                    .fold((0.0, 0usize), |(sum, n), (_, v)| (sum + v, n + 1));
                (count > 0).then(|| sum / count as f64)
            }
            CombineMode::Weighted => {
                let (sum, total) = weights.defined().fold((0.0, 0.0), |(sum, total), (c, v)| {
                    let w = self.weight(c);
                    (sum + w * v, total + w)
                });
                (total > 0.0 && total.is_finite()).then(|| sum / total)
            }
        }
    }

    fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Gpa => self.weights.gpa,
            Criterion::Start => self.weights.start,
            Criterion::End => self.weights.end,
            Criterion::Gap => self.weights.gap,
        }
    }

    fn gpa_score(&self, schedule: &Schedule, out: &mut Vec<FactorContribution>) -> Option<f64> {
        let known: Vec<f64> = schedule.courses.iter().filter_map(|c| c.known_gpa()).collect();
        if known.is_empty() {
            out.push(FactorContribution {
                criterion: Criterion::Gpa,
                value: None,
                description: "no GPA data".to_string(),
            });
            return None;
        }

        let average = known.iter().sum::<f64>() / known.len() as f64;
        let value = round2((average / GPA_SCALE).clamp(0.0, 1.0));
        out.push(FactorContribution {
            criterion: Criterion::Gpa,
            value: Some(value),
            description: format!(
                "average {:.2} over {} of {} courses",
                average,
                known.len(),
                schedule.len()
            ),
        });
        Some(value)
    }

    fn start_score(&self, schedule: &Schedule, out: &mut Vec<FactorContribution>) -> Option<f64> {
        let (value, description) = match schedule.earliest_start() {
            Some(start) => (
                Some(round2(self.start.value(start))),
                format!("earliest start {}", clock_label(start)),
            ),
            None => (None, "no meeting times".to_string()),
        };
        out.push(FactorContribution {
            criterion: Criterion::Start,
            value,
            description,
        });
        value
    }

    fn end_score(&self, schedule: &Schedule, out: &mut Vec<FactorContribution>) -> Option<f64> {
        let (value, description) = match schedule.latest_end() {
            Some(end) => (
                Some(round2(self.end.value(end))),
                format!("latest end {}", clock_label(end)),
            ),
            None => (None, "no meeting times".to_string()),
        };
        out.push(FactorContribution {
            criterion: Criterion::End,
            value,
            description,
        });
        value
    }

    fn gap_score(&self, schedule: &Schedule, out: &mut Vec<FactorContribution>) -> Option<f64> {
        let (Some(start), Some(end)) = (schedule.earliest_start(), schedule.latest_end()) else {
            out.push(FactorContribution {
                criterion: Criterion::Gap,
                value: None,
                description: "no meeting times".to_string(),
            });
            return None;
        };

        let timed = schedule
            .courses
            .iter()
            .filter(|c| c.main_block().is_some())
            .count() as u32;
        let transitions = timed.saturating_sub(1);
        let span = u32::from(end.saturating_sub(start));
        // Sections on different days can share a clock window, so the sum
        // of lengths may exceed the span
        let idle = span.saturating_sub(schedule.class_minutes());

        let value = round2(self.gap.value(idle, transitions));
        out.push(FactorContribution {
            criterion: Criterion::Gap,
            value: Some(value),
            description: format!(
                "{} idle minutes, {} allowed",
                idle,
                self.gap.allowance(transitions)
            ),
        });
        Some(value)
    }
}

/// Score with a raw config; an invalid config falls back to the default curves.
pub fn calculate_score(schedule: &Schedule, config: &ScoringConfig) -> ScoreResult {
    Scorer::from_config(config)
        .unwrap_or_default()
        .score(schedule)
}

/// Rank highest score first. Undefined scores go last; ties keep input order.
pub fn sort_ranked(scored: &mut [ScoredSchedule]) {
    scored.sort_by(|a, b| compare_scores(a.score(), b.score()));
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{Course, MeetingDays};
    use proptest::prelude::*;

    fn course(subject: &str, crn: u32, days: &str, start: u16, end: u16) -> Course {
        Course::new(subject, crn, days.parse().unwrap(), start, end)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ranked(crn: u32, score: Option<f64>) -> ScoredSchedule {
        ScoredSchedule {
            schedule: Schedule::new(vec![course("CSCI 301", crn, "M", 900, 950)]),
            result: ScoreResult {
                score,
                incomplete: score.is_none(),
                weights: Weights::default(),
                breakdown: vec![],
            },
        }
    }

    #[test]
    fn test_morning_block_with_gpa() {
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MWF", 800, 1000).with_gpa(3.5)]);
        let result = Scorer::default().score(&schedule);

        assert_eq!(result.weights.start, Some(0.0));
        assert_eq!(result.weights.gpa, Some(0.88));
        assert_eq!(result.weights.gap, Some(1.0));
        assert_eq!(result.weights.end, Some(1.0));
        assert!(approx(result.score.unwrap(), 0.72));
        assert!(!result.incomplete);
        assert_eq!(result.breakdown.len(), 4);
    }

    #[test]
    fn test_weighted_combination() {
        let config = ScoringConfig {
            combine: Some(CombineMode::Weighted),
            ..ScoringConfig::default()
        };
        let scorer = Scorer::from_config(&config).unwrap();
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MWF", 800, 1000).with_gpa(3.5)]);
        let result = scorer.score(&schedule);
        // (5 * 0.88 + 2 * 0.0 + 2 * 1.0 + 1 * 1.0) / 10
        assert!(approx(result.score.unwrap(), 0.74));
    }

    #[test]
    fn test_weighted_skips_undefined_criteria() {
        let config = ScoringConfig {
            combine: Some(CombineMode::Weighted),
            ..ScoringConfig::default()
        };
        let scorer = Scorer::from_config(&config).unwrap();
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MWF", 1000, 1050)]);
        let result = scorer.score(&schedule);
        // No GPA: only start, end and gap count, each at 1.0
        assert_eq!(result.weights.gpa, None);
        assert!(approx(result.score.unwrap(), 1.0));
        assert!(result.incomplete);
    }

    #[test]
    fn test_missing_gpa_is_undefined_not_zero() {
        let schedule = Schedule::new(vec![
            course("CSCI 301", 1, "MWF", 1000, 1050),
            course("MATH 204", 2, "TR", 1100, 1215),
        ]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.gpa, None);
        assert!(result.incomplete);
        let breakdown = &result.breakdown[0];
        assert_eq!(breakdown.criterion, Criterion::Gpa);
        assert_eq!(breakdown.description, "no GPA data");
    }

    #[test]
    fn test_gpa_averages_known_values_only() {
        let mut zero = course("PHYS 161", 3, "F", 1300, 1350);
        zero.gpa = Some(0.0);
        let schedule = Schedule::new(vec![
            course("CSCI 301", 1, "M", 1000, 1050).with_gpa(4.0),
            course("MATH 204", 2, "T", 1000, 1050).with_gpa(3.0),
            zero,
        ]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.gpa, Some(0.88));
        assert_eq!(
            result.breakdown[0].description,
            "average 3.50 over 2 of 3 courses"
        );
    }

    #[test]
    fn test_gpa_above_scale_is_clamped() {
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "M", 1000, 1050).with_gpa(4.3)]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.gpa, Some(1.0));
    }

    #[test]
    fn test_gap_score_with_idle_time() {
        // 09:00-10:00 and 12:00-13:00 on the same day: 120 idle, 10 allowed
        let schedule = Schedule::new(vec![
            course("CSCI 301", 1, "MW", 900, 1000),
            course("MATH 204", 2, "MW", 1200, 1300),
        ]);
        let result = Scorer::default().score(&schedule);
        // 1 - 110 / 120
        assert_eq!(result.weights.gap, Some(0.08));
        assert_eq!(result.breakdown[3].description, "120 idle minutes, 10 allowed");
    }

    #[test]
    fn test_gap_score_different_days_same_window() {
        let schedule = Schedule::new(vec![
            course("CSCI 301", 1, "MW", 1000, 1100),
            course("MATH 204", 2, "TR", 1000, 1100),
        ]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.gap, Some(1.0));
    }

    #[test]
    fn test_late_schedule() {
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "TR", 1500, 1620)]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.start, Some(0.0));
        assert_eq!(result.weights.end, Some(0.0));
        assert_eq!(result.weights.gap, Some(1.0));
        assert!(approx(result.score.unwrap(), 1.0 / 3.0));
    }

    #[test]
    fn test_empty_schedule_has_no_score() {
        let result = Scorer::default().score(&Schedule::new(vec![]));
        assert_eq!(result.score, None);
        assert!(result.incomplete);
        assert!(result.weights.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_unscheduled_course_has_no_time_scores() {
        let schedule = Schedule::new(vec![
            Course::new("CSCI 390", 1, MeetingDays::Tbd, 0, 0).with_gpa(3.0),
        ]);
        let result = Scorer::default().score(&schedule);
        assert_eq!(result.weights.start, None);
        assert_eq!(result.weights.end, None);
        assert_eq!(result.weights.gap, None);
        assert_eq!(result.score, Some(0.75));
    }

    #[test]
    fn test_custom_curves() {
        let config = ScoringConfig {
            start: Some(crate::scoring::StartConfig {
                ramp_up: Some("07:00-08:00".to_string()),
                ramp_down: Some("12:00-14:00".to_string()),
            }),
            end: Some("1700-1800".to_string()),
            ..ScoringConfig::default()
        };
        let scorer = Scorer::from_config(&config).unwrap();
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "M", 800, 1730)]);
        let result = scorer.score(&schedule);
        assert_eq!(result.weights.start, Some(1.0));
        assert_eq!(result.weights.end, Some(0.5));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = ScoringConfig {
            end: Some("later".to_string()),
            ..ScoringConfig::default()
        };
        let err = Scorer::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("scoring.end"));
    }

    #[test]
    fn test_from_config_rejects_oversized_gap_allowance() {
        let config = ScoringConfig {
            gap: Some(crate::scoring::GapConfig {
                per_transition: Some("7000y".to_string()),
                tolerance: None,
            }),
            ..ScoringConfig::default()
        };
        let err = Scorer::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("scoring.gap.per_transition"));

        // The default scorer is used instead and three courses still score
        let schedule = Schedule::new(vec![
            course("CSCI 301", 1, "MW", 900, 950),
            course("MATH 204", 2, "MW", 1000, 1050),
            course("PHYS 161", 3, "MW", 1100, 1150),
        ]);
        let result = calculate_score(&schedule, &config);
        assert_eq!(result.weights.gap, Some(1.0));
    }

    #[test]
    fn test_weighted_score_stays_finite_with_huge_weights() {
        let scorer = Scorer {
            combine: CombineMode::Weighted,
            weights: CriterionWeights {
                gpa: 1e308,
                start: 1e308,
                end: 1e308,
                gap: 1e308,
            },
            ..Scorer::default()
        };
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MW", 1000, 1050)]);
        assert_eq!(scorer.score(&schedule).score, None);
    }

    #[test]
    fn test_calculate_score_falls_back_to_defaults() {
        let config = ScoringConfig {
            end: Some("later".to_string()),
            ..ScoringConfig::default()
        };
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MWF", 800, 1000).with_gpa(3.5)]);
        let result = calculate_score(&schedule, &config);
        assert!(approx(result.score.unwrap(), 0.72));
    }

    #[test]
    fn test_sort_ranked_descending_with_undefined_last() {
        let mut list = vec![
            ranked(1, Some(0.5)),
            ranked(2, None),
            ranked(3, Some(0.9)),
            ranked(4, Some(0.5)),
        ];
        sort_ranked(&mut list);
        let order: Vec<u32> = list.iter().map(|s| s.schedule.courses[0].crn).collect();
        assert_eq!(order, vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_score_all_preserves_order() {
        let schedules: Vec<Schedule> = (1..=50)
            .map(|crn| Schedule::new(vec![course("CSCI 301", crn, "M", 900, 950)]))
            .collect();
        let scored = Scorer::default().score_all(schedules);
        let crns: Vec<u32> = scored.iter().map(|s| s.schedule.courses[0].crn).collect();
        assert_eq!(crns, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_scored_schedule_json_shape() {
        let schedule = Schedule::new(vec![course("CSCI 301", 1, "MWF", 800, 1000).with_gpa(3.5)]);
        let result = Scorer::default().score(&schedule);
        let json = serde_json::to_value(ScoredSchedule { schedule, result }).unwrap();
        assert!(json["courses"].is_array());
        assert_eq!(json["weights"]["gpa"], 0.88);
        assert_eq!(json["incomplete"], false);
        assert!(json.get("breakdown").is_none());
    }

    proptest! {
        #[test]
        fn prop_sub_scores_in_unit_range(
            blocks in prop::collection::vec(
                (0u16..22, 0u16..60, 10u16..120, prop::option::of(0.0f64..4.5)),
                1..5,
            )
        ) {
            let subjects = ["CSCI 301", "MATH 204", "PHYS 161", "CHEM 121", "BIOL 101"];
            let courses: Vec<Course> = blocks
                .iter()
                .enumerate()
                .map(|(i, &(h, m, len, gpa))| {
                    let start = h * 100 + m;
                    let end_minutes = (h * 60 + m + len).min(23 * 60 + 59);
                    let end = (end_minutes / 60) * 100 + end_minutes % 60;
                    let mut c = course(subjects[i], i as u32, "MWF", start, end);
                    c.gpa = gpa;
                    c
                })
                .collect();
            let result = Scorer::default().score(&Schedule::new(courses));
            for (_, value) in result.weights.iter() {
                if let Some(v) = value {
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
            let defined: Vec<f64> = result.weights.iter().filter_map(|(_, v)| v).collect();
            let mean = defined.iter().sum::<f64>() / defined.len() as f64;
            prop_assert!((result.score.unwrap() - mean).abs() < 1e-9);
        }
    }
}
