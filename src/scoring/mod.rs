pub mod config;
pub mod engine;
pub mod factors;
pub mod validation;

pub use config::*;
pub use engine::{
    calculate_score, sort_ranked, Criterion, FactorContribution, ScoreResult, ScoredSchedule,
    Scorer, Weights,
};
pub use factors::{EndCurve, GapCurve, StartCurve, TimeWindow};
pub use validation::validate_scoring;
