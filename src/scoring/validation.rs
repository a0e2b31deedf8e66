use super::config::{
    CombineMode, ScoringConfig, DEFAULT_GAP_PER_TRANSITION, DEFAULT_GAP_TOLERANCE,
    DEFAULT_START_RAMP_DOWN, DEFAULT_START_RAMP_UP,
};
use super::factors::{parse_minutes, TimeWindow};

/// Longest idle allowance or tolerance accepted: one day
const MAX_GAP_MINUTES: u32 = 24 * 60;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Start curve: each ramp must parse, and the rise must finish before the fall
    let start = config.start.clone().unwrap_or_default();
    let ramp_up = check_window(
        "scoring.start.ramp_up",
        start.ramp_up.as_deref().unwrap_or(DEFAULT_START_RAMP_UP),
        &mut errors,
    );
    let ramp_down = check_window(
        "scoring.start.ramp_down",
        start.ramp_down.as_deref().unwrap_or(DEFAULT_START_RAMP_DOWN),
        &mut errors,
    );
    if let (Some(up), Some(down)) = (ramp_up, ramp_down) {
        if up.to > down.from {
            errors.push(
                "scoring.start: ramp_up must end at or before ramp_down starts".to_string(),
            );
        }
    }

    if let Some(ref end) = config.end {
        check_window("scoring.end", end, &mut errors);
    }

    let gap = config.gap.clone().unwrap_or_default();
    let per_transition = gap
        .per_transition
        .as_deref()
        .unwrap_or(DEFAULT_GAP_PER_TRANSITION);
    check_gap_minutes("scoring.gap.per_transition", per_transition, 0, &mut errors);
    let tolerance = gap.tolerance.as_deref().unwrap_or(DEFAULT_GAP_TOLERANCE);
    check_gap_minutes("scoring.gap.tolerance", tolerance, 1, &mut errors);

    let weights = config.weights.unwrap_or_default();
    for (name, value) in [
        ("gpa", weights.gpa),
        ("start", weights.start),
        ("end", weights.end),
        ("gap", weights.gap),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("scoring.weights.{}: must be non-negative", name));
        }
    }
    let total = weights.gpa + weights.start + weights.end + weights.gap;
    if !total.is_finite() {
        errors.push("scoring.weights: total weight must be a finite number".to_string());
    } else if config.combine == Some(CombineMode::Weighted) && total <= 0.0 {
        errors.push("scoring.weights: weighted mode needs a positive total weight".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Gap durations must parse and lie within `[min, MAX_GAP_MINUTES]`.
fn check_gap_minutes(field: &str, value: &str, min: u32, errors: &mut Vec<String>) {
    match parse_minutes(value) {
        Ok(minutes) if minutes < min => {
            errors.push(format!("{}: must be at least one minute", field))
        }
        Ok(minutes) if minutes > MAX_GAP_MINUTES => {
            errors.push(format!("{}: must be at most 24h", field))
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("{}: invalid '{}' - {:#}", field, value, e)),
    }
}

fn check_window(field: &str, value: &str, errors: &mut Vec<String>) -> Option<TimeWindow> {
    match TimeWindow::parse(value) {
        Ok(window) => Some(window),
        Err(e) => {
            errors.push(format!("{}: invalid '{}' - {}", field, value, e));
            None
        }
    }
}
