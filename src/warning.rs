use serde::Serialize;
use std::fmt;

/// A non-fatal problem reported alongside results.
///
/// Nothing here aborts a request; the caller gets whatever could still be
/// produced plus the list of warnings explaining what was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    TooManyCourses { limit: usize },
    InvalidCourseName { name: String },
    NotOffered { name: String },
    ForcedNotFound { subject: String },
    ForcedSectionNotFound { crn: u32 },
    ForcedSectionConflict { crn: u32 },
    InvalidBlockedTime { block: String },
    ForcedExceedsMax { forced: usize, max: usize },
    PoolTooSmall { pool: usize, min: usize },
    Unscheduled { crns: Vec<u32> },
    ScheduleCapReached { limit: usize },
    DeadlineReached { millis: u64 },
    NoSchedules,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TooManyCourses { limit } => {
                write!(f, "Cannot input more than {} courses", limit)
            }
            Warning::InvalidCourseName { name } => write!(f, "Invalid course name: {}", name),
            Warning::NotOffered { name } => write!(f, "{} is not offered this term", name),
            Warning::ForcedNotFound { subject } => {
                write!(f, "Could not force {} (no scheduleable section found)", subject)
            }
            Warning::ForcedSectionNotFound { crn } => {
                write!(f, "Could not force CRN {} (no scheduleable section found)", crn)
            }
            Warning::ForcedSectionConflict { crn } => write!(
                f,
                "CRN {} conflicts with a blocked time or another forced section",
                crn
            ),
            Warning::InvalidBlockedTime { block } => {
                write!(f, "Ignored invalid blocked time: {}", block)
            }
            Warning::ForcedExceedsMax { forced, max } => write!(
                f,
                "Cannot force {} courses into schedules of at most {}",
                forced, max
            ),
            Warning::PoolTooSmall { pool, min } => write!(
                f,
                "Could not generate schedules with minimum set to {} ({} sections found)",
                min, pool
            ),
            Warning::Unscheduled { crns } => {
                let list: Vec<String> = crns.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "Sections without a fixed meeting time were left out of schedules: {}",
                    list.join(", ")
                )
            }
            Warning::ScheduleCapReached { limit } => {
                write!(f, "Stopped after {} schedules; results are incomplete", limit)
            }
            Warning::DeadlineReached { millis } => {
                write!(f, "Stopped after {}ms; results are incomplete", millis)
            }
            Warning::NoSchedules => write!(f, "No possible schedules found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            Warning::NotOffered {
                name: "CSCI 301".to_string()
            }
            .to_string(),
            "CSCI 301 is not offered this term"
        );
        assert_eq!(
            Warning::Unscheduled { crns: vec![1, 2] }.to_string(),
            "Sections without a fixed meeting time were left out of schedules: 1, 2"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let json = serde_json::to_value(Warning::PoolTooSmall { pool: 1, min: 2 }).unwrap();
        assert_eq!(json["kind"], "pool_too_small");
        assert_eq!(json["pool"], 1);
        assert_eq!(json["min"], 2);
    }
}
