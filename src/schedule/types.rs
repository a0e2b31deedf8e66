use crate::catalog::types::Course;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An ordered set of sections with no pairwise conflicts.
///
/// Only the enumerator builds these; courses keep the relative order they had
/// in the input pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub courses: Vec<Course>,
}

impl Schedule {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.courses.iter().map(|c| c.subject.as_str())
    }

    pub fn crns(&self) -> Vec<u32> {
        self.courses.iter().map(|c| c.crn).collect()
    }

    pub fn contains_subject(&self, subject: &str) -> bool {
        self.subjects().any(|s| s == subject)
    }

    /// Earliest lecture start, in minutes since midnight
    pub fn earliest_start(&self) -> Option<u16> {
        self.courses
            .iter()
            .filter_map(|c| c.main_block())
            .map(|b| b.start_minutes())
            .min()
    }

    /// Latest lecture end, in minutes since midnight
    pub fn latest_end(&self) -> Option<u16> {
        self.courses
            .iter()
            .filter_map(|c| c.main_block())
            .map(|b| b.end_minutes())
            .max()
    }

    /// Sum of every section's own lecture length
    pub fn class_minutes(&self) -> u32 {
        self.courses
            .iter()
            .filter_map(|c| c.main_block())
            .map(|b| b.duration_minutes() as u32)
            .sum()
    }
}

/// Requested subset sizes after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeBounds {
    pub min: usize,
    pub max: usize,
}

impl SizeBounds {
    pub const HARD_MIN: usize = 1;
    pub const HARD_MAX: usize = 5;

    /// Clamp a request into `[HARD_MIN, HARD_MAX]`.
    ///
    /// `min` collapses onto `max` when it is larger, then rises to cover
    /// every forced subject. The result can have `min > max` when more
    /// subjects are forced than fit; such bounds admit no schedule.
    pub fn clamp(min: usize, max: usize, forced: usize) -> Self {
        let max = max.clamp(Self::HARD_MIN, Self::HARD_MAX);
        let mut min = min.clamp(Self::HARD_MIN, Self::HARD_MAX).min(max);
        if forced > 0 {
            min = min.max(forced);
        }
        Self { min, max }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

/// Caps on a single enumeration run.
///
/// Enumeration is exponential in pool size; either limit stops the search
/// early and marks the result truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchLimits {
    pub max_schedules: Option<usize>,
    pub deadline: Option<Duration>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_schedules(mut self, n: usize) -> Self {
        self.max_schedules = Some(n);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
