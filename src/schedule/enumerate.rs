use super::conflict::conflicts;
use super::types::{Schedule, SearchLimits, SizeBounds};
use crate::catalog::types::{Course, CourseError};
use crate::warning::Warning;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, warn};

/// How often (in search steps) the deadline is checked
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Pairwise conflict relation over a course pool, computed once.
#[derive(Debug, Clone)]
pub struct ConflictMatrix {
    n: usize,
    cells: Vec<bool>,
    pairs: usize,
}

impl ConflictMatrix {
    pub fn build(courses: &[Course]) -> Self {
        let n = courses.len();
        let mut cells = vec![false; n * n];
        let mut pairs = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if conflicts(&courses[i], &courses[j]) {
                    cells[i * n + j] = true;
                    cells[j * n + i] = true;
                    pairs += 1;
                }
            }
        }
        Self { n, cells, pairs }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn conflicts(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.n + j]
    }

    /// Number of conflicting unordered pairs
    pub fn pair_count(&self) -> usize {
        self.pairs
    }

    /// Conflicting unordered pairs as `(i, j)` with `i < j`
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.pairs);
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.conflicts(i, j) {
                    out.push((i, j));
                }
            }
        }
        out
    }
}

/// Output of one enumeration run.
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub schedules: Vec<Schedule>,
    /// Sections set aside because their meeting time is TBD or N/A
    pub unscheduled: Vec<Course>,
    pub warnings: Vec<Warning>,
    /// True when a search limit stopped the run early
    pub truncated: bool,
}

/// Every conflict-free subset of `courses` with a size inside the clamped
/// bounds, containing all `forced` subjects.
///
/// Results are grouped by size (smallest first) and lexicographic by pool
/// order within a size. Returns an error only for malformed course records.
pub fn enumerate(
    courses: &[Course],
    min_size: usize,
    max_size: usize,
    forced: &[String],
) -> Result<Enumeration, CourseError> {
    enumerate_with_limits(courses, min_size, max_size, forced, &SearchLimits::unbounded())
}

pub fn enumerate_with_limits(
    courses: &[Course],
    min_size: usize,
    max_size: usize,
    forced: &[String],
    limits: &SearchLimits,
) -> Result<Enumeration, CourseError> {
    for course in courses {
        course.validate()?;
    }

    let mut result = Enumeration::default();

    let (pool, unscheduled): (Vec<Course>, Vec<Course>) =
        courses.iter().cloned().partition(Course::is_schedulable);
    if !unscheduled.is_empty() {
        result.warnings.push(Warning::Unscheduled {
            crns: unscheduled.iter().map(|c| c.crn).collect(),
        });
    }
    result.unscheduled = unscheduled;

    let forced: HashSet<&str> = forced.iter().map(String::as_str).collect();
    let bounds = SizeBounds::clamp(min_size, max_size, forced.len());

    if !bounds.is_satisfiable() {
        result.warnings.push(Warning::ForcedExceedsMax {
            forced: forced.len(),
            max: bounds.max,
        });
        return Ok(result);
    }
    if pool.len() < bounds.min {
        warn!(pool = pool.len(), min = bounds.min, "course pool smaller than minimum size");
        result.warnings.push(Warning::PoolTooSmall {
            pool: pool.len(),
            min: bounds.min,
        });
        return Ok(result);
    }

    let matrix = ConflictMatrix::build(&pool);
    debug!(
        pool = pool.len(),
        conflict_pairs = matrix.pair_count(),
        min = bounds.min,
        max = bounds.max,
        forced = forced.len(),
        "conflict relation built"
    );

    let mut search = Search {
        pool: &pool,
        matrix: &matrix,
        forced: &forced,
        limits,
        started: Instant::now(),
        steps: 0,
        stop: None,
        out: Vec::new(),
    };

    for size in bounds.min..=bounds.max.min(pool.len()) {
        let before = search.out.len();
        let mut current = Vec::with_capacity(size);
        search.extend(0, &mut current, size);
        debug!(size, found = search.out.len() - before, "enumerated subset size");
        if search.stop.is_some() {
            break;
        }
    }

    if let Some(stop) = search.stop {
        result.truncated = true;
        let warning = match stop {
            Stop::Cap(limit) => Warning::ScheduleCapReached { limit },
            Stop::Deadline(d) => Warning::DeadlineReached {
                millis: d.as_millis() as u64,
            },
        };
        warn!(%warning, "schedule search stopped early");
        result.warnings.push(warning);
    }

    result.schedules = search.out;
    Ok(result)
}

#[derive(Debug, Clone, Copy)]
enum Stop {
    Cap(usize),
    Deadline(std::time::Duration),
}

/// Depth-first extend-and-check search for subsets of one exact size.
///
/// A candidate index is only pushed if it conflicts with nothing already
/// chosen, so every complete subset is valid without a second pass.
struct Search<'a> {
    pool: &'a [Course],
    matrix: &'a ConflictMatrix,
    forced: &'a HashSet<&'a str>,
    limits: &'a SearchLimits,
    started: Instant,
    steps: u64,
    stop: Option<Stop>,
    out: Vec<Schedule>,
}

impl Search<'_> {
    fn extend(&mut self, from: usize, current: &mut Vec<usize>, size: usize) {
        if current.len() == size {
            self.emit(current);
            return;
        }

        let needed = size - current.len();
        let last = self.pool.len() + 1 - needed;
        for i in from..last {
            if self.stop.is_some() || self.check_deadline() {
                return;
            }
            if current.iter().any(|&j| self.matrix.conflicts(i, j)) {
                continue;
            }
            current.push(i);
            self.extend(i + 1, current, size);
            current.pop();
        }
    }

    fn emit(&mut self, chosen: &[usize]) {
        let covers_forced = self
            .forced
            .iter()
            .all(|subject| chosen.iter().any(|&i| self.pool[i].subject == *subject));
        if !covers_forced {
            return;
        }

        self.out
            .push(Schedule::new(chosen.iter().map(|&i| self.pool[i].clone()).collect()));

        if let Some(limit) = self.limits.max_schedules {
            if self.out.len() >= limit {
                self.stop = Some(Stop::Cap(limit));
            }
        }
    }

    fn check_deadline(&mut self) -> bool {
        self.steps += 1;
        let Some(deadline) = self.limits.deadline else {
            return false;
        };
        if self.steps % DEADLINE_CHECK_INTERVAL == 0 && self.started.elapsed() >= deadline {
            self.stop = Some(Stop::Deadline(deadline));
            return true;
        }
        false
    }
}
