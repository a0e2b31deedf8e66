use crate::catalog::{clean_course_names, Course, TermCatalog};
use crate::config::{Config, DEFAULT_MAX_DISPLAY, DEFAULT_MAX_INPUT_COURSES};
use crate::schedule::{
    conflicts, enumerate_with_limits, overlaps_blocked, BlockedTime, SearchLimits,
};
use crate::scoring::{sort_ranked, ScoredSchedule, Scorer};
use crate::warning::Warning;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// What the caller asks for: course names for a term, optional forced
/// subjects and sections, blocked times and the desired schedule sizes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerateRequest {
    pub term: String,
    pub courses: Vec<String>,
    #[serde(default)]
    pub forced: Vec<String>,
    /// Sections that must appear in every schedule
    #[serde(default)]
    pub forced_crns: Vec<u32>,
    /// Weekly windows no section may meet in
    #[serde(default)]
    pub blocked: Vec<BlockedTime>,
    pub min_size: usize,
    pub max_size: usize,
}

impl GenerateRequest {
    pub fn new(
        term: impl Into<String>,
        courses: Vec<String>,
        min_size: usize,
        max_size: usize,
    ) -> Self {
        Self {
            term: term.into(),
            courses,
            forced: Vec::new(),
            forced_crns: Vec::new(),
            blocked: Vec::new(),
            min_size,
            max_size,
        }
    }
}

/// Request-independent knobs, usually taken from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub limits: SearchLimits,
    pub max_display: usize,
    pub max_input_courses: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            limits: SearchLimits::unbounded(),
            max_display: DEFAULT_MAX_DISPLAY,
            max_input_courses: DEFAULT_MAX_INPUT_COURSES,
        }
    }
}

impl GenerateOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            limits: config.search_limits()?,
            max_display: config.max_display(),
            max_input_courses: config.max_input_courses,
        })
    }
}

/// Outcome of looking up one requested course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// At least one section can be placed in a schedule
    Found,
    /// Every section is TBD or N/A
    AsyncOnly,
    /// Every timed section meets during a blocked time or clashes with a forced section
    Blocked,
    NotOffered,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CourseStatus::Found => "found",
            CourseStatus::AsyncOnly => "only sections without a fixed time",
            CourseStatus::Blocked => "every section is blocked",
            CourseStatus::NotOffered => "not offered this term",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseResult {
    pub name: String,
    pub status: CourseStatus,
    /// Schedulable sections, when the course was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl CourseResult {
    fn new(name: &str, status: CourseStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            count: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateStats {
    /// Schedules produced by the search, before truncation to `max_display`
    pub total_generated: usize,
    /// A search limit stopped enumeration early
    pub truncated: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateResponse {
    pub schedules: Vec<ScoredSchedule>,
    /// Requested sections with no fixed meeting time
    pub unscheduled: Vec<Course>,
    /// One entry per requested course, in request order
    pub course_results: Vec<CourseResult>,
    pub warnings: Vec<Warning>,
    pub stats: GenerateStats,
}

/// Resolve, enumerate, score and rank schedules for one request.
///
/// Bad input never fails the request: it shows up as warnings next to
/// whatever could still be produced. Errors are reserved for an unavailable
/// term and malformed course records.
pub fn generate_schedules(
    catalog: &dyn TermCatalog,
    request: &GenerateRequest,
    scorer: &Scorer,
    options: &GenerateOptions,
) -> Result<GenerateResponse> {
    let started = Instant::now();
    let mut response = GenerateResponse::default();

    let limit = options.max_input_courses;
    if request.courses.len() > limit
        || request.forced.len() > limit
        || request.forced_crns.len() > limit
    {
        response.warnings.push(Warning::TooManyCourses { limit });
        return Ok(response);
    }

    let mut names = clean_course_names(&request.courses, &mut response.warnings);
    let mut forced = clean_course_names(&request.forced, &mut response.warnings);

    let mut blocked = Vec::with_capacity(request.blocked.len());
    for window in &request.blocked {
        match window.block() {
            Ok(block) => blocked.push(block),
            Err(_) => response.warnings.push(Warning::InvalidBlockedTime {
                block: window.to_string(),
            }),
        }
    }

    let offered = catalog.courses(&request.term)?;
    let invalid_record = || format!("Invalid course data for term {}", request.term);

    // Pin forced sections first; they may not clash with blocked times or each other
    let mut pinned: Vec<&Course> = Vec::new();
    for &crn in &request.forced_crns {
        if pinned.iter().any(|p| p.crn == crn) {
            continue;
        }
        let Some(section) = offered.iter().find(|c| c.crn == crn && c.is_schedulable()) else {
            response.warnings.push(Warning::ForcedSectionNotFound { crn });
            continue;
        };
        section.validate().with_context(invalid_record)?;
        if overlaps_blocked(section, &blocked) || pinned.iter().any(|p| conflicts(p, section)) {
            response.warnings.push(Warning::ForcedSectionConflict { crn });
            response.warnings.push(Warning::NoSchedules);
            response.stats.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(response);
        }
        pinned.push(section);
    }

    // Forced subjects and pinned sections are implicitly requested
    for subject in forced.iter().chain(pinned.iter().map(|p| &p.subject)) {
        if !names.contains(subject) {
            names.push(subject.clone());
        }
    }
    for section in &pinned {
        if !forced.contains(&section.subject) {
            forced.push(section.subject.clone());
        }
    }

    debug!(
        term = %request.term,
        offered = offered.len(),
        requested = names.len(),
        pinned = pinned.len(),
        blocked = blocked.len(),
        "resolving courses"
    );

    let mut pool: Vec<Course> = Vec::new();
    for name in &names {
        let sections: Vec<&Course> = offered.iter().filter(|c| &c.subject == name).collect();
        if sections.is_empty() {
            response.warnings.push(Warning::NotOffered { name: name.clone() });
            response
                .course_results
                .push(CourseResult::new(name, CourseStatus::NotOffered));
            continue;
        }
        for section in &sections {
            section.validate().with_context(invalid_record)?;
        }

        if let Some(pin) = pinned.iter().find(|p| &p.subject == name) {
            pool.push((*pin).clone());
            response.course_results.push(CourseResult {
                count: Some(1),
                ..CourseResult::new(name, CourseStatus::Found)
            });
            continue;
        }

        let (mut found, mut timeless) = (0, 0);
        for section in sections {
            if !section.is_schedulable() {
                // The enumerator sets these aside and reports them
                timeless += 1;
                pool.push(section.clone());
            } else if !overlaps_blocked(section, &blocked)
                && !pinned.iter().any(|p| conflicts(p, section))
            {
                found += 1;
                pool.push(section.clone());
            }
        }

        let result = if found > 0 {
            CourseResult {
                count: Some(found),
                ..CourseResult::new(name, CourseStatus::Found)
            }
        } else if timeless > 0 {
            CourseResult::new(name, CourseStatus::AsyncOnly)
        } else {
            CourseResult::new(name, CourseStatus::Blocked)
        };
        response.course_results.push(result);
    }

    let forced: Vec<String> = forced
        .into_iter()
        .filter(|subject| {
            let schedulable = pool
                .iter()
                .any(|c| &c.subject == subject && c.is_schedulable());
            if !schedulable {
                response.warnings.push(Warning::ForcedNotFound {
                    subject: subject.clone(),
                });
            }
            schedulable
        })
        .collect();

    let enumeration = enumerate_with_limits(
        &pool,
        request.min_size,
        request.max_size,
        &forced,
        &options.limits,
    )
    .with_context(invalid_record)?;

    response.warnings.extend(enumeration.warnings);
    response.unscheduled = enumeration.unscheduled;
    response.stats.truncated = enumeration.truncated;
    response.stats.total_generated = enumeration.schedules.len();

    let mut scored = scorer.score_all(enumeration.schedules);
    sort_ranked(&mut scored);
    scored.truncate(options.max_display);

    if scored.is_empty() {
        response.warnings.push(Warning::NoSchedules);
    }
    response.schedules = scored;
    response.stats.elapsed_ms = started.elapsed().as_millis() as u64;

    info!(
        event = "generate_complete",
        term = %request.term,
        pool = pool.len(),
        generated = response.stats.total_generated,
        returned = response.schedules.len(),
        warnings = response.warnings.len(),
        truncated = response.stats.truncated,
        elapsed_ms = response.stats.elapsed_ms,
        "schedules generated"
    );

    Ok(response)
}
