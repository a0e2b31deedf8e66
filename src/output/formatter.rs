use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::catalog::types::{Course, MeetingDays};
use crate::generate::{CourseResult, CourseStatus};
use crate::schedule::ConflictReason;
use crate::scoring::ScoredSchedule;
use crate::warning::Warning;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a military HHMM value as "HH:MM"
pub fn format_time(hhmm: u16) -> String {
    format!("{:02}:{:02}", hhmm / 100, hhmm % 100)
}

/// Format a meeting pattern as "MWF 09:00-09:50", or just "TBD"/"N/A"
pub fn format_meeting(days: &MeetingDays, start: u16, end: u16) -> String {
    if days.is_scheduled() {
        format!("{} {}-{}", days, format_time(start), format_time(end))
    } else {
        days.to_string()
    }
}

fn format_lab(course: &Course) -> Option<String> {
    let days = course.lab_days.as_ref()?;
    match (course.lab_start_time, course.lab_end_time) {
        (Some(start), Some(end)) => Some(format_meeting(days, start, end)),
        _ => Some(days.to_string()),
    }
}

/// Format a score with two decimals ("0.72")
/// If incomplete is true, appends asterisk to indicate partial scoring
pub fn format_score(score: Option<f64>, incomplete: bool) -> String {
    match score {
        None => "-".to_string(),
        Some(score) if incomplete => format!("{:.2}*", score),
        Some(score) => format!("{:.2}", score),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn subjects_line(scored: &ScoredSchedule) -> String {
    scored.schedule.subjects().collect::<Vec<_>>().join(", ")
}

fn crns_line(scored: &ScoredSchedule, separator: &str) -> String {
    scored
        .schedule
        .crns()
        .iter()
        .map(|crn| crn.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Format ranked schedules as a table with columns: Index, Score, Subjects, CRNs
/// No headers. Score column is right-aligned, 5 chars wide (fits "0.72*")
pub fn format_scored_table(schedules: &[ScoredSchedule], use_colors: bool) -> String {
    format_table(schedules, use_colors, get_terminal_width())
}

fn format_table(
    schedules: &[ScoredSchedule],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if schedules.is_empty() {
        return "No schedules found.".to_string();
    }

    let index_width = schedules.len().to_string().len().max(2);
    let score_width = 5;
    let separator = "  ";

    schedules
        .iter()
        .enumerate()
        .map(|(idx, scored)| {
            // 1-based index, right-aligned with trailing dot
            let index_str = format!("{:>width$}.", idx + 1, width = index_width);
            let score_str = format_score(scored.result.score, scored.result.incomplete);
            let score_padded = format!("{:>width$}", score_str, width = score_width);
            let crns = crns_line(scored, " ");

            let fixed_width = index_width + 2 + score_width + separator.len() * 2 + crns.len();
            let subjects = subjects_line(scored);
            let subjects = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(&subjects, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_text(&subjects, 20),
                // No terminal (pipe), don't truncate
                None => subjects,
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    subjects,
                    separator,
                    crns.cyan()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, subjects, separator, crns
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one ranked schedule with every section and the score breakdown
pub fn format_schedule_detail(index: usize, scored: &ScoredSchedule, use_colors: bool) -> String {
    let score = format_score(scored.result.score, scored.result.incomplete);
    let mut lines = Vec::new();

    let header = format!("Schedule {}  score {}", index, score);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for course in &scored.schedule.courses {
        let mut line = format!(
            "  {:>6}  {:<9} {}",
            course.crn,
            course.subject,
            format_meeting(&course.days, course.start_time, course.end_time)
        );
        if let Some(lab) = format_lab(course) {
            line.push_str(&format!("  lab {}", lab));
        }
        if let Some(ref instructor) = course.instructor {
            line.push_str(&format!("  {}", instructor));
        }
        if let Some(ref title) = course.title {
            line.push_str(&format!("  {}", title));
        }
        lines.push(line);
    }

    lines.push("  Breakdown:".to_string());
    for factor in &scored.result.breakdown {
        let value = factor
            .value
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "    {:<6} {:>4}  {}",
            factor.criterion.label(),
            value,
            factor.description
        );
        lines.push(if use_colors && factor.value.is_none() {
            line.dimmed().to_string()
        } else {
            line
        });
    }

    lines.join("\n")
}

/// Format ranked schedules as tab-separated values for scripting
/// Columns: score, subjects, crns (no headers, no colors). Undefined scores are empty.
pub fn format_tsv(schedules: &[ScoredSchedule]) -> String {
    if schedules.is_empty() {
        return String::new();
    }

    schedules
        .iter()
        .map(|scored| {
            let score = scored
                .result
                .score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_default();
            format!(
                "{}\t{}\t{}",
                score,
                scored.schedule.subjects().collect::<Vec<_>>().join(","),
                crns_line(scored, ",")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format warnings one per line, prefixed with "warning:"
pub fn format_warnings(warnings: &[Warning], use_colors: bool) -> String {
    warnings
        .iter()
        .map(|w| {
            if use_colors {
                format!("{} {}", "warning:".yellow().bold(), w)
            } else {
                format!("warning: {}", w)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per requested course: its name, status and usable section count
pub fn format_course_results(results: &[CourseResult], use_colors: bool) -> String {
    let width = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
    results
        .iter()
        .map(|r| {
            let status = match r.count {
                Some(n) => format!("{} ({} sections)", r.status, n),
                None => r.status.to_string(),
            };
            let status = match r.status {
                _ if !use_colors => status,
                CourseStatus::Found => status.green().to_string(),
                CourseStatus::AsyncOnly => status.yellow().to_string(),
                CourseStatus::Blocked | CourseStatus::NotOffered => status.red().to_string(),
            };
            format!("{:<width$}  {}", r.name, status, width = width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_section(course: &Course) -> String {
    let mut text = format!(
        "{} {} {}",
        course.crn,
        course.subject,
        format_meeting(&course.days, course.start_time, course.end_time)
    );
    if let Some(lab) = format_lab(course) {
        text.push_str(&format!(", lab {}", lab));
    }
    text
}

/// Report whether two sections can share a schedule, and why not if they cannot
pub fn format_conflict(
    a: &Course,
    b: &Course,
    reason: Option<ConflictReason>,
    use_colors: bool,
) -> String {
    let sections = format!("{}\n{}", describe_section(a), describe_section(b));
    let verdict = match reason {
        Some(reason) if use_colors => format!("{} ({})", "conflict".red().bold(), reason),
        Some(reason) => format!("conflict ({})", reason),
        None if use_colors => "compatible".green().bold().to_string(),
        None => "compatible".to_string(),
    };
    format!("{}\n{}", sections, verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use crate::scoring::Scorer;

    fn course(subject: &str, crn: u32, days: &str, start: u16, end: u16) -> Course {
        Course::new(subject, crn, days.parse().unwrap(), start, end)
    }

    fn sample_scored() -> ScoredSchedule {
        let schedule = Schedule::new(vec![
            course("CSCI 301", 40125, "MWF", 800, 1000).with_gpa(3.5),
            course("MATH 204", 40200, "TR", 1000, 1120),
        ]);
        let result = Scorer::default().score(&schedule);
        ScoredSchedule { schedule, result }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(800), "08:00");
        assert_eq!(format_time(1350), "13:50");
    }

    #[test]
    fn test_format_meeting() {
        let days: MeetingDays = "TR".parse().unwrap();
        assert_eq!(format_meeting(&days, 1000, 1120), "TR 10:00-11:20");
        assert_eq!(format_meeting(&MeetingDays::Tbd, 0, 0), "TBD");
    }

    #[test]
    fn test_format_score_complete() {
        assert_eq!(format_score(Some(0.72), false), "0.72");
        assert_eq!(format_score(Some(1.0), false), "1.00");
    }

    #[test]
    fn test_format_score_with_incomplete() {
        assert_eq!(format_score(Some(0.5), true), "0.50*");
    }

    #[test]
    fn test_format_score_undefined() {
        assert_eq!(format_score(None, true), "-");
    }

    // truncate_text tests
    #[test]
    fn test_truncate_text_short() {
        assert_eq!(truncate_text("CSCI 301", 20), "CSCI 301");
    }

    #[test]
    fn test_truncate_text_long() {
        assert_eq!(
            truncate_text("CSCI 301, MATH 204, PHYS 161", 15),
            "CSCI 301, MA..."
        );
    }

    #[test]
    fn test_truncate_text_very_narrow() {
        assert_eq!(truncate_text("CSCI 301", 3), "CSC");
    }

    #[test]
    fn test_format_scored_table_empty() {
        assert_eq!(format_scored_table(&[], false), "No schedules found.");
    }

    #[test]
    fn test_format_table_row() {
        let table = format_table(&[sample_scored()], false, None);
        assert_eq!(table, " 1.  0.72  CSCI 301, MATH 204  40125 40200");
    }

    #[test]
    fn test_format_table_truncates_to_terminal() {
        let table = format_table(&[sample_scored()], false, Some(40));
        assert!(table.len() <= 40);
        assert!(table.contains("..."));
        assert!(table.ends_with("40125 40200"));
    }

    #[test]
    fn test_format_schedule_detail() {
        let detail = format_schedule_detail(1, &sample_scored(), false);
        assert!(detail.starts_with("Schedule 1  score 0.72"));
        assert!(detail.contains("40125  CSCI 301  MWF 08:00-10:00"));
        assert!(detail.contains("GPA    0.88  average 3.50 over 1 of 2 courses"));
        assert!(detail.contains("Start  0.00  earliest start 08:00"));
        assert!(detail.contains("Gaps"));
    }

    #[test]
    fn test_format_tsv() {
        let tsv = format_tsv(&[sample_scored()]);
        assert_eq!(tsv, "0.72\tCSCI 301,MATH 204\t40125,40200");
        assert_eq!(format_tsv(&[]), "");
    }

    #[test]
    fn test_format_warnings() {
        let warnings = vec![
            Warning::NoSchedules,
            Warning::InvalidCourseName {
                name: "csci301".to_string(),
            },
        ];
        assert_eq!(
            format_warnings(&warnings, false),
            "warning: No possible schedules found\nwarning: Invalid course name: csci301"
        );
    }

    #[test]
    fn test_format_conflict() {
        let a = course("CSCI 301", 1, "M", 900, 1030);
        let b = course("MATH 204", 2, "M", 1000, 1130);
        let text = format_conflict(&a, &b, Some(ConflictReason::MainOverlap), false);
        assert_eq!(
            text,
            "1 CSCI 301 M 09:00-10:30\n2 MATH 204 M 10:00-11:30\nconflict (lecture times overlap)"
        );
        assert!(format_conflict(&a, &b, None, false).ends_with("compatible"));
    }

    #[test]
    fn test_format_course_results() {
        let results = vec![
            CourseResult {
                name: "CSCI 301".to_string(),
                status: CourseStatus::Found,
                count: Some(2),
            },
            CourseResult {
                name: "HIST 1".to_string(),
                status: CourseStatus::NotOffered,
                count: None,
            },
        ];
        assert_eq!(
            format_course_results(&results, false),
            "CSCI 301  found (2 sections)\nHIST 1    not offered this term"
        );
    }
}
