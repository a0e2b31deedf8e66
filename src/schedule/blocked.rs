use super::conflict::blocks_overlap;
use crate::catalog::types::{from_minutes, is_valid_clock, Course, CourseError, DaySet, TimeBlock};
use crate::scoring::factors::TimeWindow;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A weekly window the student cannot attend, e.g. work shifts.
///
/// Times are military HHMM values like course records. On the command line
/// a blocked time is written `"MW 09:00-12:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTime {
    pub days: DaySet,
    pub start_time: u16,
    pub end_time: u16,
}

impl BlockedTime {
    /// The window as a time block, if its clock values form a valid range
    pub fn block(&self) -> Result<TimeBlock, CourseError> {
        if !is_valid_clock(self.start_time)
            || !is_valid_clock(self.end_time)
            || self.start_time > self.end_time
        {
            return Err(CourseError::InvalidBlockedTime {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(TimeBlock {
            days: self.days,
            start: self.start_time,
            end: self.end_time,
        })
    }
}

impl FromStr for BlockedTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (days, window) = s
            .trim()
            .split_once(' ')
            .with_context(|| format!("expected DAYS HH:MM-HH:MM, got '{}'", s.trim()))?;
        let days: DaySet = days.parse()?;
        let window = TimeWindow::parse(window)?;
        Ok(Self {
            days,
            start_time: from_minutes(window.from),
            end_time: from_minutes(window.to),
        })
    }
}

impl fmt::Display for BlockedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}-{:02}:{:02}",
            self.days,
            self.start_time / 100,
            self.start_time % 100,
            self.end_time / 100,
            self.end_time % 100
        )
    }
}

/// True when the lecture or lab of `course` meets during any blocked window.
///
/// Sections without a fixed time never overlap a window.
pub fn overlaps_blocked(course: &Course, blocked: &[TimeBlock]) -> bool {
    let meetings = [course.main_block(), course.lab_block()];
    meetings
        .iter()
        .flatten()
        .any(|meeting| blocked.iter().any(|b| blocks_overlap(meeting, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{MeetingDays, Weekday};

    fn course(days: &str, start: u16, end: u16) -> Course {
        Course::new("CSCI 301", 1, days.parse().unwrap(), start, end)
    }

    fn blocked(s: &str) -> Vec<TimeBlock> {
        vec![s.parse::<BlockedTime>().unwrap().block().unwrap()]
    }

    #[test]
    fn test_parse_blocked_time() {
        let parsed: BlockedTime = "MW 09:00-12:30".parse().unwrap();
        assert!(parsed.days.contains(Weekday::Mon));
        assert!(parsed.days.contains(Weekday::Wed));
        assert_eq!(parsed.start_time, 900);
        assert_eq!(parsed.end_time, 1230);
        assert_eq!(parsed.to_string(), "MW 09:00-12:30");

        let compact: BlockedTime = "F 1300-1700".parse().unwrap();
        assert_eq!(compact.start_time, 1300);
    }

    #[test]
    fn test_parse_blocked_time_rejects_bad_input() {
        assert!("MW".parse::<BlockedTime>().is_err());
        assert!("MX 09:00-10:00".parse::<BlockedTime>().is_err());
        assert!("MW 10:00-09:00".parse::<BlockedTime>().is_err());
    }

    #[test]
    fn test_blocked_time_deserializes() {
        let json = r#"{"days": "TR", "start_time": 800, "end_time": 1000}"#;
        let parsed: BlockedTime = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.to_string(), "TR 08:00-10:00");
    }

    #[test]
    fn test_invalid_block_range() {
        let inverted = BlockedTime {
            days: "M".parse().unwrap(),
            start_time: 1200,
            end_time: 900,
        };
        assert_eq!(
            inverted.block(),
            Err(CourseError::InvalidBlockedTime {
                start: 1200,
                end: 900
            })
        );
        let bad_clock = BlockedTime {
            end_time: 975,
            ..inverted
        };
        assert!(bad_clock.block().is_err());
    }

    #[test]
    fn test_overlaps_blocked_lecture() {
        let window = blocked("MW 09:00-10:00");
        assert!(overlaps_blocked(&course("MWF", 930, 1020), &window));
        assert!(!overlaps_blocked(&course("TR", 930, 1020), &window));
        assert!(!overlaps_blocked(&course("MWF", 1100, 1150), &window));
    }

    #[test]
    fn test_overlaps_blocked_lab() {
        let window = blocked("R 14:00-16:00");
        let with_lab = course("MWF", 900, 950).with_lab("R".parse().unwrap(), 1500, 1650);
        assert!(overlaps_blocked(&with_lab, &window));
    }

    #[test]
    fn test_unscheduled_section_never_blocked() {
        let tbd = Course::new("CSCI 390", 2, MeetingDays::Tbd, 0, 0);
        assert!(!overlaps_blocked(&tbd, &blocked("MTWRF 00:00-23:59")));
    }
}
