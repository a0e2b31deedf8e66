use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Problems with a course record that make it unsafe to reason about.
///
/// These are raised at the ingestion boundary (or by [`Course::validate`]) so the
/// conflict model never runs on inconsistent times.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CourseError {
    #[error("unknown meeting day '{0}' (expected letters from MTWRF)")]
    UnknownDay(char),

    #[error("meeting days must not be empty")]
    EmptyDays,

    #[error("CRN {crn}: {field} {value:04} is not a valid HHMM clock time")]
    InvalidClock {
        crn: u32,
        field: &'static str,
        value: u16,
    },

    #[error("CRN {crn}: meeting ends at {end:04} before it starts at {start:04}")]
    InvertedMeeting { crn: u32, start: u16, end: u16 },

    #[error("CRN {crn}: lab ends at {end:04} before it starts at {start:04}")]
    InvertedLab { crn: u32, start: u16, end: u16 },

    #[error("CRN {crn}: lab meets on {days} but is missing a start or end time")]
    IncompleteLab { crn: u32, days: String },

    #[error("blocked time {start:04}-{end:04} is not a valid range")]
    InvalidBlockedTime { start: u16, end: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Registrar letter for the day ("R" is Thursday).
    pub fn letter(self) -> char {
        match self {
            Weekday::Mon => 'M',
            Weekday::Tue => 'T',
            Weekday::Wed => 'W',
            Weekday::Thu => 'R',
            Weekday::Fri => 'F',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'M' => Some(Weekday::Mon),
            'T' => Some(Weekday::Tue),
            'W' => Some(Weekday::Wed),
            'R' => Some(Weekday::Thu),
            'F' => Some(Weekday::Fri),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of weekdays, stored as a five-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DaySet(u8);

impl DaySet {
    pub fn empty() -> Self {
        DaySet(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= day.bit();
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & day.bit() != 0
    }

    /// True if at least one day appears in both sets
    pub fn intersects(self, other: DaySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        Weekday::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl FromStr for DaySet {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = DaySet::empty();
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            let day =
                Weekday::from_letter(c.to_ascii_uppercase()).ok_or(CourseError::UnknownDay(c))?;
            set.insert(day);
        }
        if set.is_empty() {
            return Err(CourseError::EmptyDays);
        }
        Ok(set)
    }
}

impl TryFrom<String> for DaySet {
    type Error = CourseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DaySet> for String {
    fn from(value: DaySet) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in self.iter() {
            write!(f, "{}", day.letter())?;
        }
        Ok(())
    }
}

/// The `days` column of a course record.
///
/// Registrar tables use `TBD` and `N/A` for sections without a fixed weekly
/// time. Those sections can never be placed in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MeetingDays {
    Days(DaySet),
    Tbd,
    NotApplicable,
}

impl MeetingDays {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, MeetingDays::Days(_))
    }

    pub fn day_set(&self) -> Option<DaySet> {
        match self {
            MeetingDays::Days(set) => Some(*set),
            _ => None,
        }
    }
}

impl FromStr for MeetingDays {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("TBD") {
            Ok(MeetingDays::Tbd)
        } else if s.eq_ignore_ascii_case("N/A") || s.is_empty() {
            Ok(MeetingDays::NotApplicable)
        } else {
            Ok(MeetingDays::Days(s.parse()?))
        }
    }
}

impl TryFrom<String> for MeetingDays {
    type Error = CourseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MeetingDays> for String {
    fn from(value: MeetingDays) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MeetingDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingDays::Days(set) => write!(f, "{}", set),
            MeetingDays::Tbd => write!(f, "TBD"),
            MeetingDays::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// One weekly meeting pattern: the same window on every listed day.
/// Times are military HHMM values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBlock {
    pub days: DaySet,
    pub start: u16,
    pub end: u16,
}

impl TimeBlock {
    pub fn start_minutes(&self) -> u16 {
        to_minutes(self.start)
    }

    pub fn end_minutes(&self) -> u16 {
        to_minutes(self.end)
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_minutes().saturating_sub(self.start_minutes())
    }
}

/// Convert a military HHMM value to minutes since midnight
pub fn to_minutes(hhmm: u16) -> u16 {
    (hhmm / 100) * 60 + hhmm % 100
}

/// Convert minutes since midnight back to HHMM
pub fn from_minutes(minutes: u16) -> u16 {
    (minutes / 60) * 100 + minutes % 60
}

pub fn is_valid_clock(hhmm: u16) -> bool {
    hhmm / 100 <= 23 && hhmm % 100 <= 59
}

/// One offered section of a subject for a term.
///
/// Descriptive columns are carried through untouched. `gpa` is the historical
/// average for this subject/instructor pair when the grade data has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub subject: String,
    pub crn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub days: MeetingDays,
    #[serde(default)]
    pub start_time: u16,
    #[serde(default)]
    pub end_time: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_days: Option<MeetingDays>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_start_time: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_end_time: Option<u16>,

    #[serde(default, alias = "course_credits", skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_room: Option<String>,
    #[serde(default, alias = "addl_fees", skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    #[serde(default, alias = "cap", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, alias = "enrl", skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<u32>,
    #[serde(default, alias = "avail", skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waitlist: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
}

impl Course {
    /// Minimal section with a main meeting block and nothing else.
    pub fn new(
        subject: impl Into<String>,
        crn: u32,
        days: MeetingDays,
        start_time: u16,
        end_time: u16,
    ) -> Self {
        Self {
            subject: subject.into(),
            crn,
            title: None,
            days,
            start_time,
            end_time,
            lab_days: None,
            lab_start_time: None,
            lab_end_time: None,
            credits: None,
            instructor: None,
            room: None,
            lab_room: None,
            fees: None,
            capacity: None,
            enrolled: None,
            available: None,
            waitlist: None,
            restrictions: None,
            attributes: None,
            prerequisites: None,
            gpa: None,
        }
    }

    pub fn with_lab(mut self, days: MeetingDays, start: u16, end: u16) -> Self {
        self.lab_days = Some(days);
        self.lab_start_time = Some(start);
        self.lab_end_time = Some(end);
        self
    }

    pub fn with_gpa(mut self, gpa: f64) -> Self {
        self.gpa = Some(gpa);
        self
    }

    /// The lecture block, if the section meets at a known time
    pub fn main_block(&self) -> Option<TimeBlock> {
        self.days.day_set().map(|days| TimeBlock {
            days,
            start: self.start_time,
            end: self.end_time,
        })
    }

    /// The lab block, present only when lab days and both lab times are set
    pub fn lab_block(&self) -> Option<TimeBlock> {
        let days = self.lab_days.as_ref()?.day_set()?;
        Some(TimeBlock {
            days,
            start: self.lab_start_time?,
            end: self.lab_end_time?,
        })
    }

    /// False when the lecture or the lab is TBD/N-A
    pub fn is_schedulable(&self) -> bool {
        self.days.is_scheduled() && self.lab_days.map_or(true, |d| d.is_scheduled())
    }

    /// Historical GPA when the record carries a usable one
    pub fn known_gpa(&self) -> Option<f64> {
        self.gpa.filter(|g| g.is_finite() && *g > 0.0)
    }

    /// Check the time invariants the conflict model relies on.
    pub fn validate(&self) -> Result<(), CourseError> {
        if self.days.is_scheduled() {
            self.check_clock("start_time", self.start_time)?;
            self.check_clock("end_time", self.end_time)?;
            if self.start_time > self.end_time {
                return Err(CourseError::InvertedMeeting {
                    crn: self.crn,
                    start: self.start_time,
                    end: self.end_time,
                });
            }
        }

        if let Some(MeetingDays::Days(days)) = self.lab_days {
            let (Some(start), Some(end)) = (self.lab_start_time, self.lab_end_time) else {
                return Err(CourseError::IncompleteLab {
                    crn: self.crn,
                    days: days.to_string(),
                });
            };
            self.check_clock("lab_start_time", start)?;
            self.check_clock("lab_end_time", end)?;
            if start > end {
                return Err(CourseError::InvertedLab {
                    crn: self.crn,
                    start,
                    end,
                });
            }
        }

        Ok(())
    }

    fn check_clock(&self, field: &'static str, value: u16) -> Result<(), CourseError> {
        if is_valid_clock(value) {
            Ok(())
        } else {
            Err(CourseError::InvalidClock {
                crn: self.crn,
                field,
                value,
            })
        }
    }
}
