use anyhow::{bail, Context, Result};
use chrono::{NaiveTime, Timelike};

/// Parse a wall-clock time ("08:00" or "0800") into minutes since midnight.
pub fn parse_clock(s: &str) -> Result<u16> {
    let s = s.trim();
    let time = NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H%M"))
        .with_context(|| format!("expected HH:MM or HHMM, got '{}'", s))?;
    Ok((time.hour() * 60 + time.minute()) as u16)
}

/// Parse a humantime duration ("10m", "1h 30m") into whole minutes.
pub fn parse_minutes(s: &str) -> Result<u32> {
    let duration = humantime::parse_duration(s.trim())?;
    u32::try_from(duration.as_secs() / 60)
        .with_context(|| format!("duration '{}' is too large", s.trim()))
}

/// Render minutes since midnight as "HH:MM".
pub fn clock_label(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Closed time-of-day range, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: u16,
    pub to: u16,
}

impl TimeWindow {
    pub const fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    /// Parse "HH:MM-HH:MM" (or "HHMM-HHMM").
    pub fn parse(s: &str) -> Result<Self> {
        let Some((from, to)) = s.trim().split_once('-') else {
            bail!("expected a range like 08:00-10:00, got '{}'", s.trim());
        };
        let from = parse_clock(from)?;
        let to = parse_clock(to)?;
        if from > to {
            bail!("range ends before it starts: {}", s.trim());
        }
        Ok(Self { from, to })
    }

    fn width(&self) -> f64 {
        f64::from(self.to - self.from)
    }
}

/// Earliest-start preference: 0 before `ramp_up`, rising to 1 across it,
/// 1 until `ramp_down`, falling back to 0 across it, 0 afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartCurve {
    pub ramp_up: TimeWindow,
    pub ramp_down: TimeWindow,
}

impl StartCurve {
    pub fn value(&self, start: u16) -> f64 {
        let up = self.ramp_up;
        let down = self.ramp_down;
        if start < up.from {
            0.0
        } else if start < up.to {
            f64::from(start - up.from) / up.width()
        } else if start < down.from {
            1.0
        } else if start < down.to {
            f64::from(down.to - start) / down.width()
        } else {
            0.0
        }
    }
}

/// Latest-end preference: 1 at or before the window, 0 at or after its end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndCurve {
    pub ramp: TimeWindow,
}

impl EndCurve {
    pub fn value(&self, end: u16) -> f64 {
        let ramp = self.ramp;
        if end <= ramp.from {
            1.0
        } else if end >= ramp.to {
            0.0
        } else {
            f64::from(ramp.to - end) / ramp.width()
        }
    }
}

/// Idle-time preference. Up to `per_transition` minutes per class change is
/// free; the score then falls linearly to 0 over `tolerance` more minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapCurve {
    pub per_transition: u32,
    pub tolerance: u32,
}

impl GapCurve {
    pub fn allowance(&self, transitions: u32) -> u32 {
        self.per_transition.saturating_mul(transitions)
    }

    pub fn value(&self, idle: u32, transitions: u32) -> f64 {
        let allowance = self.allowance(transitions);
        if idle <= allowance {
            return 1.0;
        }
        let excess = idle - allowance;
        if excess >= self.tolerance {
            0.0
        } else {
            1.0 - f64::from(excess) / f64::from(self.tolerance)
        }
    }
}
