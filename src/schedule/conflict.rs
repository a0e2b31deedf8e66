use crate::catalog::types::{Course, TimeBlock};
use std::fmt;

/// Which rule made two sections incompatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Two sections of the same subject
    SameSubject,
    /// One side has a TBD/N-A meeting time
    Unscheduled,
    /// Lecture blocks share a day and overlap
    MainOverlap,
    /// One side's lab overlaps the other side's lecture
    LabOverlapsMain,
    /// Both labs share a day and overlap
    LabOverlap,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConflictReason::SameSubject => "same subject",
            ConflictReason::Unscheduled => "meeting time is TBD or N/A",
            ConflictReason::MainOverlap => "lecture times overlap",
            ConflictReason::LabOverlapsMain => "lab overlaps a lecture",
            ConflictReason::LabOverlap => "lab times overlap",
        };
        f.write_str(text)
    }
}

/// Closed-interval overlap on minutes since midnight.
/// Blocks that touch (one ends at 10:00, the next starts at 10:00) overlap.
pub fn windows_overlap(start1: u16, end1: u16, start2: u16, end2: u16) -> bool {
    start1.max(start2) <= end1.min(end2)
}

pub(crate) fn blocks_overlap(a: &TimeBlock, b: &TimeBlock) -> bool {
    a.days.intersects(b.days)
        && windows_overlap(
            a.start_minutes(),
            a.end_minutes(),
            b.start_minutes(),
            b.end_minutes(),
        )
}

/// The first rule that stops `a` and `b` from sharing a schedule, if any.
///
/// Symmetric in its arguments. A course with an unknown meeting time conflicts
/// with everything, itself included.
pub fn conflict_reason(a: &Course, b: &Course) -> Option<ConflictReason> {
    if a.subject == b.subject {
        return Some(ConflictReason::SameSubject);
    }
    if !a.is_schedulable() || !b.is_schedulable() {
        return Some(ConflictReason::Unscheduled);
    }

    let (Some(a_main), Some(b_main)) = (a.main_block(), b.main_block()) else {
        return Some(ConflictReason::Unscheduled);
    };
    if blocks_overlap(&a_main, &b_main) {
        return Some(ConflictReason::MainOverlap);
    }

    let a_lab = a.lab_block();
    let b_lab = b.lab_block();

    let lab_vs_main = a_lab.is_some_and(|lab| blocks_overlap(&lab, &b_main))
        || b_lab.is_some_and(|lab| blocks_overlap(&lab, &a_main));
    if lab_vs_main {
        return Some(ConflictReason::LabOverlapsMain);
    }

    if let (Some(a_lab), Some(b_lab)) = (a_lab, b_lab) {
        if blocks_overlap(&a_lab, &b_lab) {
            return Some(ConflictReason::LabOverlap);
        }
    }

    None
}

pub fn conflicts(a: &Course, b: &Course) -> bool {
    conflict_reason(a, b).is_some()
}
