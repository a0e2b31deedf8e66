pub mod formatter;

pub use formatter::{
    format_conflict, format_course_results, format_meeting, format_schedule_detail, format_score,
    format_scored_table, format_time, format_tsv, format_warnings, should_use_colors,
};
