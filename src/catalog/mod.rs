pub mod names;
pub mod store;
pub mod types;

pub use names::{clean_course_names, is_valid_course_name};
pub use store::{CatalogError, DirectoryCatalog, TermCatalog};
pub use types::{Course, CourseError, DaySet, MeetingDays, TimeBlock, Weekday};
