pub mod blocked;
pub mod conflict;
pub mod enumerate;
pub mod types;

pub use blocked::{overlaps_blocked, BlockedTime};
pub use conflict::{conflict_reason, conflicts, ConflictReason};
pub use enumerate::{enumerate, enumerate_with_limits, ConflictMatrix, Enumeration};
pub use types::{Schedule, SearchLimits, SizeBounds};
