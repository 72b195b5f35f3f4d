use chrono::{DateTime, Utc};

/// Source of the current instant
///
/// Commands never read the system clock directly so that day and month boundaries can be tested.
#[mockall::automock]
pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}
