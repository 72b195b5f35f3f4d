use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AttendanceRecord, AttendanceStatus, DayBucket};

#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort {
    /// Insert a check-in record unless one already exists for the same member, class and day
    ///
    /// This is the conditional insert backing the duplicate-check-in guard. The uniqueness check
    /// and the insert must happen atomically.
    async fn insert_check_in(
        &self,
        record: AttendanceRecord,
        day: DayBucket,
    ) -> Result<AttendanceRecord, Error>;

    /// Insert a record without any uniqueness constraint
    ///
    /// Reserved for coach-created records.
    async fn insert_attendance(&self, record: AttendanceRecord)
        -> Result<AttendanceRecord, Error>;

    async fn get_attendance(&self, attendance_id: Uuid) -> Result<AttendanceRecord, Error>;

    async fn patch_attendance(
        &self,
        attendance_id: Uuid,
        patch: AttendancePatch,
    ) -> Result<AttendanceRecord, Error>;

    /// Records for a member with `check_in_time >= since`, optionally filtered to one class
    async fn find_member_attendance(
        &self,
        member_id: Uuid,
        class_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, Error>;

    /// Records for a class with `from <= check_in_time < until`
    async fn find_class_attendance(
        &self,
        class_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, Error>;
}

/// Partial update of an [`AttendanceRecord`]
///
/// `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttendancePatch {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub manual_override: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A check-in record already exists for this member, class and day
    #[error("member {member_id} already checked in to class {class_id} on {day}")]
    DuplicateCheckIn {
        member_id: Uuid,
        class_id: Uuid,
        day: chrono::NaiveDate,
    },

    #[error("attendance record {0} does not exist")]
    AttendanceNotFound(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
