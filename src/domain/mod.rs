use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A club member
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// Unique identifier for the `Member`
    pub member_id: Uuid,
    pub email: String,
    pub name: String,
    pub belt: BeltRank,
    /// Number of attended sessions
    ///
    /// Only ever incremented, by the check-in and manual attendance paths.
    pub total_sessions: u32,
    pub subscription: Option<Subscription>,
    /// Timezone the member lives in, if known
    ///
    /// Used for monthly aggregation. Falls back to the club timezone when unset.
    pub timezone: Option<Tz>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(email: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            member_id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            belt: BeltRank::White,
            total_sessions: 0,
            subscription: None,
            timezone: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeltRank {
    White,
    Blue,
    Purple,
    Brown,
    Black,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: String,
    pub status: SubscriptionStatus,
    pub current_period_end: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
}

/// Attendance of a member at a class occurrence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub attendance_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Set when a coach created or corrected this record
    #[serde(default)]
    pub manual_override: bool,
}

impl AttendanceRecord {
    /// Record created by a member checking in at `now`
    pub fn checked_in(member_id: Uuid, class_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            attendance_id: Uuid::new_v4(),
            member_id,
            class_id,
            check_in_time: now,
            status: AttendanceStatus::Attended,
            created_at: now,
            notes: None,
            manual_override: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Attended,
    Absent,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown attendance status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for AttendanceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attended" => Ok(Self::Attended),
            "absent" => Ok(Self::Absent),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Calendar day an instant falls on in a given timezone
///
/// Check-ins are unique per `(member_id, class_id, DayBucket)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayBucket(pub NaiveDate);

impl DayBucket {
    pub fn of(instant: DateTime<Utc>, tz: Tz) -> Self {
        Self(instant.with_timezone(&tz).date_naive())
    }

    /// First instant of this day
    pub fn start(&self, tz: Tz) -> Option<DateTime<Utc>> {
        local_midnight(self.0, tz)
    }

    /// First instant of the following day
    pub fn end(&self, tz: Tz) -> Option<DateTime<Utc>> {
        local_midnight(self.0.succ_opt()?, tz)
    }
}

/// Midnight of the day containing `now`, in `tz`
pub fn day_start(now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    DayBucket::of(now, tz).start(tz)
}

/// Midnight of the first day of the month containing `now`, in `tz`
pub fn month_start(now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let first = now.with_timezone(&tz).date_naive().with_day(1)?;
    local_midnight(first, tz)
}

/// First instant of `date` in `tz`
///
/// When a DST jump skips midnight, the day starts where the gap does: midnight read with the
/// offset in force the evening before.
fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(start) = midnight.and_local_timezone(tz).earliest() {
        return Some(start.with_timezone(&Utc));
    }

    let evening = midnight - Duration::hours(2);
    let offset = evening.and_local_timezone(tz).earliest()?.offset().fix();
    let start = midnight - Duration::seconds(offset.local_minus_utc().into());
    Some(Utc.from_utc_datetime(&start))
}
