use crate::{
    domain::{AttendanceRecord, DayBucket},
    ports::database::{AttendancePatch, DatabasePort, Error},
};
use chrono::{DateTime, Utc};
use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    attendances: HashMap<Uuid, AttendanceRecord>,
    /// Unique index over `(member_id, class_id, day)` for check-in records
    check_ins: HashSet<(Uuid, Uuid, DayBucket)>,
}

impl MemoryDatabase {
    fn select<F>(&self, filter: F) -> Result<Vec<AttendanceRecord>, Error>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        let mut records: Vec<_> = self
            .inner
            .lock()?
            .attendances
            .values()
            .filter(|record| filter(record))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.check_in_time);

        Ok(records)
    }
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn insert_check_in(
        &self,
        record: AttendanceRecord,
        day: DayBucket,
    ) -> Result<AttendanceRecord, Error> {
        let mut tables = self.inner.lock()?;
        // Index and table are updated under the same lock
        if !tables
            .check_ins
            .insert((record.member_id, record.class_id, day))
        {
            return Err(Error::DuplicateCheckIn {
                member_id: record.member_id,
                class_id: record.class_id,
                day: day.0,
            });
        }
        tables
            .attendances
            .insert(record.attendance_id, record.clone());

        Ok(record)
    }

    async fn insert_attendance(
        &self,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, Error> {
        self.inner
            .lock()?
            .attendances
            .insert(record.attendance_id, record.clone());

        Ok(record)
    }

    async fn get_attendance(&self, attendance_id: Uuid) -> Result<AttendanceRecord, Error> {
        self.inner
            .lock()?
            .attendances
            .get(&attendance_id)
            .cloned()
            .ok_or(Error::AttendanceNotFound(attendance_id))
    }

    async fn patch_attendance(
        &self,
        attendance_id: Uuid,
        patch: AttendancePatch,
    ) -> Result<AttendanceRecord, Error> {
        match self.inner.lock()?.attendances.entry(attendance_id) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if let Some(status) = patch.status {
                    record.status = status;
                }
                if let Some(notes) = patch.notes {
                    record.notes = Some(notes);
                }
                if let Some(manual_override) = patch.manual_override {
                    record.manual_override = manual_override;
                }
                Ok(record.clone())
            }
            Entry::Vacant(_) => Err(Error::AttendanceNotFound(attendance_id)),
        }
    }

    async fn find_member_attendance(
        &self,
        member_id: Uuid,
        class_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, Error> {
        self.select(|record| {
            record.member_id == member_id
                && class_id.map_or(true, |class_id| record.class_id == class_id)
                && record.check_in_time >= since
        })
    }

    async fn find_class_attendance(
        &self,
        class_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, Error> {
        self.select(|record| {
            record.class_id == class_id
                && record.check_in_time >= from
                && record.check_in_time < until
        })
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(pub(crate) String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AttendanceStatus;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;
    use speculoos::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, hour, minute, 0).unwrap()
    }

    fn bucket(instant: DateTime<Utc>) -> DayBucket {
        DayBucket::of(instant, Tz::UTC)
    }

    #[tokio::test]
    async fn test_insert_retrieve() {
        let database = MemoryDatabase::default();
        let record = AttendanceRecord::checked_in(Uuid::new_v4(), Uuid::new_v4(), at(19, 5));

        let res = database
            .insert_check_in(record.clone(), bucket(record.check_in_time))
            .await;
        assert_that!(res).is_ok().is_equal_to(record.clone());

        let res = database.get_attendance(record.attendance_id).await;
        assert_that!(res).is_ok().is_equal_to(record);
    }

    #[tokio::test]
    async fn test_duplicate_check_in() {
        let database = MemoryDatabase::default();
        let (member_id, class_id) = (Uuid::new_v4(), Uuid::new_v4());
        let first = AttendanceRecord::checked_in(member_id, class_id, at(19, 5));
        let second = AttendanceRecord::checked_in(member_id, class_id, at(19, 7));

        let res = database.insert_check_in(first, bucket(at(19, 5))).await;
        assert_that!(res).is_ok();

        // Same member, class and day
        let res = database
            .insert_check_in(second.clone(), bucket(at(19, 7)))
            .await;
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::DuplicateCheckIn { .. }));
        assert_that!(database.get_attendance(second.attendance_id).await).is_err();

        // A different class on the same day is fine
        let other = AttendanceRecord::checked_in(member_id, Uuid::new_v4(), at(19, 7));
        let res = database.insert_check_in(other, bucket(at(19, 7))).await;
        assert_that!(res).is_ok();
    }

    #[tokio::test]
    async fn test_concurrent_check_ins() {
        let database = MemoryDatabase::default();
        let (member_id, class_id) = (Uuid::new_v4(), Uuid::new_v4());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let database = database.clone();
                tokio::spawn(async move {
                    let record = AttendanceRecord::checked_in(member_id, class_id, at(19, 5));
                    database.insert_check_in(record, bucket(at(19, 5))).await
                })
            })
            .collect();
        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                inserted += 1;
            }
        }

        assert_that!(inserted).is_equal_to(1);
    }

    #[tokio::test]
    async fn test_manual_insert_bypasses_index() {
        let database = MemoryDatabase::default();
        let (member_id, class_id) = (Uuid::new_v4(), Uuid::new_v4());
        let record = AttendanceRecord::checked_in(member_id, class_id, at(19, 5));
        database
            .insert_check_in(record, bucket(at(19, 5)))
            .await
            .unwrap();

        let manual = AttendanceRecord {
            manual_override: true,
            ..AttendanceRecord::checked_in(member_id, class_id, at(20, 0))
        };
        let res = database.insert_attendance(manual).await;

        assert_that!(res).is_ok();
        let res = database
            .find_member_attendance(member_id, Some(class_id), at(0, 0))
            .await;
        assert_that!(res).is_ok().has_length(2);
    }

    #[tokio::test]
    async fn test_patch() {
        let database = MemoryDatabase::default();
        let record = AttendanceRecord::checked_in(Uuid::new_v4(), Uuid::new_v4(), at(19, 5));
        database.insert_attendance(record.clone()).await.unwrap();

        let res = database
            .patch_attendance(
                record.attendance_id,
                AttendancePatch {
                    status: Some(AttendanceStatus::Absent),
                    notes: None,
                    manual_override: Some(true),
                },
            )
            .await;

        assert_that!(res).is_ok().matches(|patched| {
            patched.status == AttendanceStatus::Absent
                && patched.manual_override
                && patched.notes.is_none()
                && patched.check_in_time == record.check_in_time
        });
    }

    #[tokio::test]
    async fn test_patch_missing() {
        let database = MemoryDatabase::default();

        let res = database
            .patch_attendance(Uuid::new_v4(), AttendancePatch::default())
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::AttendanceNotFound(_)));
    }

    #[tokio::test]
    async fn test_find_filters() {
        let database = MemoryDatabase::default();
        let (member_id, class_id) = (Uuid::new_v4(), Uuid::new_v4());
        for record in [
            AttendanceRecord::checked_in(member_id, class_id, at(18, 0)),
            AttendanceRecord::checked_in(member_id, class_id, at(9, 0)),
            AttendanceRecord::checked_in(member_id, Uuid::new_v4(), at(10, 0)),
            AttendanceRecord::checked_in(Uuid::new_v4(), class_id, at(11, 0)),
            AttendanceRecord::checked_in(member_id, class_id, at(9, 0) - Duration::days(1)),
        ] {
            database.insert_attendance(record).await.unwrap();
        }

        let res = database
            .find_member_attendance(member_id, Some(class_id), at(0, 0))
            .await
            .unwrap();
        assert_that!(res.iter().map(|r| r.check_in_time).collect::<Vec<_>>())
            .is_equal_to(vec![at(9, 0), at(18, 0)]);

        let res = database
            .find_member_attendance(member_id, None, at(0, 0))
            .await;
        assert_that!(res).is_ok().has_length(3);

        let res = database
            .find_class_attendance(class_id, at(9, 0), at(18, 0))
            .await;
        assert_that!(res).is_ok().has_length(2);
    }
}
