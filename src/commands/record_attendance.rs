use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use chrono::{DateTime, Utc};
use tower::Service;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, AttendanceStatus},
    ports::{
        clock::ClockPort,
        database::DatabasePort,
        member::{self, MemberPort},
    },
};

use super::{DomainLogic, Error};

/// Attendance entered by a coach, e.g. for a member who forgot to scan
///
/// Unlike a check-in, this is not limited to one record per day.
#[derive(Clone, Debug)]
pub struct RecordAttendanceRequest {
    pub member_id: Uuid,
    pub class_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl<D, M, C> Service<RecordAttendanceRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
    M: MemberPort + 'static,
    C: ClockPort,
{
    type Response = AttendanceRecord;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RecordAttendanceRequest) -> Self::Future {
        let database = self.database.clone();
        let member = self.member.clone();
        let now = self.clock.now();
        Box::pin(async move {
            let record = database
                .insert_attendance(AttendanceRecord {
                    attendance_id: Uuid::new_v4(),
                    member_id: req.member_id,
                    class_id: req.class_id,
                    check_in_time: req.check_in_time,
                    status: req.status,
                    created_at: now,
                    notes: req.notes,
                    manual_override: true,
                })
                .await?;
            info!(
                member_id = %record.member_id,
                class_id = %record.class_id,
                attendance_id = %record.attendance_id,
                status = ?record.status,
                "attendance recorded manually"
            );

            if record.status == AttendanceStatus::Attended {
                match member.increment_total_sessions(record.member_id, now).await {
                    Ok(_) => {}
                    Err(member::Error::MemberDoesNotExist(member_id)) => warn!(
                        %member_id,
                        "recorded attendance for unknown member, session counter not updated"
                    ),
                    Err(err) => return Err(err.into()),
                }
            }

            Ok(record)
        })
    }
}
