use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use serde::Serialize;
use tower::Service;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, DayBucket},
    ports::{
        clock::ClockPort,
        database::{self, DatabasePort},
        member::{self, MemberPort},
    },
};

use super::{unrepresentable_day, DomainLogic, Error};

pub const ALREADY_CHECKED_IN: &str = "Already checked in today";

#[derive(Clone, Debug)]
pub struct CheckInRequest {
    pub member_id: Uuid,
    /// Class identifier, usually scanned from the class QR code
    pub class_id: Uuid,
}

/// Outcome of a check-in
///
/// A duplicate check-in is a normal outcome with `success == false`, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_id: Option<Uuid>,
}

impl CheckInResponse {
    pub fn checked_in(attendance_id: Uuid) -> Self {
        Self {
            success: true,
            message: None,
            attendance_id: Some(attendance_id),
        }
    }

    pub fn already_checked_in() -> Self {
        Self {
            success: false,
            message: Some(ALREADY_CHECKED_IN.to_string()),
            attendance_id: None,
        }
    }
}

impl<D, M, C> Service<CheckInRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
    M: MemberPort + 'static,
    C: ClockPort,
{
    type Response = CheckInResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CheckInRequest) -> Self::Future {
        let database = self.database.clone();
        let member = self.member.clone();
        let now = self.clock.now();
        let tz = self.timezone;
        Box::pin(async move {
            let CheckInRequest {
                member_id,
                class_id,
            } = req;
            let day = DayBucket::of(now, tz);
            let today_start = day.start(tz).ok_or_else(|| unrepresentable_day(day))?;

            // Any record for this class since midnight blocks the check-in
            let existing = database
                .find_member_attendance(member_id, Some(class_id), today_start)
                .await?;
            if !existing.is_empty() {
                warn!(%member_id, %class_id, "already checked in today");
                return Ok(CheckInResponse::already_checked_in());
            }

            // The store enforces one check-in per member, class and day, so a concurrent
            // check-in that slipped past the query above ends up here.
            let record = AttendanceRecord::checked_in(member_id, class_id, now);
            let record = match database.insert_check_in(record, day).await {
                Ok(record) => record,
                Err(database::Error::DuplicateCheckIn { .. }) => {
                    warn!(%member_id, %class_id, "lost check-in race");
                    return Ok(CheckInResponse::already_checked_in());
                }
                Err(err) => return Err(err.into()),
            };

            match member.increment_total_sessions(member_id, now).await {
                Ok(updated) => info!(
                    %member_id,
                    %class_id,
                    attendance_id = %record.attendance_id,
                    total_sessions = updated.total_sessions,
                    "checked in"
                ),
                // The record stays, only the counter is skipped
                Err(member::Error::MemberDoesNotExist(_)) => warn!(
                    %member_id,
                    attendance_id = %record.attendance_id,
                    "checked in unknown member, session counter not updated"
                ),
                Err(err) => return Err(err.into()),
            }

            Ok(CheckInResponse::checked_in(record.attendance_id))
        })
    }
}
