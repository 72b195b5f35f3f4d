use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{month_start, AttendanceStatus},
    ports::{
        clock::ClockPort,
        database::DatabasePort,
        member::{self, MemberPort},
    },
};

use super::{DomainLogic, Error};

/// Number of attended sessions for a member in the current calendar month
#[derive(Clone, Debug)]
pub struct MonthlyCountRequest {
    pub member_id: Uuid,
}

impl<D, M, C> Service<MonthlyCountRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
    M: MemberPort + 'static,
    C: ClockPort,
{
    type Response = u32;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: MonthlyCountRequest) -> Self::Future {
        let database = self.database.clone();
        let member = self.member.clone();
        let now = self.clock.now();
        let club_tz = self.timezone;
        Box::pin(async move {
            let member_id = req.member_id;
            // The month follows the member's own calendar when we know it
            let tz = match member.get_member(member_id).await {
                Ok(member) => member.timezone.unwrap_or(club_tz),
                Err(member::Error::MemberDoesNotExist(_)) => club_tz,
                Err(err) => return Err(err.into()),
            };
            let since = month_start(now, tz).ok_or_else(|| {
                Error::InvalidState(format!("no month start for {now} in {tz}").into())
            })?;

            let count = database
                .find_member_attendance(member_id, None, since)
                .await?
                .iter()
                .filter(|record| record.status == AttendanceStatus::Attended)
                .count() as u32;
            debug!(%member_id, %since, count, "monthly attendance");

            Ok(count)
        })
    }
}
