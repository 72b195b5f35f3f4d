use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use chrono::NaiveDate;
use tower::Service;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, DayBucket},
    ports::database::DatabasePort,
};

use super::{unrepresentable_day, DomainLogic, Error};

/// Everyone recorded for a class on a given day, in check-in order
#[derive(Clone, Debug)]
pub struct ClassRosterRequest {
    pub class_id: Uuid,
    /// Calendar day in the club timezone
    pub day: NaiveDate,
}

impl<D, M, C> Service<ClassRosterRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<AttendanceRecord>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ClassRosterRequest) -> Self::Future {
        let database = self.database.clone();
        let tz = self.timezone;
        Box::pin(async move {
            let day = DayBucket(req.day);
            let from = day.start(tz).ok_or_else(|| unrepresentable_day(day))?;
            let until = day.end(tz).ok_or_else(|| unrepresentable_day(day))?;

            let mut roster = database
                .find_class_attendance(req.class_id, from, until)
                .await?;
            roster.sort_by_key(|record| record.check_in_time);
            debug!(class_id = %req.class_id, day = %req.day, size = roster.len(), "class roster");

            Ok(roster)
        })
    }
}
