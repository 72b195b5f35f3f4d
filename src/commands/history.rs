use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use chrono::{DateTime, Utc};
use tower::Service;
use uuid::Uuid;

use crate::{domain::AttendanceRecord, ports::database::DatabasePort};

use super::{DomainLogic, Error};

/// A member's most recent attendance records, newest first
#[derive(Clone, Debug)]
pub struct AttendanceHistoryRequest {
    pub member_id: Uuid,
    pub limit: usize,
}

impl<D, M, C> Service<AttendanceHistoryRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<AttendanceRecord>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AttendanceHistoryRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let mut records = database
                .find_member_attendance(req.member_id, None, DateTime::<Utc>::MIN_UTC)
                .await?;
            records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
            records.truncate(req.limit);

            Ok(records)
        })
    }
}
