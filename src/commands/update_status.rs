use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, AttendanceStatus},
    ports::database::{AttendancePatch, DatabasePort},
};

use super::{DomainLogic, Error};

/// Coach correction of an attendance record
#[derive(Clone, Debug)]
pub struct UpdateStatusRequest {
    pub attendance_id: Uuid,
    pub status: AttendanceStatus,
    /// Replaces the existing notes when set
    pub notes: Option<String>,
}

impl<D, M, C> Service<UpdateStatusRequest> for DomainLogic<D, M, C>
where
    D: DatabasePort + 'static,
{
    type Response = AttendanceRecord;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UpdateStatusRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let patch = AttendancePatch {
                status: Some(req.status),
                notes: req.notes,
                manual_override: Some(true),
            };
            // Unknown ids surface as `AttendanceNotFound`
            let record = database.patch_attendance(req.attendance_id, patch).await?;
            info!(
                attendance_id = %record.attendance_id,
                status = ?record.status,
                "attendance status overridden"
            );

            Ok(record)
        })
    }
}
