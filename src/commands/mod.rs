use std::{borrow::Cow, sync::Arc};

use chrono_tz::Tz;

use crate::domain::DayBucket;

pub mod check_in;
pub mod class_roster;
pub mod history;
pub mod monthly_count;
pub mod record_attendance;
pub mod update_status;

/// Attendance logic, exposed as one [`tower::Service`] per request type
pub struct DomainLogic<D, M, C> {
    database: Arc<D>,
    member: Arc<M>,
    clock: Arc<C>,
    /// Reference timezone for day and month boundaries
    timezone: Tz,
}

impl<D, M, C> DomainLogic<D, M, C> {
    pub fn new(database: Arc<D>, member: Arc<M>, clock: Arc<C>, timezone: Tz) -> Self {
        Self {
            database,
            member,
            clock,
            timezone,
        }
    }
}

impl<D, M, C> Clone for DomainLogic<D, M, C> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            member: self.member.clone(),
            clock: self.clock.clone(),
            timezone: self.timezone,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),
    #[error("member port error: {0:?}")]
    Member(#[from] crate::ports::member::Error),

    #[error("invalid state")]
    InvalidState(Cow<'static, str>),
}

/// Error for a day whose local midnight cannot be represented
fn unrepresentable_day(day: DayBucket) -> Error {
    Error::InvalidState(format!("no local midnight for {}", day.0).into())
}
