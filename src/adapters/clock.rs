use chrono::{DateTime, Utc};

use crate::ports::clock::ClockPort;

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
