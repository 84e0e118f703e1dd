//! Local wall clock

use chrono::{Local, NaiveDateTime};

use crate::traits::Clock;

/// Clock reading the host's local time
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
