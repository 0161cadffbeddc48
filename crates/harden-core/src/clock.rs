//! Time source for snapshot naming

use chrono::{DateTime, Local, NaiveDate};

/// Supplies the current time to the safety guard.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Calendar date used in backup names.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
