//! Source of "today" for the window policy

use chrono::{Local, NaiveDate};

/// Supplies the local calendar day lookups are measured against
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one day, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
