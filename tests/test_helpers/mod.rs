//! Shared clock and service wiring for integration tests.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use chronicle::task::{
    ports::TaskRepository,
    services::{TaskLifecycleService, TaskReportService},
};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock that reports a fixed instant until a test moves it.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock pinned at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// A weekday well away from any daylight-saving transition.
pub fn work_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date")
}

/// Returns the instant at local wall-clock time `hour:minute` on `date`.
pub fn local_instant(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let wall_clock = date.and_hms_opt(hour, minute, 0).expect("valid time");
    Local
        .from_local_datetime(&wall_clock)
        .earliest()
        .expect("local time exists")
        .with_timezone(&Utc)
}

/// Lifecycle and report services sharing one repository and clock.
pub struct Services<R: TaskRepository> {
    pub lifecycle: TaskLifecycleService<R, FixedClock>,
    pub reports: TaskReportService<R, FixedClock>,
    pub clock: Arc<FixedClock>,
}

impl<R: TaskRepository> Services<R> {
    /// Wires both services over `repository`, with the clock at 09:00 on
    /// [`work_day`].
    pub fn new(repository: Arc<R>) -> Self {
        let clock = Arc::new(FixedClock::new(local_instant(work_day(), 9, 0)));
        Self {
            lifecycle: TaskLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
            reports: TaskReportService::new(repository, Arc::clone(&clock)),
            clock,
        }
    }

    /// Moves the clock to `hour:minute` on [`work_day`].
    pub fn at(&self, hour: u32, minute: u32) {
        self.clock.set(local_instant(work_day(), hour, minute));
    }
}
