//! The `Clock` collaborator interface (`spec.md` §4.7 / §6): defines the
//! "working day" used as the default date for all writes.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// A working day rolls over at 02:00 local time, not midnight: an event at
/// 01:30 on Dec 3 belongs to Dec 2. See `spec.md` §3 (DateKey semantics).
pub fn working_date_of(now: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    now.with_timezone(&tz).checked_sub_signed(Duration::hours(2)).unwrap().date_naive()
}

/// Collaborator interface the core consumes for "now" and the working date.
/// Tenants share a single platform timezone today (`spec.md` §4.7: "per-tenant
/// tz is a future extension").
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn tz(&self) -> FixedOffset;

    fn working_date(&self) -> NaiveDate {
        working_date_of(self.now(), self.tz())
    }
}

/// Wall-clock `Clock` backed by `Utc::now()` and a fixed platform offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: FixedOffset,
}

impl SystemClock {
    pub fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn tz(&self) -> FixedOffset {
        self.tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_rolls_over_at_02_00_not_midnight() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let before_rollover = tz.with_ymd_and_hms(2025, 12, 3, 1, 30, 0).unwrap();
        let after_rollover = tz.with_ymd_and_hms(2025, 12, 3, 2, 0, 0).unwrap();

        assert_eq!(
            working_date_of(before_rollover.with_timezone(&Utc), tz),
            NaiveDate::from_ymd_opt(2025, 12, 2).unwrap()
        );
        assert_eq!(
            working_date_of(after_rollover.with_timezone(&Utc), tz),
            NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()
        );
    }
}
