//! "Today" in a fixed civil timezone, and the day arithmetic built on it.

use jiff::{Zoned, civil::Date, tz::TimeZone};

/// Hackathon deadlines and streaks are evaluated in India Standard Time unless configured otherwise
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

pub trait Clock {
    fn now(&self) -> Zoned;

    fn time_zone(&self) -> TimeZone {
        self.now().time_zone().clone()
    }

    fn today(&self) -> Date {
        self.now().date()
    }
}

pub struct SystemClock {
    tz: TimeZone,
}

impl SystemClock {
    pub fn new(tz: TimeZone) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Zoned::now().with_time_zone(self.tz.clone())
    }

    fn time_zone(&self) -> TimeZone {
        self.tz.clone()
    }
}

#[cfg(test)]
pub struct FixedClock {
    now: Zoned,
}

#[cfg(test)]
impl FixedClock {
    /// Noon on `day`, UTC
    pub fn on(day: Date) -> Self {
        let now = day
            .at(12, 0, 0, 0)
            .to_zoned(TimeZone::UTC)
            .expect("test dates are in range");
        Self { now }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.now.clone()
    }
}

/// Whole civil days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).get_days() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// No previous check-in
    Start,
    /// Already checked in today
    AlreadyCounted,
    /// Previous check-in was yesterday
    Continue,
    /// A day or more was missed, or the clock went backwards
    Reset,
}

pub fn check_streak(last_login: Option<Date>, today: Date) -> StreakTransition {
    let Some(last_login) = last_login else {
        return StreakTransition::Start;
    };

    match days_between(last_login, today) {
        0 => StreakTransition::AlreadyCounted,
        1 => StreakTransition::Continue,
        _ => StreakTransition::Reset,
    }
}
