use jiff::civil::Date;

use crate::clock::days_between;

/// Deadlines this close (inclusive) are flagged as urgent
pub const URGENT_WITHIN_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Over,
    Urgent,
    OnTrack,
}

/// Display values derived from a deadline and the resolved "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days_remaining: i64,
}

impl Countdown {
    /// Both ends are civil dates, so time of day can never shift the count.
    pub fn new(deadline: Date, today: Date) -> Self {
        Self {
            days_remaining: days_between(today, deadline),
        }
    }

    pub fn is_urgent(&self) -> bool {
        (0..=URGENT_WITHIN_DAYS).contains(&self.days_remaining)
    }

    pub fn is_over(&self) -> bool {
        self.days_remaining < 0
    }

    pub fn urgency(&self) -> Urgency {
        if self.is_over() {
            Urgency::Over
        } else if self.is_urgent() {
            Urgency::Urgent
        } else {
            Urgency::OnTrack
        }
    }
}
