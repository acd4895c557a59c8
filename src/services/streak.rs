use crate::{
    clock::{Clock, StreakTransition, check_streak},
    models::streak::StreakRecord,
    storage::{Storage, StorageError, load_document, save_document},
};

pub const STREAK_KEY: &str = "solomon_streak";

pub struct CheckIn {
    pub record: StreakRecord,
    pub transition: StreakTransition,
}

/// Records today's visit and returns the resulting streak.
///
/// Nothing is written when today was already counted.
pub fn check_in(storage: &impl Storage, clock: &impl Clock) -> Result<CheckIn, StorageError> {
    let current: StreakRecord = load_document(storage, STREAK_KEY)?.unwrap_or_default();
    let now = clock.now();
    let last_day = current.last_login_day(&clock.time_zone());

    let transition = check_streak(last_day, now.date());
    let count = match transition {
        StreakTransition::AlreadyCounted => {
            return Ok(CheckIn {
                record: current,
                transition,
            });
        }
        StreakTransition::Continue => current.count.saturating_add(1),
        StreakTransition::Start | StreakTransition::Reset => 1,
    };

    let record = StreakRecord {
        count,
        last_login_date: now.timestamp().display_with_offset(now.offset()).to_string(),
    };
    save_document(storage, STREAK_KEY, &record)?;
    tracing::debug!(count, ?transition, "streak updated");

    Ok(CheckIn { record, transition })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{Timestamp, civil::date};

    use crate::{clock::FixedClock, storage::memory::MemoryStorage};

    #[test]
    fn test_first_check_in_starts_streak() {
        let storage = MemoryStorage::default();
        let result = check_in(&storage, &FixedClock::on(date(2025, 3, 10))).unwrap();

        assert_eq!(result.transition, StreakTransition::Start);
        assert_eq!(result.record.count, 1);
        assert!(result.record.last_login_date.parse::<Timestamp>().is_ok());
    }

    #[test]
    fn test_consecutive_days_extend_streak() {
        let storage = MemoryStorage::default();
        check_in(&storage, &FixedClock::on(date(2025, 3, 10))).unwrap();
        let same_day = check_in(&storage, &FixedClock::on(date(2025, 3, 10))).unwrap();
        let next_day = check_in(&storage, &FixedClock::on(date(2025, 3, 11))).unwrap();

        assert_eq!(same_day.transition, StreakTransition::AlreadyCounted);
        assert_eq!(same_day.record.count, 1);
        assert_eq!(next_day.transition, StreakTransition::Continue);
        assert_eq!(next_day.record.count, 2);
    }

    #[test]
    fn test_missed_day_resets_streak() {
        let storage = MemoryStorage::default();
        check_in(&storage, &FixedClock::on(date(2025, 3, 10))).unwrap();
        check_in(&storage, &FixedClock::on(date(2025, 3, 11))).unwrap();
        let result = check_in(&storage, &FixedClock::on(date(2025, 3, 14))).unwrap();

        assert_eq!(result.transition, StreakTransition::Reset);
        assert_eq!(result.record.count, 1);
    }

    #[test]
    fn test_corrupt_streak_starts_over() {
        let storage = MemoryStorage::default();
        storage.write(STREAK_KEY, "not json").unwrap();

        let result = check_in(&storage, &FixedClock::on(date(2025, 3, 10))).unwrap();
        assert_eq!(result.transition, StreakTransition::Start);
    }
}
