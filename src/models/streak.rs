use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::{Deserialize, Serialize};

/// Daily check-in streak
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub count: u32,
    /// RFC 3339 timestamp of the last check-in, empty when there was none
    #[serde(default)]
    pub last_login_date: String,
}

impl StreakRecord {
    /// Civil date of the last check-in in `tz`. Bare dates are accepted too.
    pub fn last_login_day(&self, tz: &TimeZone) -> Option<Date> {
        let raw = self.last_login_date.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(timestamp) = raw.parse::<Timestamp>() {
            return Some(timestamp.to_zoned(tz.clone()).date());
        }
        raw.parse::<Date>().ok()
    }
}
