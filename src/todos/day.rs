use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::{Date, Month, OffsetDateTime, UtcOffset};

static DAY_FORMAT: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    time::format_description::parse("[year]-[month]-[day]")
        .expect("valid date format description")
});

/// A calendar day, written `YYYY-MM-DD` wherever it is stored or shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(Date);

impl CalendarDay {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Today in the local zone, or in UTC when the local offset is unknown.
    pub fn today() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self(OffsetDateTime::now_utc().to_offset(offset).date())
    }

    pub fn date(&self) -> Date {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> Month {
        self.0.month()
    }

    pub fn day(&self) -> u8 {
        self.0.day()
    }
}

impl From<Date> for CalendarDay {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.format(&*DAY_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM-DD date")]
pub struct ParseDayError(String);

impl FromStr for CalendarDay {
    type Err = ParseDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 10 {
            return Err(ParseDayError(s.to_string()));
        }
        Date::parse(trimmed, &*DAY_FORMAT)
            .map(Self)
            .map_err(|_| ParseDayError(s.to_string()))
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_iso_days() {
        let day: CalendarDay = "2024-01-02".parse().expect("valid day");
        assert_eq!(day, CalendarDay::from_ymd(2024, 1, 2).expect("valid"));
        assert_eq!(day.to_string(), "2024-01-02");
    }

    #[test]
    fn rejects_malformed_days() {
        for raw in ["2024-1-2", "2024-02-30", "yesterday", "", "2024-01-02T00:00"] {
            assert!(raw.parse::<CalendarDay>().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn serializes_as_plain_string() -> anyhow::Result<()> {
        let day = CalendarDay::from_ymd(2023, 12, 31).expect("valid");
        assert_eq!(serde_json::to_string(&day)?, "\"2023-12-31\"");
        let back: CalendarDay = serde_json::from_str("\"2023-12-31\"")?;
        assert_eq!(back, day);
        Ok(())
    }
}
