use chrono::{Duration, NaiveDate};

/// An inclusive range of calendar dates to collect data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CollectionWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` days leading up to and including `end`.
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// `YYYY-MM-DD` bounds, as the OpenAQ API expects them.
    pub fn iso_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }

    /// `YYYYMMDD` bounds, as the AQS API expects them.
    pub fn compact_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}
