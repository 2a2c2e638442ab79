//! Shared utility functions for WSC crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{
        DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc,
    };
    use std::mem::replace;

    /// Length of a "month" when a look-back window is expressed in months.
    pub const DAYS_PER_MONTH: i64 = 30;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// First instant of a calendar day (00:00:00Z).
    pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last whole second of a calendar day (23:59:59Z).
    pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
        start_of_day(date) + TimeDelta::seconds(86_399)
    }

    /// Anything that can be reduced to the calendar day it falls on.
    ///
    /// Time-of-day components are discarded, so request windows built from
    /// instants always snap to whole days.
    pub trait CalendarDay {
        fn calendar_day(&self) -> NaiveDate;
    }

    impl CalendarDay for NaiveDate {
        fn calendar_day(&self) -> NaiveDate {
            *self
        }
    }

    impl CalendarDay for NaiveDateTime {
        fn calendar_day(&self) -> NaiveDate {
            self.date()
        }
    }

    impl CalendarDay for DateTime<Utc> {
        fn calendar_day(&self) -> NaiveDate {
            self.date_naive()
        }
    }

    /// An inclusive range of calendar days.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DateWindow {
        pub start: NaiveDate,
        pub end: NaiveDate,
    }

    impl DateWindow {
        pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
            if end < start {
                return Err(DateError(format!(
                    "window end {} precedes start {}",
                    format_date(&end),
                    format_date(&start)
                )));
            }
            Ok(Self { start, end })
        }

        /// Window ending on `end` and reaching back `months` 30-day months.
        pub fn months_back(end: NaiveDate, months: u32) -> Result<Self, DateError> {
            Self::reach_back(end, DAYS_PER_MONTH * i64::from(months))
        }

        /// Window ending on `end` and reaching back `days` days.
        pub fn days_back(end: NaiveDate, days: u32) -> Result<Self, DateError> {
            Self::reach_back(end, i64::from(days))
        }

        fn reach_back(end: NaiveDate, days: i64) -> Result<Self, DateError> {
            let start = TimeDelta::try_days(days)
                .and_then(|delta| end.checked_sub_signed(delta))
                .ok_or_else(|| {
                    DateError(format!(
                        "window of {} days before {} is out of range",
                        days,
                        format_date(&end)
                    ))
                })?;
            Ok(Self { start, end })
        }

        pub fn start_instant(&self) -> DateTime<Utc> {
            start_of_day(self.start)
        }

        pub fn end_instant(&self) -> DateTime<Utc> {
            end_of_day(self.end)
        }

        pub fn contains(&self, date: NaiveDate) -> bool {
            self.start <= date && date <= self.end
        }
    }

    /// Last calendar day of the month `date` falls in.
    pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
        date.with_day(1)?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    }

    /// Iterator over consecutive calendar-month windows.
    ///
    /// The first window starts at the cursor date and the final window is
    /// clipped to `last`, so partial months at either end are preserved.
    #[derive(Clone, Eq, PartialEq, Copy, Debug)]
    pub struct MonthWindows {
        cursor: NaiveDate,
        last: NaiveDate,
    }

    impl MonthWindows {
        pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
            Self {
                cursor: first,
                last,
            }
        }

        /// The `months` calendar months ending with the month of `today`,
        /// the current month clipped to `today`.
        pub fn trailing(today: NaiveDate, months: u32) -> Self {
            let first = today
                .with_day(1)
                .and_then(|d| d.checked_sub_months(Months::new(months.saturating_sub(1))));
            match first {
                Some(first) if months > 0 => Self::new(first, today),
                // Empty: cursor already past the end.
                _ => Self {
                    cursor: today.succ_opt().unwrap_or(today),
                    last: today.pred_opt().unwrap_or(today),
                },
            }
        }
    }

    impl Iterator for MonthWindows {
        type Item = DateWindow;
        fn next(&mut self) -> Option<Self::Item> {
            if self.cursor > self.last {
                return None;
            }
            let month_end = last_day_of_month(self.cursor)?;
            let end = month_end.min(self.last);
            let next = month_end.succ_opt().unwrap_or(NaiveDate::MAX);
            let start = replace(&mut self.cursor, next);
            Some(DateWindow { start, end })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[test]
        fn test_day_bounds() {
            let day = ymd(2024, 1, 31);
            assert_eq!(start_of_day(day).to_rfc3339(), "2024-01-31T00:00:00+00:00");
            assert_eq!(end_of_day(day).to_rfc3339(), "2024-01-31T23:59:59+00:00");
        }

        #[test]
        fn test_calendar_day_drops_time() {
            let instant = ymd(2024, 1, 1).and_hms_opt(17, 45, 3).unwrap().and_utc();
            assert_eq!(instant.calendar_day(), ymd(2024, 1, 1));
            assert_eq!(instant.naive_utc().calendar_day(), ymd(2024, 1, 1));
        }

        #[test]
        fn test_window_rejects_inverted_bounds() {
            assert!(DateWindow::new(ymd(2024, 2, 1), ymd(2024, 1, 1)).is_err());
            assert!(DateWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 1)).is_ok());
        }

        #[test]
        fn test_months_back_uses_thirty_day_months() {
            let window = DateWindow::months_back(ymd(2024, 3, 31), 2).unwrap();
            assert_eq!(window.start, ymd(2024, 1, 31));
            assert!(window.contains(ymd(2024, 2, 29)));
            assert!(!window.contains(ymd(2024, 4, 1)));
        }

        #[test]
        fn test_oversized_windows_are_errors() {
            let today = ymd(2024, 6, 15);
            assert!(DateWindow::days_back(today, u32::MAX).is_err());
            assert!(DateWindow::months_back(today, u32::MAX).is_err());
            let year = DateWindow::days_back(today, 365).unwrap();
            assert_eq!(year.start, ymd(2023, 6, 16));
        }

        #[test]
        fn test_last_day_of_month() {
            assert_eq!(last_day_of_month(ymd(2024, 2, 10)), Some(ymd(2024, 2, 29)));
            assert_eq!(last_day_of_month(ymd(2023, 12, 1)), Some(ymd(2023, 12, 31)));
        }

        #[test]
        fn test_month_windows_clip_both_ends() {
            let windows: Vec<DateWindow> =
                MonthWindows::new(ymd(2023, 11, 15), ymd(2024, 1, 10)).collect();
            assert_eq!(windows.len(), 3);
            assert_eq!(windows[0], DateWindow { start: ymd(2023, 11, 15), end: ymd(2023, 11, 30) });
            assert_eq!(windows[1], DateWindow { start: ymd(2023, 12, 1), end: ymd(2023, 12, 31) });
            assert_eq!(windows[2], DateWindow { start: ymd(2024, 1, 1), end: ymd(2024, 1, 10) });
        }

        #[test]
        fn test_trailing_months() {
            let windows: Vec<DateWindow> = MonthWindows::trailing(ymd(2024, 3, 12), 3).collect();
            assert_eq!(windows.len(), 3);
            assert_eq!(windows[0].start, ymd(2024, 1, 1));
            assert_eq!(windows[2].end, ymd(2024, 3, 12));

            assert_eq!(MonthWindows::trailing(ymd(2024, 3, 12), 0).count(), 0);
        }

        #[test]
        fn test_format_and_parse() {
            let date = ymd(2023, 6, 15);
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }
    }
}

/// Numeric helpers
pub mod numeric {
    /// Round to a fixed number of decimal places.
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
