//! Forecast window policy
//!
//! Decides whether a calendar date is close enough to today to be worth a
//! forecast lookup (fetch window) or to be shown to the user at all (display
//! window). Both predicates are pure functions of the date string and today.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dates a lookup is dispatched for: one week back, sixteen days ahead
pub const FETCH_WINDOW: ForecastWindow = ForecastWindow::new(-7, 16);

/// Dates weather is displayed for: yesterday up to two weeks ahead
pub const DISPLAY_WINDOW: ForecastWindow = ForecastWindow::new(-1, 14);

/// Inclusive range of day offsets relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub min_offset_days: i64,
    pub max_offset_days: i64,
}

impl ForecastWindow {
    #[must_use]
    pub const fn new(min_offset_days: i64, max_offset_days: i64) -> Self {
        Self {
            min_offset_days,
            max_offset_days,
        }
    }

    /// Whether `date` (YYYY-MM-DD) falls inside this window around `today`
    #[must_use]
    pub fn contains(&self, date: &str, today: NaiveDate) -> bool {
        parse_iso_date(date).is_some_and(|date| self.contains_date(date, today))
    }

    #[must_use]
    pub fn contains_date(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let offset = date.signed_duration_since(today).num_days();
        (self.min_offset_days..=self.max_offset_days).contains(&offset)
    }
}

impl Default for ForecastWindow {
    fn default() -> Self {
        FETCH_WINDOW
    }
}

/// Parse a strict `YYYY-MM-DD` date
///
/// chrono's `%Y-%m-%d` accepts unpadded fields and signed years, so the shape
/// is checked byte by byte before parsing.
#[must_use]
pub fn parse_iso_date(date: &str) -> Option<NaiveDate> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Fetch eligibility against the default window
#[must_use]
pub fn is_fetch_eligible(date: &str, today: NaiveDate) -> bool {
    FETCH_WINDOW.contains(date, today)
}

/// Display eligibility against the default window
#[must_use]
pub fn is_display_eligible(date: &str, today: NaiveDate) -> bool {
    DISPLAY_WINDOW.contains(date, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn offset(days: i64) -> String {
        (today() + Duration::days(days)).format("%Y-%m-%d").to_string()
    }

    #[rstest]
    #[case(-8, false)]
    #[case(-7, true)]
    #[case(0, true)]
    #[case(3, true)]
    #[case(16, true)]
    #[case(17, false)]
    #[case(20, false)]
    fn test_fetch_window(#[case] days: i64, #[case] expected: bool) {
        assert_eq!(is_fetch_eligible(&offset(days), today()), expected);
    }

    #[rstest]
    #[case(-2, false)]
    #[case(-1, true)]
    #[case(0, true)]
    #[case(14, true)]
    #[case(15, false)]
    fn test_display_window(#[case] days: i64, #[case] expected: bool) {
        assert_eq!(is_display_eligible(&offset(days), today()), expected);
    }

    #[test]
    fn test_fetch_eligible_but_not_displayed() {
        let date = offset(15);
        assert!(is_fetch_eligible(&date, today()));
        assert!(!is_display_eligible(&date, today()));

        let date = offset(-5);
        assert!(is_fetch_eligible(&date, today()));
        assert!(!is_display_eligible(&date, today()));
    }

    #[rstest]
    #[case("")]
    #[case("2024-5-01")]
    #[case("2024-05-1")]
    #[case("24-05-01")]
    #[case("2024/05/01")]
    #[case("2024-05-01T00:00")]
    #[case(" 2024-05-01")]
    #[case("+024-05-01")]
    #[case("2024-02-30")]
    #[case("2024-13-01")]
    #[case("not-a-date")]
    fn test_malformed_dates_are_ineligible(#[case] date: &str) {
        assert_eq!(parse_iso_date(date), None);
        assert!(!is_fetch_eligible(date, today()));
        assert!(!is_display_eligible(date, today()));
    }

    #[test]
    fn test_window_across_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert!(is_fetch_eligible("2024-03-15", today));
        assert!(!is_fetch_eligible("2024-03-16", today));
        assert!(is_fetch_eligible("2024-02-29", today));
    }

    #[test]
    fn test_custom_window() {
        let window = ForecastWindow::new(0, 2);
        assert!(window.contains(&offset(2), today()));
        assert!(!window.contains(&offset(-1), today()));
        assert!(!window.contains(&offset(3), today()));
    }
}
