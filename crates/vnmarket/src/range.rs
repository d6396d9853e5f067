//! Symbolic chart ranges and their resolution to calendar dates

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Start date used by the `all` range
pub const EPOCH_FLOOR: NaiveDate = match NaiveDate::from_ymd_opt(2010, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Range selector offered by the chart toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeLabel {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "all")]
    All,
}

impl RangeLabel {
    pub const ALL: [RangeLabel; 7] = [
        RangeLabel::OneDay,
        RangeLabel::OneWeek,
        RangeLabel::OneMonth,
        RangeLabel::ThreeMonths,
        RangeLabel::SixMonths,
        RangeLabel::OneYear,
        RangeLabel::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RangeLabel::OneDay => "1d",
            RangeLabel::OneWeek => "1w",
            RangeLabel::OneMonth => "1m",
            RangeLabel::ThreeMonths => "3m",
            RangeLabel::SixMonths => "6m",
            RangeLabel::OneYear => "1y",
            RangeLabel::All => "all",
        }
    }

    /// Start of the window ending at `reference`, or `None` when the
    /// calendar arithmetic falls outside chrono's range.
    fn start_from(self, reference: NaiveDate) -> Option<NaiveDate> {
        match self {
            RangeLabel::OneDay => reference.checked_sub_days(Days::new(1)),
            RangeLabel::OneWeek => reference.checked_sub_days(Days::new(7)),
            RangeLabel::OneMonth => reference.checked_sub_months(Months::new(1)),
            RangeLabel::ThreeMonths => reference.checked_sub_months(Months::new(3)),
            RangeLabel::SixMonths => reference.checked_sub_months(Months::new(6)),
            RangeLabel::OneYear => reference.checked_sub_months(Months::new(12)),
            RangeLabel::All => Some(EPOCH_FLOOR.min(reference)),
        }
    }
}

impl fmt::Display for RangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(RangeLabel::OneDay),
            "1w" => Ok(RangeLabel::OneWeek),
            "1m" => Ok(RangeLabel::OneMonth),
            "3m" => Ok(RangeLabel::ThreeMonths),
            "6m" => Ok(RangeLabel::SixMonths),
            "1y" => Ok(RangeLabel::OneYear),
            "all" => Ok(RangeLabel::All),
            other => Err(format!("unknown range: {other}")),
        }
    }
}

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolve a range label against `reference` (today).
///
/// Never fails: an unknown label, or arithmetic that cannot be represented,
/// yields the one-month-back window instead.
pub fn resolve(range: &str, reference: NaiveDate) -> DateWindow {
    let start = match range.parse::<RangeLabel>() {
        Ok(label) => label.start_from(reference),
        Err(e) => {
            tracing::warn!("{e}, falling back to one month");
            None
        }
    };

    DateWindow {
        start: start.unwrap_or_else(|| fallback_start(reference)),
        end: reference,
    }
}

/// Resolve an already-parsed label
pub fn resolve_label(label: RangeLabel, reference: NaiveDate) -> DateWindow {
    DateWindow {
        start: label
            .start_from(reference)
            .unwrap_or_else(|| fallback_start(reference)),
        end: reference,
    }
}

fn fallback_start(reference: NaiveDate) -> NaiveDate {
    reference
        .checked_sub_months(Months::new(1))
        .or_else(|| reference.checked_sub_days(Days::new(30)))
        .unwrap_or(reference)
}

/// Symbol plus concrete date window; `start_date <= end_date <= today`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRangeSelection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TimeRangeSelection {
    pub fn new(symbol: impl Into<String>, range: &str, today: NaiveDate) -> Self {
        let window = resolve(range, today);
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            start_date: window.start,
            end_date: window.end,
        }
    }

    /// `startDate`/`endDate` as ISO dates, the shape the price service expects
    pub fn query_params(&self) -> [(&'static str, String); 3] {
        [
            ("symbol", self.symbol.clone()),
            ("startDate", self.start_date.format("%Y-%m-%d").to_string()),
            ("endDate", self.end_date.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_every_label_ends_today_and_starts_before() {
        let today = date(2024, 3, 31);
        for label in RangeLabel::ALL {
            let window = resolve(label.as_str(), today);
            assert_eq!(window.end, today, "{label}");
            assert!(window.start <= window.end, "{label}");
        }
    }

    #[test]
    fn test_offsets() {
        let today = date(2024, 3, 31);
        assert_eq!(resolve("1d", today).start, date(2024, 3, 30));
        assert_eq!(resolve("1w", today).start, date(2024, 3, 24));
        // month arithmetic clamps to the last valid day
        assert_eq!(resolve("1m", today).start, date(2024, 2, 29));
        assert_eq!(resolve("3m", today).start, date(2023, 12, 31));
        assert_eq!(resolve("6m", today).start, date(2023, 9, 30));
        assert_eq!(resolve("1y", today).start, date(2023, 3, 31));
        assert_eq!(resolve("all", today).start, EPOCH_FLOOR);
    }

    #[test]
    fn test_unknown_label_falls_back_to_one_month() {
        let today = date(2024, 5, 15);
        assert_eq!(resolve("5y", today), resolve("1m", today));
        assert_eq!(resolve("", today).start, date(2024, 4, 15));
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        assert_eq!("ALL".parse::<RangeLabel>(), Ok(RangeLabel::All));
        assert_eq!(" 3M ".parse::<RangeLabel>(), Ok(RangeLabel::ThreeMonths));
    }

    #[test]
    fn test_all_before_floor_is_clamped() {
        let today = date(2009, 6, 1);
        let window = resolve("all", today);
        assert_eq!(window.start, today);
        assert_eq!(window.end, today);
    }

    #[test]
    fn test_arithmetic_underflow_falls_back() {
        let window = resolve_label(RangeLabel::OneYear, NaiveDate::MIN);
        assert!(window.start <= window.end);
        assert_eq!(window.start, NaiveDate::MIN);
    }

    #[test]
    fn test_selection_query_params() {
        let selection = TimeRangeSelection::new(" vnindex ", "1m", date(2024, 5, 15));
        assert_eq!(selection.symbol, "VNINDEX");
        let params = selection.query_params();
        assert_eq!(params[1], ("startDate", "2024-04-15".to_string()));
        assert_eq!(params[2], ("endDate", "2024-05-15".to_string()));
    }
}
