//! Number formatting and table sorting for display

use std::cmp::Ordering;

const MISSING: &str = "-";

/// `12.35%`; `-` when the value is missing or not finite
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.decimals$}%"),
        None => MISSING.to_string(),
    }
}

/// Like [`format_percent`] with an explicit `+` on gains
pub fn format_signed_percent(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) if v > 0.0 => format!("+{v:.decimals$}%"),
        other => format_percent(other, decimals),
    }
}

/// `1,234,567`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Price with thousands separators and `decimals` fraction digits
pub fn format_price(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let formatted = format!("{:.decimals$}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let sign = if value < 0.0 { "-" } else { "" };
    let whole = whole.parse::<u64>().map_or_else(|_| whole.to_string(), format_thousands);
    if fraction.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction}")
    }
}

/// Large amounts as `1.25T`, `3.40B`, `12.00M`, `5.50K`
pub fn format_compact(amount: f64) -> String {
    if !amount.is_finite() {
        return MISSING.to_string();
    }
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };

    if abs >= 1_000_000_000_000.0 {
        format!("{sign}{:.2}T", abs / 1_000_000_000_000.0)
    } else if abs >= 1_000_000_000.0 {
        format!("{sign}{:.2}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{sign}{:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}{:.2}K", abs / 1_000.0)
    } else {
        format!("{sign}{abs:.2}")
    }
}

/// Percentage change from `from` to `to`; `None` when `from` is zero
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        return None;
    }
    Some((to - from) / from.abs() * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Column sort state for a clickable table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: Copy + PartialEq> SortState<C> {
    pub fn new(column: C) -> Self {
        Self {
            column,
            direction: SortDirection::default(),
        }
    }

    /// Same column flips direction; a new column starts descending
    pub fn toggle(&mut self, column: C) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }

    pub fn sort_rows<R, K, F>(&self, rows: &mut [R], key: F)
    where
        K: PartialOrd,
        F: Fn(&R, C) -> Option<K>,
    {
        sort_rows(rows, self.direction, |row| key(row, self.column));
    }
}

/// Stable sort by `key`; rows without a key always go last
pub fn sort_rows<R, K, F>(rows: &mut [R], direction: SortDirection, key: F)
where
    K: PartialOrd,
    F: Fn(&R) -> Option<K>,
{
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(12.346), 2), "12.35%");
        assert_eq!(format_percent(Some(-3.0), 1), "-3.0%");
        assert_eq!(format_percent(None, 2), "-");
        assert_eq!(format_percent(Some(f64::NAN), 2), "-");
        assert_eq!(format_signed_percent(Some(1.5), 1), "+1.5%");
        assert_eq!(format_signed_percent(Some(0.0), 1), "0.0%");
        assert_eq!(format_signed_percent(Some(-1.5), 1), "-1.5%");
    }

    #[test]
    fn test_format_thousands_and_price() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(12_345_678), "12,345,678");
        assert_eq!(format_price(1_287.456, 2), "1,287.46");
        assert_eq!(format_price(-25_300.0, 0), "-25,300");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(1_250_000_000_000.0), "1.25T");
        assert_eq!(format_compact(-3_400_000_000.0), "-3.40B");
        assert_eq!(format_compact(512.0), "512.00");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 110.0), Some(10.0));
        assert_eq!(percent_change(-50.0, -25.0), Some(50.0));
        assert_eq!(percent_change(0.0, 1.0), None);
    }

    #[test]
    fn test_toggle() {
        let mut state = SortState::new("pe");
        assert_eq!(state.direction, SortDirection::Descending);
        state.toggle("pe");
        assert_eq!(state.direction, SortDirection::Ascending);
        state.toggle("roe");
        assert_eq!(state, SortState { column: "roe", direction: SortDirection::Descending });
    }

    #[test]
    fn test_missing_values_sort_last_both_ways() {
        let mut rows = vec![("a", Some(3.0)), ("b", None), ("c", Some(1.0)), ("d", Some(2.0))];

        sort_rows(&mut rows, SortDirection::Ascending, |r| r.1);
        assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), ["c", "d", "a", "b"]);

        sort_rows(&mut rows, SortDirection::Descending, |r| r.1);
        assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), ["a", "d", "c", "b"]);
    }

    #[test]
    fn test_sort_state_sorts_by_column() {
        struct Row {
            pe: Option<f64>,
            roe: Option<f64>,
        }
        let mut rows = vec![
            Row { pe: Some(9.0), roe: None },
            Row { pe: Some(15.0), roe: Some(0.2) },
        ];
        let mut state = SortState::new("roe");
        let key = |row: &Row, column: &str| match column {
            "pe" => row.pe,
            _ => row.roe,
        };

        state.sort_rows(&mut rows, key);
        assert_eq!(rows[0].roe, Some(0.2));

        state.toggle("pe");
        state.sort_rows(&mut rows, key);
        assert_eq!(rows[0].pe, Some(15.0));
    }
}
