//! Price records as parsed from the price service

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// One trading-day observation.
///
/// Indicator fields stay `None` when the source has no value; they are
/// never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
    pub trend_q: Option<f64>,
    pub fq: Option<f64>,
}

/// Up/down classification shared by candles and volume bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `Up` when `close >= open`
    pub fn of(open: f64, close: f64) -> Self {
        if close >= open { Direction::Up } else { Direction::Down }
    }
}

impl PriceRecord {
    pub fn direction(&self) -> Direction {
        Direction::of(self.open, self.close)
    }

    /// Check the OHLC invariants
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if self.high < self.open.max(self.close) {
            return Err(format!("high {} below open/close", self.high));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!("low {} above open/close", self.low));
        }
        Ok(())
    }
}

/// Record as it arrives on the wire; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRecord {
    #[serde(default, deserialize_with = "de_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default, rename = "trendQ")]
    pub trend_q: Option<f64>,
    #[serde(default)]
    pub fq: Option<f64>,
}

impl TryFrom<RawPriceRecord> for PriceRecord {
    type Error = String;

    fn try_from(raw: RawPriceRecord) -> Result<Self, Self::Error> {
        let (Some(date), Some(open), Some(high), Some(low), Some(close)) =
            (raw.date, raw.open, raw.high, raw.low, raw.close)
        else {
            return Err("missing date or OHLC field".to_string());
        };

        let volume = raw
            .volume
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64);

        let record = PriceRecord {
            date,
            open,
            high,
            low,
            close,
            volume,
            trend_q: raw.trend_q.filter(|v| v.is_finite()),
            fq: raw.fq.filter(|v| v.is_finite()),
        };
        record.validate()?;
        Ok(record)
    }
}

/// Convert wire records, dropping the unusable ones, and order by date.
///
/// Duplicate dates keep the record that arrived last.
pub fn normalize_records(raw: Vec<RawPriceRecord>) -> Vec<PriceRecord> {
    let mut records: Vec<PriceRecord> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| match PriceRecord::try_from(raw) {
            Ok(record) => Some(record),
            Err(reason) => {
                tracing::warn!(index = idx, "dropping price record: {reason}");
                None
            }
        })
        .collect();

    // stable sort keeps arrival order among equal dates
    records.sort_by_key(|r| r.date);

    let mut deduped: Vec<PriceRecord> = Vec::with_capacity(records.len());
    for record in records {
        match deduped.last_mut() {
            Some(last) if last.date == record.date => *last = record,
            _ => deduped.push(record),
        }
    }
    deduped
}

fn de_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_date))
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|dt| dt.date())
}
