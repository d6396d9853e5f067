//! Mapping price records onto the points each pane plots

use crate::model::{Direction, PriceRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::surface::PaneKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub up: Rgba,
    pub down: Rgba,
    pub trend_line: Rgba,
    /// Alpha applied to volume bars
    pub volume_alpha: u8,
    pub background: Rgba,
    pub text: Rgba,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            up: Rgba::rgb(0x26, 0xa6, 0x9a),
            down: Rgba::rgb(0xef, 0x53, 0x50),
            trend_line: Rgba::rgb(0x29, 0x62, 0xff),
            volume_alpha: 0x80,
            background: Rgba::rgb(0xff, 0xff, 0xff),
            text: Rgba::rgb(0x33, 0x33, 0x33),
        }
    }
}

impl ChartTheme {
    pub fn direction_color(&self, direction: Direction) -> Rgba {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub time: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub direction: Direction,
    /// Body and wick colour
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub time: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub time: NaiveDate,
    pub value: f64,
    pub color: Rgba,
}

/// Data handed to one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaneSeries {
    Price { candles: Vec<CandlePoint> },
    Indicators { trend: Vec<LinePoint>, fq: Vec<HistogramPoint> },
    Volume { bars: Vec<HistogramPoint> },
}

impl PaneSeries {
    pub fn pane(&self) -> PaneKind {
        match self {
            PaneSeries::Price { .. } => PaneKind::Price,
            PaneSeries::Indicators { .. } => PaneKind::Indicators,
            PaneSeries::Volume { .. } => PaneKind::Volume,
        }
    }

    /// Dates covered by this pane, ascending
    pub fn times(&self) -> Vec<NaiveDate> {
        match self {
            PaneSeries::Price { candles } => candles.iter().map(|c| c.time).collect(),
            PaneSeries::Indicators { trend, fq } => {
                let mut times: Vec<NaiveDate> =
                    trend.iter().map(|p| p.time).chain(fq.iter().map(|p| p.time)).collect();
                times.sort_unstable();
                times.dedup();
                times
            }
            PaneSeries::Volume { bars } => bars.iter().map(|b| b.time).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PaneSeries::Price { candles } => candles.is_empty(),
            PaneSeries::Indicators { trend, fq } => trend.is_empty() && fq.is_empty(),
            PaneSeries::Volume { bars } => bars.is_empty(),
        }
    }
}

/// All plotted points derived from one record series.
///
/// Records lacking a field contribute no point to the series that needs it,
/// so sparse indicators show gaps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub candles: Vec<CandlePoint>,
    pub trend: Vec<LinePoint>,
    pub fq: Vec<HistogramPoint>,
    pub volume: Vec<HistogramPoint>,
}

impl ChartSeries {
    /// Points follow the order of `records`; callers sort by date first
    pub fn from_records(records: &[PriceRecord], theme: &ChartTheme) -> Self {
        let candles = records
            .iter()
            .map(|r| {
                let direction = r.direction();
                CandlePoint {
                    time: r.date,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    direction,
                    color: theme.direction_color(direction),
                }
            })
            .collect();

        let trend = records
            .iter()
            .filter_map(|r| r.trend_q.map(|value| LinePoint { time: r.date, value }))
            .collect();

        let fq = records
            .iter()
            .filter_map(|r| {
                r.fq.map(|value| HistogramPoint {
                    time: r.date,
                    value,
                    color: if value >= 0.0 { theme.up } else { theme.down },
                })
            })
            .collect();

        let volume = records
            .iter()
            .filter_map(|r| {
                r.volume.map(|v| HistogramPoint {
                    time: r.date,
                    value: v as f64,
                    color: theme
                        .direction_color(r.direction())
                        .with_alpha(theme.volume_alpha),
                })
            })
            .collect();

        Self {
            candles,
            trend,
            fq,
            volume,
        }
    }

    pub fn pane(&self, pane: PaneKind) -> PaneSeries {
        match pane {
            PaneKind::Price => PaneSeries::Price {
                candles: self.candles.clone(),
            },
            PaneKind::Indicators => PaneSeries::Indicators {
                trend: self.trend.clone(),
                fq: self.fq.clone(),
            },
            PaneKind::Volume => PaneSeries::Volume {
                bars: self.volume.clone(),
            },
        }
    }
}
