//! Drawing-surface abstraction the renderer builds panes on

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::series::{ChartTheme, PaneSeries, Rgba};
use super::sync::RangeEmitter;
use crate::error::SurfaceError;

/// The three stacked panes, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneKind {
    Price,
    Indicators,
    Volume,
}

impl PaneKind {
    pub const ALL: [PaneKind; 3] = [PaneKind::Price, PaneKind::Indicators, PaneKind::Volume];

    pub fn as_str(self) -> &'static str {
        match self {
            PaneKind::Price => "price",
            PaneKind::Indicators => "indicators",
            PaneKind::Volume => "volume",
        }
    }
}

impl fmt::Display for PaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrosshairMode {
    /// Follows the pointer freely
    Normal,
    /// Snaps to the nearest data point
    Magnet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosshairOptions {
    pub mode: CrosshairMode,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    pub vertical: bool,
    pub horizontal: bool,
    pub color: Rgba,
}

/// Shared construction options for every pane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub theme: ChartTheme,
    pub grid: GridOptions,
    pub crosshair: CrosshairOptions,
    pub width: u32,
    pub price_height: u32,
    pub indicator_height: u32,
    pub volume_height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        let line = Rgba::rgb(0xe0, 0xe3, 0xeb);
        Self {
            theme: ChartTheme::default(),
            grid: GridOptions {
                vertical: true,
                horizontal: true,
                color: line,
            },
            crosshair: CrosshairOptions {
                mode: CrosshairMode::Normal,
                color: Rgba::rgb(0x75, 0x86, 0x96),
            },
            width: 800,
            price_height: 400,
            indicator_height: 150,
            volume_height: 120,
        }
    }
}

impl ChartOptions {
    pub fn height(&self, pane: PaneKind) -> u32 {
        match pane {
            PaneKind::Price => self.price_height,
            PaneKind::Indicators => self.indicator_height,
            PaneKind::Volume => self.volume_height,
        }
    }
}

/// Calendar window shown on the time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl TimeWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Fractional bar-index window, which also covers scrolled-past-the-edge
/// positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    const EPSILON: f64 = 1e-6;

    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn approx_eq(&self, other: &LogicalRange) -> bool {
        (self.from - other.from).abs() < Self::EPSILON && (self.to - other.to).abs() < Self::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Time,
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisibleRange {
    Time(TimeWindow),
    Logical(LogicalRange),
}

impl VisibleRange {
    pub fn kind(&self) -> RangeKind {
        match self {
            VisibleRange::Time(_) => RangeKind::Time,
            VisibleRange::Logical(_) => RangeKind::Logical,
        }
    }

    /// Equal up to float noise on logical ranges
    pub fn same_as(&self, other: &VisibleRange) -> bool {
        match (self, other) {
            (VisibleRange::Time(a), VisibleRange::Time(b)) => a == b,
            (VisibleRange::Logical(a), VisibleRange::Logical(b)) => a.approx_eq(b),
            _ => false,
        }
    }
}

/// One mounted pane.
///
/// Surfaces report user-driven range changes through the [`RangeEmitter`]
/// they were created with. They may also report programmatic changes; the
/// renderer tolerates both.
pub trait ChartSurface: Send {
    fn pane(&self) -> PaneKind;

    fn set_series(&mut self, series: PaneSeries) -> Result<(), SurfaceError>;

    /// Currently visible range of the requested kind, if any data is shown
    fn visible_range(&self, kind: RangeKind) -> Option<VisibleRange>;

    fn set_visible_range(&mut self, range: VisibleRange) -> Result<(), SurfaceError>;

    fn resize(&mut self, width: u32);

    /// Dispose of the surface. Calling it twice must not fail.
    fn release(&mut self) -> Result<(), SurfaceError>;
}

/// Creates surfaces for a renderer
pub trait SurfaceFactory: Send {
    fn create(
        &mut self,
        pane: PaneKind,
        options: &ChartOptions,
        emitter: RangeEmitter,
    ) -> Result<Box<dyn ChartSurface>, SurfaceError>;
}
