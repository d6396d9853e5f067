//! Synchronized price / indicator / volume chart

pub mod headless;
pub mod renderer;
pub mod series;
pub mod surface;
pub mod sync;

pub use headless::{HeadlessFactory, HeadlessHandle, HeadlessSurface};
pub use renderer::ChartRenderer;
pub use series::{CandlePoint, ChartSeries, ChartTheme, HistogramPoint, LinePoint, PaneSeries, Rgba};
pub use surface::{
    ChartOptions, ChartSurface, CrosshairMode, CrosshairOptions, GridOptions, LogicalRange,
    PaneKind, RangeKind, SurfaceFactory, TimeWindow, VisibleRange,
};
pub use sync::{Broadcaster, RangeChange, RangeEmitter, Subscription, ViewportEvent};
