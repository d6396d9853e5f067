//! In-memory surfaces for terminal output and tests.
//!
//! A [`HeadlessSurface`] records what it was given and keeps the visible
//! range the way a canvas chart would: fitted to the data on load, moved by
//! the user via [`HeadlessHandle::user_pan`] or by the renderer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::series::PaneSeries;
use super::surface::{
    ChartOptions, ChartSurface, LogicalRange, PaneKind, RangeKind, SurfaceFactory, TimeWindow,
    VisibleRange,
};
use super::sync::RangeEmitter;
use crate::error::SurfaceError;

#[derive(Debug, Clone, Default)]
struct HeadlessState {
    series: Option<PaneSeries>,
    time_range: Option<TimeWindow>,
    logical_range: Option<LogicalRange>,
    width: u32,
    height: u32,
    range_updates: usize,
    released: bool,
}

type SharedState = Arc<Mutex<HeadlessState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct HeadlessSurface {
    pane: PaneKind,
    state: SharedState,
    emitter: RangeEmitter,
    echo_programmatic: bool,
    fail_series: bool,
    fail_release: bool,
}

impl ChartSurface for HeadlessSurface {
    fn pane(&self) -> PaneKind {
        self.pane
    }

    fn set_series(&mut self, series: PaneSeries) -> Result<(), SurfaceError> {
        let mut state = lock(&self.state);
        if state.released {
            return Err(SurfaceError::Released {
                pane: self.pane.to_string(),
            });
        }
        if self.fail_series {
            return Err(SurfaceError::Series {
                pane: self.pane.to_string(),
                reason: "series rejected".to_string(),
            });
        }

        let times = series.times();
        state.time_range = match (times.first(), times.last()) {
            (Some(&from), Some(&to)) => Some(TimeWindow::new(from, to)),
            _ => None,
        };
        state.logical_range = times
            .len()
            .checked_sub(1)
            .map(|last| LogicalRange::new(0.0, last as f64));
        state.series = Some(series);
        Ok(())
    }

    fn visible_range(&self, kind: RangeKind) -> Option<VisibleRange> {
        let state = lock(&self.state);
        match kind {
            RangeKind::Time => state.time_range.map(VisibleRange::Time),
            RangeKind::Logical => state.logical_range.map(VisibleRange::Logical),
        }
    }

    fn set_visible_range(&mut self, range: VisibleRange) -> Result<(), SurfaceError> {
        {
            let mut state = lock(&self.state);
            if state.released {
                return Err(SurfaceError::Released {
                    pane: self.pane.to_string(),
                });
            }
            store_range(&mut state, range);
            state.range_updates += 1;
        }
        // canvas libraries fire their range callback for programmatic moves too
        if self.echo_programmatic {
            self.emitter.emit(range);
        }
        Ok(())
    }

    fn resize(&mut self, width: u32) {
        lock(&self.state).width = width;
    }

    fn release(&mut self) -> Result<(), SurfaceError> {
        if self.fail_release {
            return Err(SurfaceError::Release {
                pane: self.pane.to_string(),
                reason: "release refused".to_string(),
            });
        }
        lock(&self.state).released = true;
        Ok(())
    }
}

fn store_range(state: &mut HeadlessState, range: VisibleRange) {
    match range {
        VisibleRange::Time(window) => state.time_range = Some(window),
        VisibleRange::Logical(logical) => state.logical_range = Some(logical),
    }
}

/// Read side of a surface, kept by the factory after the renderer takes
/// ownership of the surface itself
#[derive(Clone)]
pub struct HeadlessHandle {
    pane: PaneKind,
    state: SharedState,
    emitter: RangeEmitter,
}

impl HeadlessHandle {
    pub fn pane(&self) -> PaneKind {
        self.pane
    }

    pub fn series(&self) -> Option<PaneSeries> {
        lock(&self.state).series.clone()
    }

    /// Points plotted on this pane, across all of its series
    pub fn point_count(&self) -> usize {
        match lock(&self.state).series.as_ref() {
            Some(PaneSeries::Price { candles }) => candles.len(),
            Some(PaneSeries::Indicators { trend, fq }) => trend.len().max(fq.len()),
            Some(PaneSeries::Volume { bars }) => bars.len(),
            None => 0,
        }
    }

    pub fn visible_time_range(&self) -> Option<TimeWindow> {
        lock(&self.state).time_range
    }

    pub fn visible_logical_range(&self) -> Option<LogicalRange> {
        lock(&self.state).logical_range
    }

    pub fn width(&self) -> u32 {
        lock(&self.state).width
    }

    pub fn height(&self) -> u32 {
        lock(&self.state).height
    }

    /// Programmatic range updates received so far
    pub fn range_updates(&self) -> usize {
        lock(&self.state).range_updates
    }

    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }

    /// Simulate the user scrolling or zooming this pane
    pub fn user_pan(&self, range: VisibleRange) -> bool {
        {
            let mut state = lock(&self.state);
            if state.released {
                return false;
            }
            store_range(&mut state, range);
        }
        self.emitter.emit(range)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FailurePlan {
    create: Option<PaneKind>,
    series: Option<PaneKind>,
    release: Option<PaneKind>,
}

/// Creates [`HeadlessSurface`]s and remembers a handle to each
#[derive(Clone, Default)]
pub struct HeadlessFactory {
    created: Arc<Mutex<Vec<HeadlessHandle>>>,
    echo_programmatic: bool,
    failures: FailurePlan,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces that re-emit ranges they are given
    pub fn echoing() -> Self {
        Self {
            echo_programmatic: true,
            ..Self::default()
        }
    }

    pub fn fail_create_on(mut self, pane: PaneKind) -> Self {
        self.failures.create = Some(pane);
        self
    }

    pub fn fail_series_on(mut self, pane: PaneKind) -> Self {
        self.failures.series = Some(pane);
        self
    }

    pub fn fail_release_on(mut self, pane: PaneKind) -> Self {
        self.failures.release = Some(pane);
        self
    }

    pub fn handles(&self) -> Vec<HeadlessHandle> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recently created surface for `pane`
    pub fn handle(&self, pane: PaneKind) -> Option<HeadlessHandle> {
        self.handles().into_iter().rev().find(|h| h.pane == pane)
    }

    pub fn created_count(&self) -> usize {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Surfaces created and not yet released
    pub fn live_count(&self) -> usize {
        self.handles().iter().filter(|h| !h.is_released()).count()
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(
        &mut self,
        pane: PaneKind,
        options: &ChartOptions,
        emitter: RangeEmitter,
    ) -> Result<Box<dyn ChartSurface>, SurfaceError> {
        if self.failures.create == Some(pane) {
            return Err(SurfaceError::Create {
                pane: pane.to_string(),
                reason: "container missing".to_string(),
            });
        }

        let state = Arc::new(Mutex::new(HeadlessState {
            width: options.width,
            height: options.height(pane),
            ..HeadlessState::default()
        }));
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HeadlessHandle {
                pane,
                state: Arc::clone(&state),
                emitter: emitter.clone(),
            });

        Ok(Box::new(HeadlessSurface {
            pane,
            state,
            emitter,
            echo_programmatic: self.echo_programmatic,
            fail_series: self.failures.series == Some(pane),
            fail_release: self.failures.release == Some(pane),
        }))
    }
}
