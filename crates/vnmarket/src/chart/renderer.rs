//! Three-pane chart built on injected surfaces.
//!
//! Panes share one horizontal axis: a range change reported by any pane is
//! applied to the other two. Resize notifications are coalesced and applied
//! on the next animation frame.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use super::series::ChartSeries;
use super::surface::{ChartOptions, ChartSurface, PaneKind, RangeKind, SurfaceFactory, VisibleRange};
use super::sync::{Broadcaster, RangeChange, RangeEmitter, Subscription, ViewportEvent};
use crate::error::SurfaceError;
use crate::model::PriceRecord;

type SharedSurface = Arc<Mutex<Box<dyn ChartSurface>>>;

fn lock(surface: &SharedSurface) -> MutexGuard<'_, Box<dyn ChartSurface>> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

struct MountedPane {
    pane: PaneKind,
    surface: SharedSurface,
}

pub struct ChartRenderer<F: SurfaceFactory> {
    factory: F,
    options: ChartOptions,
    range_bus: Broadcaster<RangeChange>,
    viewport: Broadcaster<ViewportEvent>,
    panes: Vec<MountedPane>,
    subscriptions: Vec<Subscription>,
    resize_pending: Arc<AtomicBool>,
}

impl<F: SurfaceFactory> ChartRenderer<F> {
    pub fn new(factory: F, options: ChartOptions, viewport: Broadcaster<ViewportEvent>) -> Self {
        Self {
            factory,
            options,
            range_bus: Broadcaster::new(),
            viewport,
            panes: Vec::new(),
            subscriptions: Vec::new(),
            resize_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn viewport(&self) -> &Broadcaster<ViewportEvent> {
        &self.viewport
    }

    /// Bus the panes publish range changes on
    pub fn range_bus(&self) -> &Broadcaster<RangeChange> {
        &self.range_bus
    }

    pub fn is_mounted(&self) -> bool {
        !self.panes.is_empty()
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Replace whatever is mounted with panes for `records`, in date order
    /// whatever order they arrive in.
    ///
    /// On failure every surface created so far is released and no listener
    /// stays registered.
    pub fn build(&mut self, records: &[PriceRecord]) -> Result<(), SurfaceError> {
        self.release();

        let records = date_ordered(records);
        let series = ChartSeries::from_records(&records, &self.options.theme);
        match self.mount(&series) {
            Ok(()) => {
                debug!(records = records.len(), "chart mounted");
                Ok(())
            }
            Err(e) => {
                error!("chart construction failed: {e}");
                self.release();
                Err(e)
            }
        }
    }

    fn mount(&mut self, series: &ChartSeries) -> Result<(), SurfaceError> {
        for pane in PaneKind::ALL {
            let emitter = RangeEmitter::new(self.range_bus.clone(), pane);
            let mut surface = self.factory.create(pane, &self.options, emitter)?;
            let loaded = surface.set_series(series.pane(pane));
            // tracked before the error check so it is released with the rest
            self.panes.push(MountedPane {
                pane,
                surface: Arc::new(Mutex::new(surface)),
            });
            loaded?;
        }

        for mounted in &self.panes {
            let pane = mounted.pane;
            let target = Arc::clone(&mounted.surface);
            self.subscriptions
                .push(self.range_bus.subscribe(move |change: &RangeChange| {
                    if change.origin == pane {
                        return;
                    }
                    apply_range(&target, pane, &change.range);
                }));
        }

        let pending = Arc::clone(&self.resize_pending);
        self.subscriptions
            .push(self.viewport.subscribe(move |_: &ViewportEvent| {
                pending.store(true, Ordering::Release);
            }));

        Ok(())
    }

    /// Apply `range` to `origin` and propagate it to the other panes
    pub fn set_visible_range(&self, origin: PaneKind, range: VisibleRange) -> bool {
        let Some(mounted) = self.panes.iter().find(|m| m.pane == origin) else {
            return false;
        };
        apply_range(&mounted.surface, origin, &range);
        self.range_bus.publish(&RangeChange { origin, range })
    }

    pub fn visible_range(&self, pane: PaneKind, kind: RangeKind) -> Option<VisibleRange> {
        self.panes
            .iter()
            .find(|m| m.pane == pane)
            .and_then(|m| lock(&m.surface).visible_range(kind))
    }

    /// Apply a pending resize, measuring each pane's container width.
    /// Returns whether a resize was applied.
    pub fn on_animation_frame(&self, measure: impl Fn(PaneKind) -> u32) -> bool {
        if !self.resize_pending.swap(false, Ordering::AcqRel) {
            return false;
        }
        for mounted in &self.panes {
            lock(&mounted.surface).resize(measure(mounted.pane));
        }
        true
    }

    /// Tear down every pane and listener. Each surface is released even if
    /// another one fails. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.subscriptions.clear();
        self.resize_pending.store(false, Ordering::Release);

        for mounted in self.panes.drain(..) {
            if let Err(e) = lock(&mounted.surface).release() {
                warn!(pane = %mounted.pane, "surface release failed: {e}");
            }
        }
    }
}

impl<F: SurfaceFactory> Drop for ChartRenderer<F> {
    fn drop(&mut self) {
        self.release();
    }
}

fn date_ordered(records: &[PriceRecord]) -> Cow<'_, [PriceRecord]> {
    if records.is_sorted_by_key(|r| r.date) {
        return Cow::Borrowed(records);
    }
    debug!("sorting {} records by date", records.len());
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.date);
    Cow::Owned(sorted)
}

fn apply_range(target: &SharedSurface, pane: PaneKind, range: &VisibleRange) {
    let mut surface = lock(target);
    if surface
        .visible_range(range.kind())
        .is_some_and(|current| current.same_as(range))
    {
        return;
    }
    if let Err(e) = surface.set_visible_range(*range) {
        warn!(%pane, "failed to sync visible range: {e}");
    }
}
