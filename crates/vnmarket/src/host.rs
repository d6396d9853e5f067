//! Fetch lifecycle around a [`ChartRenderer`].
//!
//! The host tracks `(symbol, start, end)`, issues a [`FetchTicket`] each time
//! that tuple changes and accepts a result only for the latest ticket. A
//! response that arrives after the user moved on is dropped rather than
//! rendered over newer data.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::api::price::PriceSource;
use crate::chart::renderer::ChartRenderer;
use crate::chart::surface::SurfaceFactory;
use crate::error::FetchError;
use crate::model::PriceRecord;
use crate::range::TimeRangeSelection;

pub const MISSING_PARAMETERS_MESSAGE: &str = "Missing symbol or date range.";
pub const EMPTY_MESSAGE: &str = "No price data for this selection.";

/// Inputs the host fetches for; any of them may still be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl QueryParams {
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    fn complete(&self) -> Option<(String, NaiveDate, NaiveDate)> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        Some((symbol.to_uppercase(), self.start_date?, self.end_date?))
    }
}

impl From<&TimeRangeSelection> for QueryParams {
    fn from(selection: &TimeRangeSelection) -> Self {
        Self::new(
            selection.symbol.clone(),
            selection.start_date,
            selection.end_date,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostState {
    Idle,
    MissingParameters,
    Loading,
    Error(String),
    Empty,
    Ready { records: Arc<[PriceRecord]> },
}

/// What the page shows; exactly one at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBranch {
    Idle,
    MissingParameters { message: &'static str },
    Loading,
    Error { message: String },
    Empty { message: &'static str },
    Chart { records: usize },
}

/// Permission to apply one fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request was issued, or the host unmounted
    Stale,
}

pub struct ChartHost<F: SurfaceFactory> {
    renderer: ChartRenderer<F>,
    params: Option<QueryParams>,
    generation: u64,
    state: HostState,
    mounted: bool,
}

impl<F: SurfaceFactory> ChartHost<F> {
    pub fn new(renderer: ChartRenderer<F>) -> Self {
        Self {
            renderer,
            params: None,
            generation: 0,
            state: HostState::Idle,
            mounted: true,
        }
    }

    pub fn state(&self) -> &HostState {
        &self.state
    }

    pub fn params(&self) -> Option<&QueryParams> {
        self.params.as_ref()
    }

    pub fn renderer(&self) -> &ChartRenderer<F> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut ChartRenderer<F> {
        &mut self.renderer
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn render_branch(&self) -> RenderBranch {
        match &self.state {
            HostState::Idle => RenderBranch::Idle,
            HostState::MissingParameters => RenderBranch::MissingParameters {
                message: MISSING_PARAMETERS_MESSAGE,
            },
            HostState::Loading => RenderBranch::Loading,
            HostState::Error(message) => RenderBranch::Error {
                message: message.clone(),
            },
            HostState::Empty => RenderBranch::Empty {
                message: EMPTY_MESSAGE,
            },
            HostState::Ready { records } => RenderBranch::Chart {
                records: records.len(),
            },
        }
    }

    /// Start a fetch for `params` unless it is the tuple already in flight or
    /// shown. Incomplete params move to `MissingParameters` and yield no
    /// ticket.
    pub fn request(&mut self, params: QueryParams) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        if self.params.as_ref() == Some(&params) {
            debug!(symbol = %params.symbol, "query unchanged");
            return None;
        }
        self.params = Some(params);
        self.issue()
    }

    /// Fetch the current tuple again, e.g. after an error
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if !self.mounted || self.params.is_none() {
            return None;
        }
        self.issue()
    }

    fn issue(&mut self) -> Option<FetchTicket> {
        self.generation += 1;
        self.renderer.release();

        let Some((symbol, start, end)) = self.params.as_ref().and_then(QueryParams::complete)
        else {
            self.state = HostState::MissingParameters;
            return None;
        };

        debug!(%symbol, %start, %end, generation = self.generation, "loading");
        self.state = HostState::Loading;
        Some(FetchTicket {
            generation: self.generation,
            symbol,
            start,
            end,
        })
    }

    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PriceRecord>, FetchError>,
    ) -> ApplyOutcome {
        if !self.mounted || ticket.generation != self.generation {
            debug!(
                symbol = %ticket.symbol,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            return ApplyOutcome::Stale;
        }

        self.state = match result {
            Ok(records) if records.is_empty() => {
                info!(symbol = %ticket.symbol, "no data for selection");
                HostState::Empty
            }
            Ok(mut records) => {
                // sources other than the price client may hand back any order
                records.sort_by_key(|r| r.date);
                self.mount(&ticket, records)
            }
            Err(e) => {
                warn!(symbol = %ticket.symbol, "price fetch failed: {e}");
                HostState::Error(e.user_message())
            }
        };
        ApplyOutcome::Applied
    }

    fn mount(&mut self, ticket: &FetchTicket, records: Vec<PriceRecord>) -> HostState {
        match self.renderer.build(&records) {
            Ok(()) => HostState::Ready {
                records: records.into(),
            },
            Err(e) => {
                error!(symbol = %ticket.symbol, "failed to draw chart: {e}");
                HostState::Error(format!("Unable to draw chart ({e})."))
            }
        }
    }

    /// Release surfaces and invalidate every outstanding ticket
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
        self.renderer.release();
    }
}

fn lock<F: SurfaceFactory>(host: &Mutex<ChartHost<F>>) -> MutexGuard<'_, ChartHost<F>> {
    host.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Request `params`, fetch, and apply. `None` when nothing was fetched.
pub async fn load<F, S>(
    host: &Mutex<ChartHost<F>>,
    source: &S,
    params: QueryParams,
) -> Option<ApplyOutcome>
where
    F: SurfaceFactory,
    S: PriceSource + ?Sized,
{
    let ticket = lock(host).request(params)?;
    Some(fetch_and_apply(host, source, ticket).await)
}

/// [`load`] for the current tuple, ignoring whether it changed
pub async fn reload<F, S>(host: &Mutex<ChartHost<F>>, source: &S) -> Option<ApplyOutcome>
where
    F: SurfaceFactory,
    S: PriceSource + ?Sized,
{
    let ticket = lock(host).refresh()?;
    Some(fetch_and_apply(host, source, ticket).await)
}

async fn fetch_and_apply<F, S>(
    host: &Mutex<ChartHost<F>>,
    source: &S,
    ticket: FetchTicket,
) -> ApplyOutcome
where
    F: SurfaceFactory,
    S: PriceSource + ?Sized,
{
    let result = source
        .fetch_series(&ticket.symbol, ticket.start, ticket.end)
        .await;
    lock(host).apply(ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::price::MockPriceSource;
    use crate::chart::headless::HeadlessFactory;
    use crate::chart::surface::{ChartOptions, PaneKind};
    use crate::chart::sync::Broadcaster;
    use mockall::predicate::eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn records(n: u32) -> Vec<PriceRecord> {
        (1..=n)
            .map(|d| PriceRecord {
                date: day(d),
                open: 20.0,
                high: 21.0,
                low: 19.0,
                close: 20.5,
                volume: Some(10),
                trend_q: None,
                fq: None,
            })
            .collect()
    }

    fn host(factory: HeadlessFactory) -> ChartHost<HeadlessFactory> {
        ChartHost::new(ChartRenderer::new(
            factory,
            ChartOptions::default(),
            Broadcaster::new(),
        ))
    }

    #[test]
    fn test_missing_parameters_short_circuit() {
        let mut host = host(HeadlessFactory::new());
        let ticket = host.request(QueryParams {
            symbol: "  ".to_string(),
            start_date: Some(day(1)),
            end_date: Some(day(2)),
        });
        assert_eq!(ticket, None);
        assert_eq!(
            host.render_branch(),
            RenderBranch::MissingParameters {
                message: MISSING_PARAMETERS_MESSAGE
            }
        );

        let ticket = host.request(QueryParams {
            symbol: "FPT".to_string(),
            start_date: None,
            end_date: Some(day(2)),
        });
        assert_eq!(ticket, None);
        assert_eq!(host.state(), &HostState::MissingParameters);
    }

    #[test]
    fn test_unchanged_tuple_does_not_refetch() {
        let mut host = host(HeadlessFactory::new());
        let params = QueryParams::new("VCB", day(1), day(10));
        let ticket = host.request(params.clone()).unwrap();
        assert_eq!(host.render_branch(), RenderBranch::Loading);
        assert_eq!(host.request(params), None);

        let retry = host.refresh().unwrap();
        assert!(retry.generation() > ticket.generation());
        assert_eq!(host.apply(ticket, Ok(records(3))), ApplyOutcome::Stale);
    }

    #[test]
    fn test_symbol_is_normalized_on_ticket() {
        let mut host = host(HeadlessFactory::new());
        let ticket = host.request(QueryParams::new(" hpg ", day(1), day(2))).unwrap();
        assert_eq!(ticket.symbol, "HPG");
    }

    #[test]
    fn test_apply_outcomes_are_exclusive() {
        let factory = HeadlessFactory::new();
        let mut host = host(factory.clone());

        let ticket = host.request(QueryParams::new("VNM", day(1), day(5))).unwrap();
        host.apply(ticket, Ok(records(5)));
        assert_eq!(host.render_branch(), RenderBranch::Chart { records: 5 });
        assert_eq!(host.renderer().pane_count(), 3);

        let ticket = host.request(QueryParams::new("VNM", day(1), day(6))).unwrap();
        // surfaces go away as soon as a new fetch starts
        assert!(!host.renderer().is_mounted());
        host.apply(ticket, Ok(Vec::new()));
        assert_eq!(
            host.render_branch(),
            RenderBranch::Empty {
                message: EMPTY_MESSAGE
            }
        );

        let ticket = host.request(QueryParams::new("VNM", day(2), day(6))).unwrap();
        host.apply(ticket, Err(FetchError::Transport("connection reset".to_string())));
        match host.render_branch() {
            RenderBranch::Error { message } => assert!(message.contains("connection reset")),
            other => panic!("unexpected branch {other:?}"),
        }
        assert!(!host.renderer().is_mounted());
        assert_eq!(factory.live_count(), 0);
    }

    #[test]
    fn test_construction_failure_becomes_error() {
        let factory = HeadlessFactory::new().fail_create_on(PaneKind::Volume);
        let mut host = host(factory.clone());

        let ticket = host.request(QueryParams::new("SSI", day(1), day(4))).unwrap();
        assert_eq!(host.apply(ticket, Ok(records(4))), ApplyOutcome::Applied);
        assert!(matches!(host.state(), HostState::Error(_)));
        assert_eq!(factory.live_count(), 0);
        assert_eq!(host.renderer().range_bus().listener_count(), 0);
    }

    #[test]
    fn test_unmount_invalidates_tickets() {
        let factory = HeadlessFactory::new();
        let mut host = host(factory.clone());
        let ticket = host.request(QueryParams::new("MWG", day(1), day(3))).unwrap();
        host.unmount();

        assert_eq!(host.apply(ticket, Ok(records(3))), ApplyOutcome::Stale);
        assert_eq!(factory.created_count(), 0);
        assert_eq!(host.request(QueryParams::new("MSN", day(1), day(3))), None);
        assert_eq!(host.refresh(), None);
    }

    #[tokio::test]
    async fn test_load_fetches_normalized_tuple() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_series()
            .with(eq("FPT"), eq(day(1)), eq(day(20)))
            .times(1)
            .returning(|_, _, _| Ok(records(20)));

        let host = Mutex::new(host(HeadlessFactory::new()));
        let outcome = load(&host, &source, QueryParams::new("fpt", day(1), day(20))).await;

        assert_eq!(outcome, Some(ApplyOutcome::Applied));
        assert_eq!(lock(&host).render_branch(), RenderBranch::Chart { records: 20 });
    }

    #[tokio::test]
    async fn test_load_skips_fetch_without_parameters() {
        let mut source = MockPriceSource::new();
        source.expect_fetch_series().times(0);

        let host = Mutex::new(host(HeadlessFactory::new()));
        let outcome = load(&host, &source, QueryParams::default()).await;
        assert_eq!(outcome, None);
        assert_eq!(lock(&host).state(), &HostState::MissingParameters);
    }

    #[tokio::test]
    async fn test_reload_after_error() {
        let mut source = MockPriceSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_series()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Err(FetchError::Status {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            });
        source
            .expect_fetch_series()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(records(2)));

        let host = Mutex::new(host(HeadlessFactory::new()));
        load(&host, &source, QueryParams::new("ACB", day(1), day(2))).await;
        assert!(matches!(lock(&host).state(), HostState::Error(_)));

        assert_eq!(reload(&host, &source).await, Some(ApplyOutcome::Applied));
        assert_eq!(lock(&host).render_branch(), RenderBranch::Chart { records: 2 });
    }
}
