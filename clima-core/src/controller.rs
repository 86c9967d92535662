//! Query pipeline: lookup → normalize → publish forecast → restart clock.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    clock::{ClockHandle, ClockSink, LocalClock},
    error::{ClimaError, Result},
    model::{Coordinates, DayCount, LocationQuery, NormalizedForecast},
    normalize::normalize,
    provider::ForecastProvider,
};

/// State of the live clock after a forecast was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockStatus {
    Live(ClockHandle),
    /// The forecast is shown without a ticking clock.
    Degraded(ClimaError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Applied {
        forecast: Arc<NormalizedForecast>,
        clock: ClockStatus,
    },
    /// A newer query was applied while this one was in flight; its response
    /// was dropped.
    Stale { seq: u64, newest: u64 },
}

#[derive(Debug, Default)]
struct Selection {
    /// Sequence number of the newest applied response.
    seq: u64,
    query: Option<LocationQuery>,
}

/// Owns the selected location, the displayed forecast and the live clock.
///
/// Queries may run concurrently. Each is tagged with a sequence number when
/// issued, and a response older than the newest applied one is discarded, so
/// the forecast and clock always belong to the most recently submitted query
/// that has answered.
#[derive(Debug)]
pub struct QueryController {
    provider: Arc<dyn ForecastProvider>,
    clock: LocalClock,
    forecast_tx: watch::Sender<Option<Arc<NormalizedForecast>>>,
    next_seq: AtomicU64,
    selection: Mutex<Selection>,
}

impl QueryController {
    pub fn new(provider: Arc<dyn ForecastProvider>, clock_sink: Arc<dyn ClockSink>) -> Self {
        Self::with_clock(provider, LocalClock::new(clock_sink))
    }

    pub fn with_clock(provider: Arc<dyn ForecastProvider>, clock: LocalClock) -> Self {
        let (forecast_tx, _) = watch::channel(None);
        Self {
            provider,
            clock,
            forecast_tx,
            next_seq: AtomicU64::new(0),
            selection: Mutex::new(Selection::default()),
        }
    }

    pub async fn query_city(&self, name: &str, days: DayCount) -> Result<QueryOutcome> {
        self.query(LocationQuery::city(name)?, days).await
    }

    pub async fn query_coordinates(&self, lat: f64, lon: f64, days: DayCount) -> Result<QueryOutcome> {
        self.query(LocationQuery::Coordinates(Coordinates::new(lat, lon)?), days)
            .await
    }

    /// Run one lookup. Provider and normalization failures are returned
    /// unchanged and leave the displayed forecast and clock untouched.
    pub async fn query(&self, query: LocationQuery, days: DayCount) -> Result<QueryOutcome> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(seq, %query, days = days.get(), "Issuing forecast lookup");

        let raw = self.provider.fetch(&query, days).await.inspect_err(|e| {
            tracing::warn!(seq, %query, "Forecast lookup failed: {}", e);
        })?;
        let forecast = normalize(&raw).inspect_err(|e| {
            tracing::warn!(seq, %query, "Forecast normalization failed: {}", e);
        })?;

        Ok(self.apply(seq, query, forecast))
    }

    fn apply(&self, seq: u64, query: LocationQuery, forecast: NormalizedForecast) -> QueryOutcome {
        let mut selection = self.selection.lock();
        if seq < selection.seq {
            tracing::warn!(seq, newest = selection.seq, %query, "Discarding stale forecast response");
            return QueryOutcome::Stale {
                seq,
                newest: selection.seq,
            };
        }

        let offset = forecast.utc_offset_secs;
        let forecast = Arc::new(forecast);
        selection.seq = seq;
        selection.query = Some(query);
        self.forecast_tx.send_replace(Some(Arc::clone(&forecast)));

        let clock = match self.clock.start(offset) {
            Ok(handle) => ClockStatus::Live(handle),
            Err(e) => {
                tracing::warn!("Showing forecast without live clock: {}", e);
                ClockStatus::Degraded(e)
            }
        };

        tracing::info!(
            seq,
            location = %forecast.location_label(),
            offset,
            days = forecast.days.len(),
            "Applied forecast"
        );
        QueryOutcome::Applied { forecast, clock }
    }

    pub fn forecast(&self) -> Option<Arc<NormalizedForecast>> {
        self.forecast_tx.borrow().clone()
    }

    /// Receive every replacement of the displayed forecast.
    pub fn subscribe_forecast(&self) -> watch::Receiver<Option<Arc<NormalizedForecast>>> {
        self.forecast_tx.subscribe()
    }

    pub fn selected_location(&self) -> Option<LocationQuery> {
        self.selection.lock().query.clone()
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    /// Stop the live clock. The displayed forecast is kept.
    pub fn shutdown(&self) {
        self.clock.shutdown();
    }
}
