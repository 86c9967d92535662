//! Live wall clock for the currently displayed location.
//!
//! [`LocalClock`] owns at most one periodic tick task. Every tick re-reads the
//! current UTC instant, shifts it by the location's offset and publishes
//! `HH:MM:SS` to a [`ClockSink`]. Restarting with a new offset stops the old
//! task first; dropping the clock stops it for good.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    error::{ClimaError, Result},
    model::{MAX_UTC_OFFSET, MIN_UTC_OFFSET},
    time_fmt::format_hh_mm_ss,
};

pub const TICK: Duration = Duration::from_secs(1);

/// Receives the formatted local time on every tick.
///
/// `publish` is called while the clock's state lock is held, so it must not
/// call back into the [`LocalClock`] that owns it.
pub trait ClockSink: Send + Sync + 'static {
    fn publish(&self, local_time: &str);
}

impl ClockSink for watch::Sender<String> {
    fn publish(&self, local_time: &str) {
        self.send_replace(local_time.to_owned());
    }
}

/// Source of the current UTC instant.
pub trait TimeSource: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Identifies one run of the clock. Stopping with a handle from an earlier run
/// is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockHandle {
    run: u64,
    offset_secs: i64,
}

impl ClockHandle {
    pub fn offset_secs(&self) -> i64 {
        self.offset_secs
    }
}

struct Running {
    offset_secs: i64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct ClockState {
    /// Bumped on every start and stop; a tick task only publishes while its
    /// own run id is still current.
    run: u64,
    running: Option<Running>,
    current: Option<String>,
}

impl ClockState {
    fn halt(&mut self) -> bool {
        self.run += 1;
        self.current = None;
        match self.running.take() {
            Some(prev) => {
                prev.task.abort();
                true
            }
            None => false,
        }
    }
}

pub struct LocalClock {
    state: Arc<Mutex<ClockState>>,
    sink: Arc<dyn ClockSink>,
    time: Arc<dyn TimeSource>,
}

impl fmt::Debug for LocalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LocalClock")
            .field("run", &state.run)
            .field("offset_secs", &state.running.as_ref().map(|r| r.offset_secs))
            .field("current", &state.current)
            .finish()
    }
}

impl LocalClock {
    pub fn new(sink: Arc<dyn ClockSink>) -> Self {
        Self::with_time_source(sink, SystemTime)
    }

    pub fn with_time_source(sink: Arc<dyn ClockSink>, time: impl TimeSource) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState::default())),
            sink,
            time: Arc::new(time),
        }
    }

    /// Start ticking for a location `offset_secs` ahead of UTC.
    ///
    /// Any earlier run is stopped before this returns; its task never
    /// publishes again. Fails with [`ClimaError::ClockUnavailable`] outside a
    /// Tokio runtime or for an offset no real location has, leaving the clock
    /// idle.
    pub fn start(&self, offset_secs: i64) -> Result<ClockHandle> {
        let mut state = self.state.lock();
        if state.halt() {
            tracing::debug!("Stopped previous clock run before restart");
        }

        if !(MIN_UTC_OFFSET..=MAX_UTC_OFFSET).contains(&offset_secs) {
            return Err(ClimaError::ClockUnavailable(format!(
                "utc offset {offset_secs}s is outside {MIN_UTC_OFFSET}..={MAX_UTC_OFFSET}"
            )));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClimaError::ClockUnavailable(e.to_string()))?;

        let run = state.run;
        let task = runtime.spawn(tick_loop(
            Arc::clone(&self.state),
            run,
            offset_secs,
            Arc::clone(&self.sink),
            Arc::clone(&self.time),
        ));
        state.running = Some(Running { offset_secs, task });

        tracing::debug!(run, offset_secs, "Local clock started");
        Ok(ClockHandle { run, offset_secs })
    }

    /// Stop the run identified by `handle`, if it is still the current one.
    pub fn stop(&self, handle: ClockHandle) {
        let mut state = self.state.lock();
        if state.run != handle.run {
            tracing::debug!(run = handle.run, current = state.run, "Ignoring stop for stale clock handle");
            return;
        }
        if state.halt() {
            tracing::debug!(run = handle.run, "Local clock stopped");
        }
    }

    /// Stop whatever run is active.
    pub fn shutdown(&self) {
        if self.state.lock().halt() {
            tracing::debug!("Local clock shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running.is_some()
    }

    /// Offset of the active run.
    pub fn offset_secs(&self) -> Option<i64> {
        self.state.lock().running.as_ref().map(|r| r.offset_secs)
    }

    /// Last published `HH:MM:SS`, if the clock is running and has ticked.
    pub fn current_time(&self) -> Option<String> {
        self.state.lock().current.clone()
    }
}

impl Drop for LocalClock {
    fn drop(&mut self) {
        self.state.lock().halt();
    }
}

async fn tick_loop(
    state: Arc<Mutex<ClockState>>,
    run: u64,
    offset_secs: i64,
    sink: Arc<dyn ClockSink>,
    time: Arc<dyn TimeSource>,
) {
    let mut ticks = interval(TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let Some(local) = format_hh_mm_ss(time.now(), offset_secs) else {
            tracing::warn!(offset_secs, "Local time out of range, skipping tick");
            continue;
        };
        let mut guard = state.lock();
        if guard.run != run {
            break;
        }
        sink.publish(&local);
        guard.current = Some(local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn values(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    impl ClockSink for RecordingSink {
        fn publish(&self, local_time: &str) {
            self.seen.lock().push(local_time.to_owned());
        }
    }

    /// Fixed UTC instant, 2023-11-14T22:13:20Z.
    struct FrozenTime;

    impl TimeSource for FrozenTime {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        }
    }

    /// Follows Tokio's (paused) clock from 2023-11-14T22:13:20Z.
    struct TokioTime {
        started: tokio::time::Instant,
    }

    impl TimeSource for TokioTime {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::TimeDelta::from_std(self.started.elapsed()).unwrap();
            DateTime::from_timestamp(1_700_000_000, 0).unwrap() + elapsed
        }
    }

    fn recording_clock(time: impl TimeSource) -> (LocalClock, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let clock = LocalClock::with_time_source(sink.clone(), time);
        (clock, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_re_reading_the_instant() {
        let (clock, sink) = recording_clock(TokioTime { started: tokio::time::Instant::now() });

        clock.start(-10_800).unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(sink.values(), ["19:13:20", "19:13:21", "19:13:22", "19:13:23"]);
        assert_eq!(clock.current_time().as_deref(), Some("19:13:23"));
        assert_eq!(clock.offset_secs(), Some(-10_800));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_previous_run() {
        let (clock, sink) = recording_clock(FrozenTime);

        let first = clock.start(0).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let second = clock.start(3_600).unwrap();
        let before_restart = sink.values().len();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let seen = sink.values();
        assert!(seen[..before_restart].iter().all(|t| t == "22:13:20"));
        assert!(seen.len() > before_restart);
        assert!(seen[before_restart..].iter().all(|t| t == "23:13:20"));
        assert_ne!(first, second);
        assert_eq!(second.offset_secs(), 3_600);
        assert_eq!(clock.offset_secs(), Some(3_600));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_handle_does_not_stop_newer_run() {
        let (clock, sink) = recording_clock(FrozenTime);

        let first = clock.start(0).unwrap();
        let _second = clock.start(7_200).unwrap();
        clock.stop(first);
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert!(clock.is_running());
        assert_eq!(sink.values().last().map(String::as_str), Some("00:13:20"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_the_sink() {
        let (clock, sink) = recording_clock(FrozenTime);

        let handle = clock.start(0).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        clock.stop(handle);
        let published = sink.values().len();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(sink.values().len(), published);
        assert!(!clock.is_running());
        assert_eq!(clock.current_time(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_clock_stops_ticking() {
        let (clock, sink) = recording_clock(FrozenTime);

        clock.start(0).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(clock);
        let published = sink.values().len();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(sink.values().len(), published);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_into_a_watch_channel() {
        let (tx, mut rx) = watch::channel(String::new());
        let clock = LocalClock::with_time_source(Arc::new(tx), FrozenTime);

        clock.start(19_800).unwrap();
        rx.changed().await.unwrap();

        assert_eq!(*rx.borrow(), "03:43:20");
    }

    #[tokio::test(start_paused = true)]
    async fn offsets_outside_real_range_are_refused() {
        let (clock, sink) = recording_clock(FrozenTime);

        clock.start(0).unwrap();
        let err = clock.start(10_000_000_000_000).unwrap_err();
        assert!(matches!(err, ClimaError::ClockUnavailable(_)));
        assert!(!clock.is_running());
        assert!(matches!(clock.start(50_401), Err(ClimaError::ClockUnavailable(_))));
        assert!(matches!(clock.start(-43_201), Err(ClimaError::ClockUnavailable(_))));
        let published = sink.values().len();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(sink.values().len(), published);

        clock.start(50_400).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        // 22:13:20 UTC at UTC+14
        assert_eq!(sink.values().last().map(String::as_str), Some("12:13:20"));
        clock.start(-43_200).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sink.values().last().map(String::as_str), Some("10:13:20"));
    }

    #[test]
    fn start_outside_runtime_is_unavailable_and_idle() {
        let (clock, sink) = recording_clock(FrozenTime);

        let err = clock.start(0).unwrap_err();

        assert!(matches!(err, ClimaError::ClockUnavailable(_)));
        assert!(!clock.is_running());
        assert!(sink.values().is_empty());
    }
}
