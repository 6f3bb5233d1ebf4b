//! Recording pipeline: producers enqueue, one worker thread aggregates.
//!
//! Recording costs a single `try_send` on a bounded crossbeam channel and
//! never blocks. When the queue is full the recording is dropped and counted.
//! The worker applies events in FIFO order, stamping each with the time it
//! was processed.

use crate::core::{CollectionState, LumenError, Result, StateLatch, StatsConfig};
use crate::stats::clock::{Clock, SystemClock};
use crate::stats::measure::Measurement;
use crate::stats::measure_map::MeasureMap;
use crate::stats::view::{View, ViewData};
use crate::stats::view_map::MeasureToViewMap;
use crate::tags::TagContext;
use crossbeam_channel::{bounded, Receiver, Select, SendTimeoutError, Sender, TryRecvError, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum Event {
    Record {
        tags: TagContext,
        measurements: Vec<Measurement>,
        window: u64,
    },
    Flush(Sender<()>),
    Shutdown,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

/// Pipeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsManagerStats {
    /// Recordings accepted onto the queue
    pub enqueued: u64,
    /// Recordings applied to the views
    pub processed: u64,
    /// Recordings rejected because the queue was full
    pub dropped: u64,
    /// Recordings that raised an error while being applied
    pub failed: u64,
}

/// State shared with the worker thread.
struct Shared {
    views: Mutex<MeasureToViewMap>,
    state: Arc<StateLatch<CollectionState>>,
    clock: Arc<dyn Clock>,
    counters: Counters,
    paused: Mutex<bool>,
    resumed: Condvar,
    /// Bumped on every collection state change; recordings stamped with an
    /// older window are discarded.
    window: AtomicU64,
}

impl Shared {
    fn wait_while_paused(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.resumed.wait(&mut paused);
        }
    }

    fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    fn apply(&self, tags: &TagContext, measurements: &[Measurement], window: u64) {
        let now = self.clock.now();
        // Window changes happen under the views lock
        let mut views = self.views.lock();
        if window != self.window.load(Ordering::Acquire)
            || self.state.get_internal() == CollectionState::Disabled
        {
            tracing::debug!("Discarding recording from a closed collection window");
            return;
        }
        let result = views.record(tags, measurements, now);
        drop(views);
        match result {
            Ok(()) => {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed to apply recording: {}", e);
            },
        }
    }

    fn handle(&self, event: Event) -> bool {
        match event {
            Event::Record {
                tags,
                measurements,
                window,
            } => {
                self.apply(&tags, &measurements, window);
                true
            },
            Event::Flush(ack) => {
                // The flusher may have timed out and gone away
                let _ = ack.send(());
                true
            },
            Event::Shutdown => false,
        }
    }
}

fn run_worker(shared: Arc<Shared>, receiver: Receiver<Event>) {
    tracing::debug!("Stats worker started");
    let mut select = Select::new();
    select.recv(&receiver);
    loop {
        shared.wait_while_paused();
        // Wait without dequeuing so a paused worker leaves events queued
        select.ready();
        if shared.is_paused() {
            continue;
        }
        match receiver.try_recv() {
            Ok(event) => {
                if !shared.handle(event) {
                    break;
                }
            },
            Err(TryRecvError::Empty) => continue,
            Err(TryRecvError::Disconnected) => break,
        }
    }

    // Recordings that raced with shutdown
    let mut late = 0usize;
    for event in receiver.try_iter() {
        if shared.handle(event) {
            late += 1;
        }
    }
    tracing::debug!("Stats worker stopped ({} late events drained)", late);
}

/// Owner of the event queue, the worker thread and the registered views.
pub struct StatsManager {
    shared: Arc<Shared>,
    sender: Sender<Event>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    flush_timeout: Duration,
    capacity: usize,
}

impl fmt::Debug for StatsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsManager")
            .field("capacity", &self.capacity)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("stats", &self.stats())
            .finish()
    }
}

impl StatsManager {
    /// Starts the worker thread.
    // The pause flag is a Mutex<bool> because it pairs with the resume condvar
    #[allow(clippy::mutex_atomic)]
    pub fn new(
        config: &StatsConfig,
        state: Arc<StateLatch<CollectionState>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if config.queue_capacity == 0 {
            return Err(LumenError::config("stats.queue_capacity must be positive"));
        }

        let (sender, receiver) = bounded(config.queue_capacity);
        let shared = Arc::new(Shared {
            views: Mutex::new(MeasureToViewMap::new()),
            state,
            clock,
            counters: Counters::default(),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            window: AtomicU64::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || run_worker(worker_shared, receiver))?;

        tracing::debug!(
            "Stats manager started (queue capacity {}, worker '{}')",
            config.queue_capacity,
            config.worker_name
        );

        Ok(Self {
            shared,
            sender,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
            flush_timeout: config.flush_timeout,
            capacity: config.queue_capacity,
        })
    }

    /// Enqueues a recording.
    ///
    /// A no-op while collection is disabled. Fails with
    /// [`LumenError::QueueFull`] when the queue is full (the recording is
    /// dropped) and with [`LumenError::ChannelSend`] after shutdown.
    pub fn record(&self, tags: &TagContext, measurements: Vec<Measurement>) -> Result<()> {
        if self.shared.state.get_internal() == CollectionState::Disabled {
            return Ok(());
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(LumenError::ChannelSend);
        }

        let event = Event::Record {
            tags: tags.clone(),
            measurements,
            window: self.shared.window.load(Ordering::Acquire),
        };
        match self.sender.try_send(event) {
            Ok(()) => {
                self.shared.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
            Err(TrySendError::Full(_)) => {
                let dropped = self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    "Stats queue full (capacity {}), dropped recording ({} dropped so far)",
                    self.capacity,
                    dropped
                );
                Err(LumenError::QueueFull)
            },
            Err(TrySendError::Disconnected(_)) => Err(LumenError::ChannelSend),
        }
    }

    pub fn register_view(&self, view: View) -> Result<()> {
        let now = self.shared.clock.now();
        self.shared.views.lock().register_view(view, now)
    }

    pub fn get_view(&self, name: &str) -> Option<ViewData> {
        let now = self.shared.clock.now();
        let state = self.shared.state.get_internal();
        self.shared.views.lock().get_view(name, now, state)
    }

    pub fn exported_views(&self) -> Vec<View> {
        self.shared.views.lock().exported_views()
    }

    pub(crate) fn clear_stats(&self) {
        let mut views = self.shared.views.lock();
        self.shared.window.fetch_add(1, Ordering::AcqRel);
        views.clear_stats();
    }

    pub(crate) fn resume_stats_collection(&self) {
        let now = self.shared.clock.now();
        let mut views = self.shared.views.lock();
        self.shared.window.fetch_add(1, Ordering::AcqRel);
        views.resume_stats_collection(now);
    }

    /// Holds the worker; recordings keep queueing (and may overflow).
    pub fn pause(&self) {
        *self.shared.paused.lock() = true;
        tracing::debug!("Stats worker paused");
    }

    pub fn resume(&self) {
        *self.shared.paused.lock() = false;
        self.shared.resumed.notify_all();
        tracing::debug!("Stats worker resumed");
    }

    /// Waits until every recording enqueued before this call has been
    /// applied, up to the configured flush timeout.
    pub fn flush(&self) -> Result<()> {
        self.flush_timeout(self.flush_timeout)
    }

    pub fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        let timed_out = || LumenError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
        let deadline = Instant::now() + timeout;

        let (ack_tx, ack_rx) = bounded(1);
        match self.sender.send_timeout(Event::Flush(ack_tx), timeout) {
            Ok(()) => {},
            Err(SendTimeoutError::Timeout(_)) => return Err(timed_out()),
            Err(SendTimeoutError::Disconnected(_)) => return Err(LumenError::ChannelSend),
        }
        ack_rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .map_err(|_| timed_out())
    }

    /// Stops accepting recordings, drains the queue and joins the worker.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.resume();
        if self.sender.send(Event::Shutdown).is_err() {
            tracing::warn!("Stats worker exited before shutdown");
        }
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::warn!("Stats worker panicked");
            }
        }
        tracing::debug!("Stats manager shut down: {:?}", self.stats());
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsManagerStats {
        let c = &self.shared.counters;
        StatsManagerStats {
            enqueued: c.enqueued.load(Ordering::Relaxed),
            processed: c.processed.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    /// Recordings currently queued (approximate)
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }
}

impl Drop for StatsManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Producer handle.
#[derive(Debug, Clone)]
pub struct StatsRecorder {
    manager: Arc<StatsManager>,
}

impl StatsRecorder {
    pub fn new_measure_map(&self) -> MeasureMap {
        MeasureMap::new(self.clone())
    }

    pub(crate) fn record(&self, tags: &TagContext, measurements: Vec<Measurement>) -> Result<()> {
        self.manager.record(tags, measurements)
    }
}

/// View registration and snapshot handle.
#[derive(Debug, Clone)]
pub struct ViewManager {
    manager: Arc<StatsManager>,
}

impl ViewManager {
    /// Registers a view. See [`MeasureToViewMap::register_view`].
    pub fn register_view(&self, view: View) -> Result<()> {
        self.manager.register_view(view)
    }

    /// Snapshot of the named view, `None` if it is not registered.
    pub fn get_view(&self, name: &str) -> Option<ViewData> {
        self.manager.get_view(name)
    }

    pub fn all_exported_views(&self) -> Vec<View> {
        self.manager.exported_views()
    }
}

/// Stats component: owns the collection state and the manager.
#[derive(Debug, Clone)]
pub struct Stats {
    manager: Arc<StatsManager>,
    state: Arc<StateLatch<CollectionState>>,
}

impl Stats {
    /// Stats component on the system clock, collection enabled.
    pub fn new(config: &StatsConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &StatsConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = Arc::new(StateLatch::new(CollectionState::Enabled));
        let manager = StatsManager::new(config, Arc::clone(&state), clock)?;
        Ok(Self {
            manager: Arc::new(manager),
            state,
        })
    }

    pub fn recorder(&self) -> StatsRecorder {
        StatsRecorder {
            manager: Arc::clone(&self.manager),
        }
    }

    pub fn view_manager(&self) -> ViewManager {
        ViewManager {
            manager: Arc::clone(&self.manager),
        }
    }

    pub fn manager(&self) -> &StatsManager {
        &self.manager
    }

    /// Reads the collection state. Once read, it can no longer be changed.
    pub fn state(&self) -> CollectionState {
        self.state.get()
    }

    /// Changes the collection state; fails after the state has been read.
    ///
    /// Disabling drops every aggregated row. Enabling opens a fresh window.
    pub fn set_state(&self, state: CollectionState) -> Result<()> {
        if !self.state.set(state)? {
            return Ok(());
        }
        match state {
            CollectionState::Disabled => self.manager.clear_stats(),
            CollectionState::Enabled => self.manager.resume_stats_collection(),
        }
        tracing::info!("Stats collection state changed to {:?}", state);
        Ok(())
    }
}
