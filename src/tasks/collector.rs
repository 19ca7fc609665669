//! Garbage Collector Task
//!
//! Runs a caller-supplied cleanup function on a fixed interval, on its own
//! Tokio task, until stopped.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, Result};

type CleanupFuture = Pin<Box<dyn Future<Output = anyhow::Result<usize>> + Send>>;
type CleanupFn = Arc<dyn Fn() -> CleanupFuture + Send + Sync>;

/// Periodically invokes a cleanup function until stopped.
///
/// The cleanup function returns the number of items it removed. Errors and
/// panics from it are logged and never stop the loop.
pub struct Collector {
    interval: Duration,
    cleanup: CleanupFn,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
}

/// Control channels of one started loop.
struct Worker {
    /// One-shot stop signal, taken by the first `stop()`
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Flips to `true` once the loop has exited
    stopped_rx: watch::Receiver<bool>,
}

impl Collector {
    // == Constructor ==
    /// Creates a collector with the given interval and cleanup function.
    ///
    /// The collector does not run until [`Collector::start`] is called.
    ///
    /// # Errors
    /// `CacheError::InvalidConfig` if `interval` is zero.
    pub fn new<F, Fut>(interval: Duration, cleanup: F) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<usize>> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "collector interval must be > 0".to_string(),
            ));
        }

        let cleanup: CleanupFn = Arc::new(move || Box::pin(cleanup()) as CleanupFuture);

        Ok(Self {
            interval,
            cleanup,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    // == Start ==
    /// Spawns the collection loop on the current Tokio runtime.
    ///
    /// Starting an already running collector is a no-op. A stopped
    /// collector can be started again.
    ///
    /// # Errors
    /// `CacheError::Runtime` if called outside of a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        let handle = Handle::try_current().map_err(|e| CacheError::Runtime(e.to_string()))?;

        let mut worker = self.lock_worker();
        if let Some(current) = worker.as_ref() {
            if !*current.stopped_rx.borrow() {
                debug!("Collector already running");
                return Ok(());
            }
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (stopped_tx, stopped_rx) = watch::channel(false);

        self.running.store(true, Ordering::SeqCst);
        info!(
            "Starting collector with interval of {:?}",
            self.interval
        );

        let guard = StoppedGuard {
            running: Arc::clone(&self.running),
            stopped_tx,
        };
        handle.spawn(run_loop(
            self.interval,
            Arc::clone(&self.cleanup),
            shutdown_rx,
            guard,
        ));

        *worker = Some(Worker {
            shutdown_tx: Some(shutdown_tx),
            stopped_rx,
        });
        Ok(())
    }

    // == Stop ==
    /// Signals the loop to stop and waits until it has exited.
    ///
    /// Safe to call repeatedly and concurrently: the stop signal is sent at
    /// most once, and every caller returns only after the loop is gone.
    pub async fn stop(&self) {
        let mut stopped_rx = {
            let mut worker = self.lock_worker();
            let Some(current) = worker.as_mut() else {
                return;
            };
            if let Some(shutdown_tx) = current.shutdown_tx.take() {
                let _ = shutdown_tx.send(());
            }
            current.stopped_rx.clone()
        };

        // A closed channel also means the loop is gone.
        let _ = stopped_rx.wait_for(|stopped| *stopped).await;
    }

    // == Is Running ==
    /// Returns true while the collection loop is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Marks the loop as stopped however it exits, cancellation included.
struct StoppedGuard {
    running: Arc<AtomicBool>,
    stopped_tx: watch::Sender<bool>,
}

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stopped_tx.send_replace(true);
    }
}

async fn run_loop(
    interval: Duration,
    cleanup: CleanupFn,
    mut shutdown_rx: oneshot::Receiver<()>,
    _guard: StoppedGuard,
) {
    // First sweep happens one full interval after start.
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on an explicit stop or when the collector is dropped.
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => run_once(&cleanup).await,
        }
    }

    info!("Collector stopped running");
}

/// Runs one cleanup pass in its own task so a panic cannot take the loop down.
async fn run_once(cleanup: &CleanupFn) {
    match tokio::spawn(cleanup()).await {
        Ok(Ok(removed)) if removed > 0 => {
            info!("Collector cleanup: removed {} expired entries", removed);
        }
        Ok(Ok(_)) => debug!("Collector cleanup: no expired entries found"),
        Ok(Err(err)) => warn!("Collector cleanup failed: {:#}", err),
        Err(err) => error!("Collector cleanup task aborted: {}", err),
    }
}
