//! Expiry sweeper: periodic, single-flight, idempotent housekeeping.
//!
//! Physically deactivates expired grants so listings and audit views stay
//! accurate. Purely an optimization: the engine's lazy expiration check
//! means a failed or delayed pass never produces an incorrect decision,
//! only stale `active` flags until the next successful run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use ridgeline_authz::{GrantStore, GrantStoreError};

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between passes.
    pub interval: Duration,
    /// Thread name for logging.
    pub name: String,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            name: "expiry-sweeper".to_string(),
        }
    }
}

impl SweeperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Sweeper runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweeperStats {
    pub passes: u64,
    pub passes_skipped: u64,
    pub passes_failed: u64,
    pub grants_deactivated: u64,
    pub last_pass_at: Option<DateTime<Utc>>,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Pass ran; `deactivated` grants were flipped inactive.
    Completed { deactivated: usize },
    /// Another pass was already in flight; this call did nothing.
    Skipped,
}

/// Deactivates expired grants on demand or on a schedule.
///
/// Single-flight: overlapping `run_once` calls are no-ops. An interrupted
/// pass leaves some rows stale; the next pass completes the cleanup, so no
/// coordination beyond the idempotent store write is needed.
pub struct ExpirySweeper {
    store: Arc<dyn GrantStore>,
    in_flight: AtomicBool,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one sweep pass at `now`.
    pub fn run_once(&self, now: DateTime<Utc>) -> Result<SweepOutcome, GrantStoreError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sweep pass already in flight; skipping");
            return Ok(SweepOutcome::Skipped);
        }

        let result = self.store.deactivate_expired(now);
        self.in_flight.store(false, Ordering::Release);

        let deactivated = result?;
        if deactivated > 0 {
            info!(deactivated, "expiry sweep deactivated grants");
        }
        Ok(SweepOutcome::Completed { deactivated })
    }

    /// Spawn the sweeper on a dedicated background thread.
    pub fn spawn(store: Arc<dyn GrantStore>, config: SweeperConfig) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(SweeperStats::default()));
        let stats_clone = stats.clone();

        // Capture the runtime handle (if any) so runtime-backed stores keep
        // working from the sweeper thread.
        let runtime = tokio::runtime::Handle::try_current().ok();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _guard = runtime.as_ref().map(|h| h.enter());
                sweeper_loop(ExpirySweeper::new(store), config, shutdown_rx, stats_clone);
            })
            .expect("failed to spawn expiry sweeper thread");

        SweeperHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }
}

/// Handle to control a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<SweeperStats>>,
}

impl SweeperHandle {
    /// Request graceful shutdown.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Current sweeper statistics.
    pub fn stats(&self) -> SweeperStats {
        self.stats.lock().unwrap().clone()
    }
}

fn sweeper_loop(
    sweeper: ExpirySweeper,
    config: SweeperConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<SweeperStats>>,
) {
    info!(sweeper = %config.name, interval_ms = config.interval.as_millis() as u64, "expiry sweeper started");

    loop {
        // The shutdown channel doubles as the interval timer.
        match shutdown_rx.recv_timeout(config.interval) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        let outcome = sweeper.run_once(Utc::now());

        let mut s = stats.lock().unwrap();
        s.last_pass_at = Some(Utc::now());
        match outcome {
            Ok(SweepOutcome::Completed { deactivated }) => {
                s.passes += 1;
                s.grants_deactivated += deactivated as u64;
            }
            Ok(SweepOutcome::Skipped) => {
                s.passes_skipped += 1;
            }
            Err(err) => {
                s.passes_failed += 1;
                // Decision correctness does not depend on the sweep; log and
                // let the next scheduled pass retry.
                error!(sweeper = %config.name, error = %err, "expiry sweep failed");
            }
        }
    }

    info!(sweeper = %config.name, "expiry sweeper stopped");
}
