//! Periodic rollover scheduler.
//!
//! # Responsibility
//! - Run the rollover tick across all active habits once per interval.
//! - Keep running after a failed tick.
//!
//! # Invariants
//! - At most one scheduler is alive per process.
//! - Ticks run on a single worker thread, so they never overlap; a slow tick
//!   delays the next one instead of running beside it.
//! - `stop` (or drop) waits for an in-flight tick to finish.
//! - The first wait is measured from the last recorded tick, so restarting the
//!   process does not push the next rollover a full interval away.

use crate::clock::Clock;
use crate::service::habit_service::HabitService;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const WORKER_THREAD_NAME: &str = "habits-rollover";

/// Nominal rollover period.
pub const DEFAULT_ROLLOVER_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

static SCHEDULER_ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub enum SchedulerError {
    /// Another scheduler instance is already running in this process.
    AlreadyRunning,
    /// Interval must be non-zero.
    InvalidInterval,
    /// The worker thread could not be spawned.
    Spawn(std::io::Error),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "rollover scheduler is already running"),
            Self::InvalidInterval => write!(f, "rollover interval must be greater than zero"),
            Self::Spawn(err) => write!(f, "failed to spawn rollover worker: {err}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to the process-wide rollover worker.
pub struct RolloverScheduler {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    interval: Duration,
}

impl RolloverScheduler {
    /// Starts the worker.
    ///
    /// The first tick fires `interval` after the last recorded tick (at once
    /// when that is already overdue), or one `interval` after start when no
    /// tick was ever recorded. Later ticks follow every `interval`.
    ///
    /// # Errors
    /// - `AlreadyRunning` when another scheduler has not been stopped yet.
    /// - `InvalidInterval` for a zero interval.
    pub fn start<C>(
        service: Arc<HabitService<C>>,
        interval: Duration,
    ) -> Result<Self, SchedulerError>
    where
        C: Clock + 'static,
    {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        if SCHEDULER_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("event=scheduler_start module=scheduler status=rejected reason=already_running");
            return Err(SchedulerError::AlreadyRunning);
        }

        let last_ran_at = match service.last_rollover() {
            Ok(last) => last.map(|report| report.ran_at),
            Err(err) => {
                warn!(
                    "event=scheduler_start module=scheduler status=degraded error_code=history_unavailable error={}",
                    err
                );
                None
            }
        };
        let initial_wait = first_wait(last_ran_at, service.clock().now_epoch_ms(), interval);

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut wait = initial_wait;
                loop {
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => run_tick(&service),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    wait = interval;
                }
            });

        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                SCHEDULER_ACTIVE.store(false, Ordering::SeqCst);
                error!(
                    "event=scheduler_start module=scheduler status=error error_code=spawn_failed error={}",
                    err
                );
                return Err(SchedulerError::Spawn(err));
            }
        };

        info!(
            "event=scheduler_start module=scheduler status=ok interval_ms={} first_wait_ms={}",
            interval.as_millis(),
            initial_wait.as_millis()
        );
        Ok(Self {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether a scheduler is currently alive in this process.
    pub fn is_active() -> bool {
        SCHEDULER_ACTIVE.load(Ordering::SeqCst)
    }

    /// Signals the worker and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        let _ = stop_tx.send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=scheduler_stop module=scheduler status=error error_code=worker_panicked");
            }
        }
        SCHEDULER_ACTIVE.store(false, Ordering::SeqCst);
        info!("event=scheduler_stop module=scheduler status=ok");
    }
}

impl Drop for RolloverScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Time left until the next tick is due, capped at `interval`.
fn first_wait(last_ran_at: Option<i64>, now: i64, interval: Duration) -> Duration {
    let Some(last_ran_at) = last_ran_at else {
        return interval;
    };
    let since_last = u64::try_from(now.saturating_sub(last_ran_at)).unwrap_or(0);
    interval.saturating_sub(Duration::from_millis(since_last))
}

fn run_tick<C: Clock>(service: &HabitService<C>) {
    // The service logs the failure details; the loop keeps going.
    if let Err(err) = service.rollover_now() {
        warn!(
            "event=scheduler_tick module=scheduler status=error error={}",
            err
        );
    }
}
