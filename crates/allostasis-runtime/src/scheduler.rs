//! Scheduler — drives a [`Simulation`] on its own thread.
//!
//! `Idle` → `Running` → `Stopped`. Once stopped a scheduler never runs
//! again. A stop request is observed between ticks, so the tick in flight
//! always completes and publishes first.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::simulation::Simulation;
use crate::sync::{SchedulerStatus, Synchronizer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const TICK_THREAD_NAME: &str = "allostasis-tick";

pub struct Scheduler {
    sync: Arc<Synchronizer>,
    config: SchedulerConfig,
    stop: Arc<AtomicBool>,
    /// Present until `start` hands the world to the tick thread.
    idle: Mutex<Option<Simulation>>,
    handle: Mutex<Option<JoinHandle<Simulation>>>,
}

impl Scheduler {
    /// Wrap `simulation`; nothing runs until [`Scheduler::start`].
    pub fn new(simulation: Simulation, sync: Arc<Synchronizer>, config: SchedulerConfig) -> Self {
        Self {
            sync,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            idle: Mutex::new(Some(simulation)),
            handle: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.sync.status()
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.sync
    }

    /// Spawn the tick thread. Only valid while `Idle`.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.sync
            .transition(SchedulerStatus::Idle, SchedulerStatus::Running)
            .map_err(|current| match current {
                SchedulerStatus::Stopped => SchedulerError::AlreadyStopped,
                other => SchedulerError::AlreadyStarted(other),
            })?;

        let simulation = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(simulation) = simulation else {
            self.sync.set_status(SchedulerStatus::Stopped);
            return Err(SchedulerError::AlreadyStopped);
        };

        let sync = Arc::clone(&self.sync);
        let stop = Arc::clone(&self.stop);
        let config = self.config.clone();
        let spawned = thread::Builder::new()
            .name(TICK_THREAD_NAME.to_string())
            .spawn(move || tick_loop(simulation, sync, stop, config));

        match spawned {
            Ok(handle) => {
                info!(
                    interval_ms = self.config.tick_interval_ms,
                    max_ticks = ?self.config.max_ticks,
                    "scheduler started"
                );
                *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to spawn tick thread");
                self.sync.set_status(SchedulerStatus::Stopped);
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Ask the scheduler to stop.
    ///
    /// While running this only raises the stop flag; the status turns
    /// `Stopped` once the in-flight tick has published. An idle scheduler
    /// stops at once.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        match self.sync.transition(SchedulerStatus::Idle, SchedulerStatus::Stopped) {
            Ok(()) => {
                info!("scheduler stopped before starting");
                Ok(())
            }
            Err(SchedulerStatus::Running) => {
                self.stop.store(true, Ordering::SeqCst);
                if let Some(handle) = self.handle.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
                    handle.thread().unpark();
                }
                Ok(())
            }
            Err(_) => Err(SchedulerError::AlreadyStopped),
        }
    }

    /// Wait for the tick thread to finish and take the world back.
    ///
    /// Returns `None` if the world was already taken by an earlier `join`.
    pub fn join(&self) -> Result<Option<Simulation>, SchedulerError> {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        match handle {
            Some(handle) => handle.join().map(Some).map_err(|_| {
                self.sync.set_status(SchedulerStatus::Stopped);
                SchedulerError::Panicked
            }),
            None => Ok(self.idle.lock().unwrap_or_else(PoisonError::into_inner).take()),
        }
    }

    /// Stop and wait.
    pub fn shutdown(&self) -> Result<Option<Simulation>, SchedulerError> {
        match self.stop() {
            Ok(()) | Err(SchedulerError::AlreadyStopped) => self.join(),
            Err(e) => Err(e),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            handle.thread().unpark();
        }
    }
}

/// Marks the scheduler stopped when the tick thread exits, unwinding included.
struct StopOnExit(Arc<Synchronizer>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("tick thread panicked, stopping");
        }
        self.0.set_status(SchedulerStatus::Stopped);
    }
}

fn tick_loop(
    mut simulation: Simulation,
    sync: Arc<Synchronizer>,
    stop: Arc<AtomicBool>,
    config: SchedulerConfig,
) -> Simulation {
    let _stopped = StopOnExit(Arc::clone(&sync));
    let interval = Duration::from_millis(config.tick_interval_ms);
    loop {
        if stop.load(Ordering::SeqCst) {
            info!(tick = simulation.tick(), "stop requested");
            break;
        }
        if config.max_ticks.is_some_and(|max| simulation.tick() >= max) {
            info!(tick = simulation.tick(), "reached max_ticks");
            break;
        }

        let deadline = Instant::now() + interval;
        match simulation.step(&sync) {
            Ok(snapshot) => debug!(
                tick = snapshot.tick,
                alive = snapshot.stats.agents_alive,
                applied = snapshot.applied_actions.len(),
                "published"
            ),
            Err(e) => {
                error!(tick = simulation.tick(), error = %e, "fatal tick failure, stopping");
                break;
            }
        }

        while !stop.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
    simulation
}
