//! Synchronizer — the only state shared between the tick thread and readers.
//!
//! Readers clone an `Arc<WorldSnapshot>`; the write lock only guards the
//! pointer swap, so a reader never waits on a tick in progress. External
//! actions are validated on submission and queued until the next tick
//! drains the whole queue at once.

use crate::snapshot::WorldSnapshot;
use allostasis_core::error::ValidationError;
use allostasis_core::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// Lifecycle of the background scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SchedulerStatus {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl SchedulerStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SchedulerStatus::Idle,
            1 => SchedulerStatus::Running,
            _ => SchedulerStatus::Stopped,
        }
    }
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerStatus::Idle => "idle",
            SchedulerStatus::Running => "running",
            SchedulerStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A validated external action waiting for the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingAction {
    pub sequence: u64,
    pub action: ExternalAction,
    /// Tick of the latest snapshot when the action was accepted.
    pub submitted_after: Tick,
}

/// Returned for an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub sequence: u64,
    /// The first snapshot tick that can contain the action.
    pub apply_at_or_after: Tick,
}

pub struct Synchronizer {
    width: u32,
    height: u32,
    snapshot: RwLock<Arc<WorldSnapshot>>,
    pending: Mutex<Vec<PendingAction>>,
    next_sequence: AtomicU64,
    status: AtomicU8,
}

impl Synchronizer {
    /// Start serving `initial`. Its grid dimensions bound every submission.
    pub fn new(initial: WorldSnapshot) -> Self {
        Self {
            width: initial.grid.width,
            height: initial.grid.height,
            status: AtomicU8::new(initial.status as u8),
            snapshot: RwLock::new(Arc::new(initial)),
            pending: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// The latest published snapshot.
    pub fn get_snapshot(&self) -> Arc<WorldSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the published snapshot, stamping the current status on it.
    pub fn publish(&self, mut snapshot: WorldSnapshot) -> Arc<WorldSnapshot> {
        snapshot.status = self.status();
        let snapshot = Arc::new(snapshot);
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&snapshot);
        snapshot
    }

    /// Validate and enqueue. Returns whether the action was accepted.
    pub fn submit_action(&self, action: ExternalAction) -> bool {
        self.try_submit(action).is_ok()
    }

    /// Validate and enqueue, reporting why a rejected action was declined.
    pub fn try_submit(&self, action: ExternalAction) -> Result<ActionReceipt, ValidationError> {
        self.validate(&action)?;
        let submitted_after = self.get_snapshot().tick;

        let mut queue = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        queue.push(PendingAction {
            sequence,
            action,
            submitted_after,
        });
        drop(queue);

        debug!(sequence, kind = action.kind(), "queued external action");
        Ok(ActionReceipt {
            sequence,
            apply_at_or_after: submitted_after + 1,
        })
    }

    fn validate(&self, action: &ExternalAction) -> Result<(), ValidationError> {
        match *action {
            ExternalAction::DropFood { position, amount } => {
                let in_bounds = position.x >= 0
                    && position.y >= 0
                    && (position.x as u32) < self.width
                    && (position.y as u32) < self.height;
                if !in_bounds {
                    return Err(ValidationError::OutOfBounds {
                        position,
                        width: self.width,
                        height: self.height,
                    });
                }
                if !amount.is_finite() {
                    return Err(ValidationError::NonFiniteAmount(amount));
                }
                if amount <= 0.0 {
                    return Err(ValidationError::NonPositiveAmount(amount));
                }
                Ok(())
            }
        }
    }

    /// Take every queued action, in arrival order.
    pub fn drain(&self) -> Vec<PendingAction> {
        let mut queue = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *queue)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Record a scheduler transition and republish the latest snapshot
    /// with the new status.
    pub(crate) fn set_status(&self, status: SchedulerStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if guard.status != status {
            let mut updated = WorldSnapshot::clone(&guard);
            updated.status = status;
            *guard = Arc::new(updated);
        }
    }

    /// Move from `from` to `to` only if the current status is `from`.
    pub(crate) fn transition(&self, from: SchedulerStatus, to: SchedulerStatus) -> Result<(), SchedulerStatus> {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| self.set_status(to))
            .map_err(SchedulerStatus::from_u8)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;
    use crate::grid::Grid;
    use crate::config::SimulationConfig;

    fn sync() -> Synchronizer {
        let sim = Simulation::with_grid(Grid::uniform(10, 8, 20.0), &SimulationConfig::default());
        Synchronizer::new(sim.snapshot())
    }

    fn drop_at(x: i32, y: i32, amount: f64) -> ExternalAction {
        ExternalAction::DropFood {
            position: GridPos::new(x, y),
            amount,
        }
    }

    #[test]
    fn validation_reasons() {
        let s = sync();
        assert!(matches!(
            s.try_submit(drop_at(10, 0, 5.0)),
            Err(ValidationError::OutOfBounds { width: 10, height: 8, .. })
        ));
        assert!(matches!(
            s.try_submit(drop_at(0, -1, 5.0)),
            Err(ValidationError::OutOfBounds { .. })
        ));
        assert_eq!(
            s.try_submit(drop_at(1, 1, 0.0)),
            Err(ValidationError::NonPositiveAmount(0.0))
        );
        assert!(matches!(
            s.try_submit(drop_at(1, 1, f64::NAN)),
            Err(ValidationError::NonFiniteAmount(_))
        ));
        assert!(!s.submit_action(drop_at(1, 1, f64::INFINITY)));
        assert_eq!(s.pending_len(), 0, "rejected actions are never queued");
    }

    #[test]
    fn drain_takes_everything_in_order() {
        let s = sync();
        let a = s.try_submit(drop_at(1, 1, 5.0)).unwrap();
        let b = s.try_submit(drop_at(2, 2, 6.0)).unwrap();
        assert_eq!(a.apply_at_or_after, 1);
        assert!(b.sequence > a.sequence);

        let drained = s.drain();
        assert_eq!(drained.iter().map(|p| p.sequence).collect::<Vec<_>>(), vec![a.sequence, b.sequence]);
        assert!(s.drain().is_empty(), "an action is drained exactly once");
    }

    #[test]
    fn snapshot_is_shared_not_copied() {
        let s = sync();
        let first = s.get_snapshot();
        let second = s.get_snapshot();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn transitions_are_checked() {
        let s = sync();
        assert_eq!(s.status(), SchedulerStatus::Idle);
        assert!(s.transition(SchedulerStatus::Idle, SchedulerStatus::Running).is_ok());
        assert_eq!(
            s.transition(SchedulerStatus::Idle, SchedulerStatus::Running),
            Err(SchedulerStatus::Running)
        );
        assert_eq!(s.get_snapshot().status, SchedulerStatus::Running);
    }
}
