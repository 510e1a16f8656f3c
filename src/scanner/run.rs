//! Shared in-flight state of one scan run.
//!
//! The completion counter and the cancellation token are the only state
//! worker tasks share. Both are lock-free; the publish lock below only
//! orders progress events on the channel.

use super::events::{EventSink, ScanEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifecycle of a run: `Idle → Resolving → Scanning → terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum RunPhase {
    Idle = 0,
    Resolving = 1,
    Scanning = 2,
    Completed = 3,
    Cancelled = 4,
    Failed = 5,
}

impl RunPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Resolving,
            2 => Self::Scanning,
            3 => Self::Completed,
            4 => Self::Cancelled,
            5 => Self::Failed,
            _ => Self::Idle,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl RunOutcome {
    fn phase(&self) -> RunPhase {
        match self {
            Self::Completed => RunPhase::Completed,
            Self::Cancelled => RunPhase::Cancelled,
            Self::Failed(_) => RunPhase::Failed,
        }
    }

    fn event(&self) -> ScanEvent {
        match self {
            Self::Completed => ScanEvent::Completed,
            Self::Cancelled => ScanEvent::Cancelled,
            Self::Failed(reason) => ScanEvent::Failed(reason.clone()),
        }
    }
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// In-flight state of one coordinator invocation.
#[derive(Debug)]
pub struct ScanRun {
    phase: AtomicU8,
    total: AtomicUsize,
    completed: AtomicUsize,
    cancel: CancellationToken,
    terminated: AtomicBool,
    publish: Mutex<()>,
}

impl Default for ScanRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanRun {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(RunPhase::Idle as u8),
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
            terminated: AtomicBool::new(false),
            publish: Mutex::new(()),
        }
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: RunPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Whether the run has not yet reached a terminal state.
    pub fn is_running(&self) -> bool {
        !self.phase().is_terminal() && !self.terminated.load(Ordering::Acquire)
    }

    /// Request cooperative cancellation. One-way; never cleared.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token handed to anything that needs to observe cancellation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }

    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Release);
    }

    /// Count one finished task and publish the new progress.
    ///
    /// Increment and send happen under the publish lock so that consumers
    /// observe non-decreasing counts. The counter is capped at the total.
    pub(crate) fn complete_one(&self, events: &EventSink) -> Progress {
        let _guard = self.publish.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let total = self.total.load(Ordering::Acquire);
        let bump = |done: usize| (done < total).then_some(done + 1);
        let completed = self
            .completed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, bump)
            .map_or_else(|current| current, |previous| previous + 1);
        let progress = Progress { completed, total };
        events.send(ScanEvent::Progress { completed, total });
        progress
    }

    /// Move to the terminal state and publish its event, exactly once.
    ///
    /// Returns `false` if the run had already terminated.
    pub(crate) fn finish(&self, outcome: &RunOutcome, events: &EventSink) -> bool {
        if self
            .terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.set_phase(outcome.phase());
        debug!(?outcome, progress = ?self.progress(), "scan run finished");
        events.send(outcome.event());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_never_exceeds_total() {
        let (events, _rx) = EventSink::channel();
        let run = ScanRun::new();
        run.set_total(2);

        assert_eq!(run.complete_one(&events).completed, 1);
        assert_eq!(run.complete_one(&events).completed, 2);
        assert_eq!(run.complete_one(&events).completed, 2);
        assert_eq!(run.progress(), Progress { completed: 2, total: 2 });
    }

    #[tokio::test]
    async fn test_finish_is_exactly_once() {
        let (events, mut rx) = EventSink::channel();
        let run = ScanRun::new();

        assert!(run.is_running());
        assert!(run.finish(&RunOutcome::Completed, &events));
        assert!(!run.finish(&RunOutcome::Failed("late".into()), &events));
        drop(events);

        assert_eq!(run.phase(), RunPhase::Completed);
        assert!(!run.is_running());
        assert_eq!(rx.recv().await, Some(ScanEvent::Completed));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_cancel_is_one_way() {
        let run = ScanRun::new();
        assert!(!run.is_cancelled());
        run.cancel();
        run.cancel();
        assert!(run.is_cancelled());
    }
}
