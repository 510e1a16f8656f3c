//! Scan coordinator: mode selection and run lifecycle.
//!
//! The coordinator owns one strategy per [`ScanMode`] and launches at most
//! one run at a time. Each run gets its own event channel, returned to the
//! caller inside a [`ScanHandle`].

use crate::error::{ScanError, ScanResult};
use crate::resolver::HostResolver;
use crate::scanner::detection::DETECTION_TIMEOUT;
use crate::scanner::standard::STANDARD_TIMEOUT;
use crate::scanner::{
    run_scan, EventSink, Progress, RunOutcome, ScanEvent, ScanMode, ScanRun, ScanStrategy,
    ServiceDetectionStrategy, StandardStrategy,
};
use crate::services::ServiceRegistry;
use crate::types::ScanTarget;
use crate::version::VersionExtractor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Dispatches scans to the active strategy.
pub struct ScanCoordinator {
    standard: Arc<dyn ScanStrategy>,
    detection: Arc<dyn ScanStrategy>,
    active: Option<ScanMode>,
    resolver: HostResolver,
    current: Option<Arc<ScanRun>>,
}

impl ScanCoordinator {
    /// Coordinator with both built-in strategies sharing one registry.
    ///
    /// No mode is active until [`set_active`](Self::set_active) is called.
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self::with_timeouts(registry, STANDARD_TIMEOUT, DETECTION_TIMEOUT)
    }

    /// Like [`new`](Self::new), with explicit per-mode socket timeouts.
    pub fn with_timeouts(
        registry: Arc<ServiceRegistry>,
        standard: Duration,
        detection: Duration,
    ) -> Self {
        let versions = Arc::new(VersionExtractor::new());
        let standard = StandardStrategy::new(Arc::clone(&registry), Arc::clone(&versions))
            .with_timeout(standard);
        let detection = ServiceDetectionStrategy::new(registry, versions).with_timeout(detection);
        Self {
            standard: Arc::new(standard),
            detection: Arc::new(detection),
            active: None,
            resolver: HostResolver::new(),
            current: None,
        }
    }

    /// Replace the strategy used for `mode`.
    pub fn with_strategy(mut self, mode: ScanMode, strategy: Arc<dyn ScanStrategy>) -> Self {
        match mode {
            ScanMode::Standard => self.standard = strategy,
            ScanMode::ServiceDetection => self.detection = strategy,
        }
        self
    }

    pub fn with_resolver(mut self, resolver: HostResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn set_active(&mut self, mode: ScanMode) {
        debug!(%mode, "active scan mode changed");
        self.active = Some(mode);
    }

    /// Select the active mode by its display or short name.
    pub fn set_active_by_name(&mut self, name: &str) -> ScanResult<ScanMode> {
        let mode = name
            .parse::<ScanMode>()
            .map_err(|_| ScanError::UnknownMode(name.to_string()))?;
        self.set_active(mode);
        Ok(mode)
    }

    pub fn active_mode(&self) -> Option<ScanMode> {
        self.active
    }

    fn strategy(&self, mode: ScanMode) -> Arc<dyn ScanStrategy> {
        match mode {
            ScanMode::Standard => Arc::clone(&self.standard),
            ScanMode::ServiceDetection => Arc::clone(&self.detection),
        }
    }

    /// Start a run of the active strategy against `target`.
    ///
    /// Must be called from within a tokio runtime. Fails without starting
    /// anything when no mode is active or a previous run is still going.
    pub fn execute(&mut self, target: ScanTarget) -> ScanResult<ScanHandle> {
        let mode = self.active.ok_or(ScanError::NoActiveMode)?;
        if self.is_scanning() {
            return Err(ScanError::AlreadyRunning);
        }

        let strategy = self.strategy(mode);
        let run = Arc::new(ScanRun::new());
        let (events, rx) = EventSink::channel();
        self.current = Some(Arc::clone(&run));

        debug!(%target, %mode, "launching scan run");
        let task = tokio::spawn(supervise(
            strategy,
            target,
            self.resolver.clone(),
            Arc::clone(&run),
            events,
        ));

        Ok(ScanHandle { events: rx, run, task })
    }

    /// Request cancellation of the current run, if any.
    pub fn cancel(&self) {
        if let Some(run) = &self.current {
            run.cancel();
        }
    }

    /// Progress of the most recent run; zero when nothing has run yet.
    pub fn progress(&self) -> Progress {
        self.current
            .as_ref()
            .map(|run| run.progress())
            .unwrap_or_default()
    }

    pub fn is_scanning(&self) -> bool {
        self.current.as_ref().is_some_and(|run| run.is_running())
    }

    /// Cancel any in-flight run. In-flight probes finish on their own
    /// timeouts.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.active = None;
    }
}

/// Runs the scan on its own task so a panic inside it still yields a
/// terminal `Failed` event.
async fn supervise(
    strategy: Arc<dyn ScanStrategy>,
    target: ScanTarget,
    resolver: HostResolver,
    run: Arc<ScanRun>,
    events: EventSink,
) -> RunOutcome {
    let inner = tokio::spawn(run_scan(
        strategy,
        target,
        resolver,
        Arc::clone(&run),
        events.clone(),
    ));

    match inner.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "scan run aborted");
            let outcome = RunOutcome::Failed(format!("scan aborted: {}", e));
            run.finish(&outcome, &events);
            outcome
        }
    }
}

/// Caller's side of one run.
#[derive(Debug)]
pub struct ScanHandle {
    events: mpsc::UnboundedReceiver<ScanEvent>,
    run: Arc<ScanRun>,
    task: JoinHandle<RunOutcome>,
}

impl ScanHandle {
    /// Next event, or `None` once the run has ended and the stream is drained.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.run.cancel();
    }

    pub fn progress(&self) -> Progress {
        self.run.progress()
    }

    /// Shared run state, for callers that need to cancel from elsewhere.
    pub fn run(&self) -> Arc<ScanRun> {
        Arc::clone(&self.run)
    }

    /// Wait for the run to end, discarding undelivered events.
    pub async fn wait(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::Failed(format!("scan aborted: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> ScanCoordinator {
        ScanCoordinator::new(Arc::new(ServiceRegistry::builtin()))
            .with_resolver(HostResolver::new().with_reverse_lookup(false))
    }

    #[test]
    fn test_mode_selection() {
        let mut coordinator = coordinator();
        assert_eq!(coordinator.active_mode(), None);

        assert_eq!(
            coordinator.set_active_by_name("Service Detection").unwrap(),
            ScanMode::ServiceDetection
        );
        assert_eq!(coordinator.active_mode(), Some(ScanMode::ServiceDetection));

        assert!(matches!(
            coordinator.set_active_by_name("stealth"),
            Err(ScanError::UnknownMode(_))
        ));
        assert_eq!(coordinator.active_mode(), Some(ScanMode::ServiceDetection));
    }

    #[tokio::test]
    async fn test_execute_without_mode() {
        let mut coordinator = coordinator();
        let target = ScanTarget::new("127.0.0.1", 1, 1, 1).unwrap();
        assert!(matches!(coordinator.execute(target), Err(ScanError::NoActiveMode)));
    }

    #[test]
    fn test_idle_state() {
        let coordinator = coordinator();
        assert!(!coordinator.is_scanning());
        assert_eq!(coordinator.progress(), Progress::default());
        coordinator.cancel();
    }
}
