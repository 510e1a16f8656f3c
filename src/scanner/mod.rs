//! Scanner module - the shared orchestration behind every scan mode.
//!
//! A run resolves the host, lets the strategy do its one-off preparation,
//! then fans one task per port out onto a `JoinSet` bounded by a semaphore
//! sized to the target's worker pool. Everything observable is published
//! as [`ScanEvent`]s.

pub mod detection;
pub mod events;
pub mod probe;
pub mod run;
pub mod standard;
pub mod traits;

pub use detection::ServiceDetectionStrategy;
pub use events::{EventSink, ScanEvent};
pub use run::{Progress, RunOutcome, RunPhase, ScanRun};
pub use standard::StandardStrategy;
pub use traits::{PortResult, PortState, ScanMode, ScanStrategy};

use crate::resolver::HostResolver;
use crate::types::ScanTarget;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Execute one scan run to its terminal event.
///
/// Returns the outcome that was published. Per-port failures never surface
/// here; only resolution failure ends a run as `Failed`.
pub async fn run_scan(
    strategy: Arc<dyn ScanStrategy>,
    target: ScanTarget,
    resolver: HostResolver,
    run: Arc<ScanRun>,
    events: EventSink,
) -> RunOutcome {
    let mode = strategy.mode();
    let prefix = mode.status_prefix();

    run.set_phase(RunPhase::Resolving);
    events.status(format!("{} Resolving {} ...", prefix, target.host()));

    let resolved = match resolver.resolve(target.host()).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(host = target.host(), error = %e, "resolution failed");
            events.status(format!("Error: unknown host {}", target.host()));
            let outcome = RunOutcome::Failed(e.to_string());
            run.finish(&outcome, &events);
            return outcome;
        }
    };
    let ip = resolved.ip;
    events.send(ScanEvent::HostResolved { ip });

    if run.is_cancelled() {
        let outcome = RunOutcome::Cancelled;
        run.finish(&outcome, &events);
        return outcome;
    }

    strategy.prepare(ip, &events).await;

    let total = target.total_ports();
    run.set_total(total);
    run.set_phase(RunPhase::Scanning);
    events.send(ScanEvent::Started {
        ip,
        hostname: resolved.hostname.clone(),
        total_ports: total,
    });
    events.status(format!(
        "{} Scanning {} ({}) - ports {}",
        prefix,
        target.host(),
        ip,
        target.ports()
    ));
    info!(
        target = %target,
        %ip,
        %mode,
        workers = target.workers(),
        timeout_ms = strategy.timeout().as_millis() as u64,
        "scan started"
    );

    let host: Arc<str> = Arc::from(target.host());
    let semaphore = Arc::new(Semaphore::new(target.workers()));
    let cancel = run.cancellation().clone();
    let mut set = JoinSet::new();

    for port in target.ports().iter() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let strategy = Arc::clone(&strategy);
        let run = Arc::clone(&run);
        let events = events.clone();
        let host = Arc::clone(&host);

        set.spawn(async move {
            let _permit = permit;

            if !run.is_cancelled() {
                if let Some(result) = strategy.scan_port(ip, &host, port).await {
                    let narration = strategy.narrate(&result);
                    events.send(ScanEvent::Result(result));
                    if let Some(message) = narration {
                        events.status(message);
                    }
                }
            }
            run.complete_one(&events);
        });
    }

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "port task did not complete");
            run.complete_one(&events);
        }
    }

    let outcome = if run.is_cancelled() {
        RunOutcome::Cancelled
    } else {
        RunOutcome::Completed
    };
    debug!(progress = ?run.progress(), ?outcome, "all port tasks drained");
    run.finish(&outcome, &events);
    outcome
}
