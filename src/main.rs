//! Anibus command-line entry point.

use anibus::cli::Args;
use anibus::config::AppSettings;
use anibus::coordinator::ScanCoordinator;
use anibus::output::{self, ScanReport};
use anibus::resolver::{sanitize_host, HostResolver};
use anibus::scanner::{RunOutcome, ScanEvent};
use anibus::services::ServiceRegistry;
use anibus::types::ScanTarget;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(RunOutcome::Failed(_)) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> Result<AppSettings> {
    match &args.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(AppSettings::load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable settings file");
            AppSettings::default()
        })),
    }
}

fn load_registry(args: &Args, settings: &AppSettings) -> Result<ServiceRegistry> {
    let mut registry = ServiceRegistry::builtin();
    for path in args.registry_files(settings) {
        let entries = registry
            .merge_file(&path)
            .with_context(|| format!("loading service registry {}", path.display()))?;
        debug!(path = %path.display(), entries, "registry file merged");
    }
    Ok(registry)
}

async fn run(args: Args) -> Result<RunOutcome> {
    let settings = load_settings(&args)?;
    let registry = Arc::new(load_registry(&args, &settings)?);
    let mode = args.mode(&settings);
    let host = sanitize_host(&args.target);
    if host != args.target.trim() {
        debug!(input = %args.target, %host, "target sanitized");
    }
    let target = ScanTarget::with_range(host, args.ports, args.workers(&settings))?;

    let resolver = HostResolver::new()
        .with_reverse_lookup(args.reverse_dns(&settings))
        .with_timeout(settings.resolve_timeout());
    let mut coordinator = ScanCoordinator::with_timeouts(
        registry,
        settings.standard_timeout(),
        settings.detection_timeout(),
    )
    .with_resolver(resolver);
    coordinator.set_active(mode);

    if !args.quiet {
        output::print_scan_header(target.host(), mode, target.total_ports(), target.workers());
        if args.verbose {
            output::print_info(mode.description());
        }
    }

    let started = Instant::now();
    let mut report = ScanReport::new(&target, mode);
    let mut handle = coordinator.execute(target)?;

    let run = handle.run();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            run.cancel();
        }
    });

    let progress = progress_bar(args.quiet);
    while let Some(event) = handle.next_event().await {
        report.apply(&event);
        match &event {
            ScanEvent::Started { total_ports, .. } => progress.set_length(*total_ports as u64),
            ScanEvent::Progress { completed, .. } => progress.set_position(*completed as u64),
            ScanEvent::Result(result) => {
                progress.set_message(format!("open: {} ({})", result.port, result.service))
            }
            ScanEvent::SubnetDetected { cidr, gateway } if args.verbose => {
                progress.println(format!("Subnet {} via {}", cidr, gateway))
            }
            ScanEvent::Status(message) if args.verbose => progress.println(message),
            ScanEvent::Failed(reason) => output::print_warning(reason),
            _ => {}
        }
    }
    progress.finish_and_clear();

    let outcome = handle.wait().await;
    report.finish(&outcome, started.elapsed());

    output::print_report(&report, args.output)?;
    Ok(outcome)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}
