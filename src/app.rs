//! Application orchestration
//!
//! Wires the transport, correlation engine, telemetry sampler, measurement
//! log, and exporter together and runs the three long-lived activities: the
//! probe loop (which also sweeps timeouts), the announce loop, and the
//! collector task consuming inbound frames. Ctrl+C flips a stop flag; the
//! loops finish their iteration, a final export pass runs, and the summary
//! is printed.

use crate::config::Config;
use crate::error::Result;
use crate::export::ExportManager;
use crate::measurement::MeasurementLog;
use crate::output::Reporter;
use crate::probe::collector::CollectOutcome;
use crate::probe::scheduler::TickOutcome;
use crate::probe::{PendingProbes, ProbeScheduler, ResponseCollector, SessionStats};
use crate::telemetry::{
    CommandLocationProvider, LocationProvider, NoopLocationProvider, TelemetrySampler,
};
use crate::transport::{inbound_channel, InboundFrame, LoopbackTransport, MeshTransport, UdpTransport};
use crate::types::{ExportCadence, ExportFormat};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

/// Name of the JSONL measurement store inside the export directory
const STORE_FILENAME: &str = "range_test.jsonl";

/// How often the initial path-establishment wait re-checks resolution
const PATH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Mode and policy switches that come from the CLI rather than the config
pub struct AppOptions {
    /// Use the in-process echo transport instead of UDP
    pub loopback: bool,
    /// Skip the location provider entirely
    pub no_gps: bool,
    /// Formats to copy to the downloads folder at shutdown
    pub download_formats: Vec<ExportFormat>,
}

/// One measurement session end to end
pub struct RangeTestApp {
    config: Config,
    options: AppOptions,
    transport: Arc<dyn MeshTransport>,
    pending: Arc<PendingProbes>,
    stats: Arc<SessionStats>,
    log: Arc<MeasurementLog>,
    exporter: Arc<ExportManager>,
    reporter: Arc<Reporter>,
    inbound: mpsc::Receiver<InboundFrame>,
}

impl RangeTestApp {
    /// Build every component; transport initialization failure is the only
    /// fatal startup error
    pub async fn new(config: Config, options: AppOptions) -> Result<Self> {
        let (inbound_tx, inbound_rx) = inbound_channel();

        let transport: Arc<dyn MeshTransport> = if options.loopback {
            Arc::new(LoopbackTransport::new(inbound_tx))
        } else {
            Arc::new(
                UdpTransport::bind(config.base_station_destination.clone(), inbound_tx).await?,
            )
        };

        let exporter = Arc::new(ExportManager::new(config.export_dir.clone())?);
        let log = Arc::new(MeasurementLog::with_store(
            &config.export_dir.join(STORE_FILENAME),
        )?);

        let reporter = Arc::new(Reporter::new(config.enable_color, config.verbose, config.debug));

        Ok(Self {
            config,
            options,
            transport,
            pending: Arc::new(PendingProbes::new()),
            stats: Arc::new(SessionStats::new()),
            log,
            exporter,
            reporter,
            inbound: inbound_rx,
        })
    }

    /// Run the session until the stop flag flips
    pub async fn run(self, stop: watch::Receiver<bool>) -> Result<()> {
        let Self {
            config,
            options,
            transport,
            pending,
            stats,
            log,
            exporter,
            reporter,
            inbound,
        } = self;

        reporter.startup(
            &config.display_name,
            &config.base_station_destination,
            &transport.local_address_hex(),
        );
        reporter.debug_line(&format!("session {}", log.session()));

        let sampler = build_sampler(&config, &options);
        let collector = ResponseCollector::new(pending.clone(), stats.clone(), sampler, log.clone());

        let collector_task = tokio::spawn(collector_loop(
            collector,
            inbound,
            log.clone(),
            exporter.clone(),
            reporter.clone(),
            stats.clone(),
            config.export_cadence,
            stop.clone(),
        ));

        let announce_task = tokio::spawn(announce_loop(
            transport.clone(),
            config.display_name.clone(),
            config.announce_interval(),
            reporter.clone(),
            stop.clone(),
        ));

        let scheduler = ProbeScheduler::new(transport.clone(), pending.clone(), stats.clone());

        probe_loop(&config, &scheduler, &transport, &pending, &stats, &reporter, stop).await;

        announce_task.abort();

        // Let the collector finish its in-flight frame before snapshotting;
        // it exits on its own once the stop flag has flipped
        let _ = collector_task.await;

        // Drain on shutdown: the export files always reflect the final log
        let snapshot = log.snapshot();
        for (_, result) in exporter.write_all(&snapshot) {
            match result {
                Ok(path) => reporter.export_written(&path),
                Err(e) => reporter.export_failed(&e),
            }
        }

        match exporter.copy_to_downloads(&options.download_formats) {
            Ok(copied) => reporter.downloads_copied(&copied),
            Err(e) => reporter.export_failed(&e),
        }

        reporter.summary(&stats, log.len(), exporter.export_dir());
        Ok(())
    }
}

fn build_sampler(config: &Config, options: &AppOptions) -> TelemetrySampler {
    let provider: Arc<dyn LocationProvider> = if options.no_gps {
        Arc::new(NoopLocationProvider)
    } else {
        match CommandLocationProvider::from_command_line(&config.location_command) {
            Some(provider) => Arc::new(provider),
            None => Arc::new(NoopLocationProvider),
        }
    };
    TelemetrySampler::new(provider, config.location_timeout(), config.gps_policy)
}

/// The probe loop: path establishment, pre-ping delay, then tick and sweep
/// every `ping_interval` until stopped
async fn probe_loop(
    config: &Config,
    scheduler: &ProbeScheduler,
    transport: &Arc<dyn MeshTransport>,
    pending: &Arc<PendingProbes>,
    stats: &Arc<SessionStats>,
    reporter: &Arc<Reporter>,
    mut stop: watch::Receiver<bool>,
) {
    // Bounded initial wait; an unresolved destination defers probes rather
    // than aborting the run
    reporter.waiting_for_path();
    let deadline = Instant::now() + config.path_establishment_wait();
    while !transport.is_resolved() && Instant::now() < deadline && !*stop.borrow() {
        let _ = transport.resolve_destination().await;
        if transport.is_resolved() {
            break;
        }
        sleep_or_stop(PATH_POLL_INTERVAL, &mut stop).await;
    }
    if transport.is_resolved() {
        reporter.path_established();
    }

    if !*stop.borrow() && config.pre_ping_delay > 0 {
        sleep_or_stop(config.pre_ping_delay(), &mut stop).await;
    }

    reporter.starting(config.ping_interval);

    while !*stop.borrow() {
        if config.ping_delay > 0 {
            sleep_or_stop(config.ping_delay(), &mut stop).await;
            if *stop.borrow() {
                break;
            }
        }

        match scheduler.tick().await {
            TickOutcome::Sent(sequence) => reporter.probe_sent(sequence),
            TickOutcome::Deferred => reporter.probe_deferred(),
            TickOutcome::SendFailed { sequence, error } => reporter.send_failed(sequence, &error),
        }

        for sequence in pending.sweep_expired(Instant::now(), config.ping_timeout()) {
            stats.record_loss();
            reporter.timeout(sequence);
        }

        sleep_or_stop(config.ping_interval(), &mut stop).await;
    }
}

/// Consume inbound frames until stopped; incremental cadence re-renders the
/// export files after every recorded entry
#[allow(clippy::too_many_arguments)]
async fn collector_loop(
    collector: ResponseCollector,
    mut inbound: mpsc::Receiver<InboundFrame>,
    log: Arc<MeasurementLog>,
    exporter: Arc<ExportManager>,
    reporter: Arc<Reporter>,
    stats: Arc<SessionStats>,
    cadence: ExportCadence,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            frame = inbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            _ = stop.changed() => {
                if *stop.borrow() {
                    break;
                }
                continue;
            }
        };

        match collector.process(frame).await {
            CollectOutcome::Recorded(entry) => {
                reporter.pong(&entry, &stats);
                if cadence == ExportCadence::Incremental {
                    let snapshot = log.snapshot();
                    for (_, result) in exporter.write_all(&snapshot) {
                        match result {
                            Ok(path) => reporter.export_written(&path),
                            Err(e) => reporter.export_failed(&e),
                        }
                    }
                }
            }
            CollectOutcome::Discarded { sequence, rtt } => {
                reporter.pong_discarded(sequence, rtt.as_secs_f64() * 1000.0, &stats);
            }
            CollectOutcome::Unmatched(sequence) => {
                reporter.debug_line(&format!("late or duplicate pong #{}", sequence));
            }
            CollectOutcome::Ignored => {
                reporter.debug_line("ignored foreign frame");
            }
        }
    }
}

/// Best-effort presence announces on an independent period
async fn announce_loop(
    transport: Arc<dyn MeshTransport>,
    display_name: String,
    interval: Duration,
    reporter: Arc<Reporter>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match transport.announce(&display_name).await {
                    Ok(()) => reporter.announced(),
                    Err(e) => reporter.announce_failed(&e),
                }
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    break;
                }
            }
        }
    }
}

/// Sleep that wakes early when the stop flag flips
async fn sleep_or_stop(duration: Duration, stop: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = stop.changed() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsFix;
    use crate::telemetry::{LocationProvider, TelemetrySampler};
    use crate::types::GpsPolicy;
    use crate::wire::ResponsePayload;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Provider whose fix takes long enough for a stop to land mid-sample
    struct SlowProvider;

    #[async_trait]
    impl LocationProvider for SlowProvider {
        async fn current_fix(&self) -> crate::error::Result<Option<GpsFix>> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_measurement() {
        let dir = TempDir::new().unwrap();
        let (inbound_tx, inbound_rx) = inbound_channel();
        let pending = Arc::new(PendingProbes::new());
        let stats = Arc::new(SessionStats::new());
        let log = Arc::new(MeasurementLog::in_memory());
        let exporter = Arc::new(ExportManager::new(dir.path().to_path_buf()).unwrap());
        let reporter = Arc::new(Reporter::new(false, false, false));

        let sampler = TelemetrySampler::new(
            Arc::new(SlowProvider),
            Duration::from_secs(1),
            GpsPolicy::Lenient,
        );
        let collector = ResponseCollector::new(pending.clone(), stats.clone(), sampler, log.clone());

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(collector_loop(
            collector,
            inbound_rx,
            log.clone(),
            exporter,
            reporter,
            stats,
            ExportCadence::OnShutdown,
            stop_rx,
        ));

        pending.insert(1, Instant::now());
        inbound_tx
            .send(InboundFrame::new(ResponsePayload::new(1).encode().unwrap(), None))
            .await
            .unwrap();

        // Stop lands while the telemetry sample is still in progress
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();

        // The loop finishes the frame it already took before exiting
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].sequence, 1);
    }
}
