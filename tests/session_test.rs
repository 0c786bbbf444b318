//! End-to-end session tests
//!
//! Drive the correlation engine through real transports (the in-process
//! loopback echo and a UDP socket pair) and check the measurement
//! guarantees: one entry per matched response, one loss per expiry,
//! idempotent duplicates, arrival ordering.

use mesh_range_tester::measurement::MeasurementLog;
use mesh_range_tester::models::LinkQuality;
use mesh_range_tester::probe::collector::CollectOutcome;
use mesh_range_tester::probe::scheduler::TickOutcome;
use mesh_range_tester::probe::{PendingProbes, ProbeScheduler, ResponseCollector, SessionStats};
use mesh_range_tester::telemetry::{NoopLocationProvider, TelemetrySampler};
use mesh_range_tester::transport::{inbound_channel, InboundFrame, LoopbackTransport, MeshTransport, UdpTransport};
use mesh_range_tester::types::GpsPolicy;
use mesh_range_tester::wire::ResponsePayload;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

struct Session {
    scheduler: ProbeScheduler,
    collector: ResponseCollector,
    pending: Arc<PendingProbes>,
    stats: Arc<SessionStats>,
    log: Arc<MeasurementLog>,
    inbound: mpsc::Receiver<InboundFrame>,
}

fn session_over(transport: Arc<dyn MeshTransport>, inbound: mpsc::Receiver<InboundFrame>) -> Session {
    let pending = Arc::new(PendingProbes::new());
    let stats = Arc::new(SessionStats::new());
    let log = Arc::new(MeasurementLog::in_memory());
    let sampler = TelemetrySampler::new(
        Arc::new(NoopLocationProvider),
        Duration::from_secs(1),
        GpsPolicy::Lenient,
    );

    Session {
        scheduler: ProbeScheduler::new(transport, pending.clone(), stats.clone()),
        collector: ResponseCollector::new(pending.clone(), stats.clone(), sampler, log.clone()),
        pending,
        stats,
        log,
        inbound,
    }
}

fn loopback_session(configure: impl FnOnce(LoopbackTransport) -> LoopbackTransport) -> Session {
    let (tx, rx) = inbound_channel();
    let transport = Arc::new(configure(LoopbackTransport::new(tx)));
    session_over(transport, rx)
}

async fn recv_frame(session: &mut Session) -> InboundFrame {
    tokio::time::timeout(Duration::from_secs(2), session.inbound.recv())
        .await
        .expect("timed out waiting for inbound frame")
        .expect("inbound channel closed")
}

#[tokio::test]
async fn matched_response_produces_one_entry_with_expected_rtt() {
    let mut session = loopback_session(|t| t.with_response_delay(Duration::from_millis(120)));

    assert!(matches!(session.scheduler.tick().await, TickOutcome::Sent(1)));

    let frame = recv_frame(&mut session).await;
    let outcome = session.collector.process(frame).await;

    match outcome {
        CollectOutcome::Recorded(entry) => {
            assert_eq!(entry.sequence, 1);
            assert!(entry.rtt >= Duration::from_millis(120), "rtt was {:?}", entry.rtt);
            assert!(entry.rtt < Duration::from_secs(2));
        }
        other => panic!("expected Recorded, got {:?}", other),
    }

    assert_eq!(session.log.len(), 1);
    assert_eq!(session.stats.summary(), "1/1");
    assert!(session.pending.is_empty());
}

#[tokio::test]
async fn unanswered_probe_becomes_exactly_one_loss() {
    // Every response dropped: the pending entry can only expire
    let session = loopback_session(|t| t.with_drop_every(1));

    assert!(matches!(session.scheduler.tick().await, TickOutcome::Sent(1)));
    assert_eq!(session.pending.len(), 1);

    tokio::time::sleep(Duration::from_millis(60)).await;

    let evicted = session
        .pending
        .sweep_expired(Instant::now(), Duration::from_millis(50));
    assert_eq!(evicted, vec![1]);
    for _ in &evicted {
        session.stats.record_loss();
    }

    // A second sweep finds nothing; the loss is counted once
    assert!(session
        .pending
        .sweep_expired(Instant::now(), Duration::from_millis(50))
        .is_empty());
    assert_eq!(session.stats.lost(), 1);
    assert!(session.log.is_empty());
}

#[tokio::test]
async fn duplicate_responses_record_exactly_one_entry() {
    let mut session = loopback_session(|t| {
        t.with_response_delay(Duration::from_millis(5)).with_duplicate_every(1)
    });

    session.scheduler.tick().await;

    let first = recv_frame(&mut session).await;
    let second = recv_frame(&mut session).await;

    assert!(matches!(session.collector.process(first).await, CollectOutcome::Recorded(_)));
    assert!(matches!(session.collector.process(second).await, CollectOutcome::Unmatched(1)));

    assert_eq!(session.log.len(), 1);
    assert_eq!(session.stats.succeeded(), 1);
}

#[tokio::test]
async fn late_response_after_sweep_is_discarded() {
    let mut session = loopback_session(|t| t.with_response_delay(Duration::from_millis(80)));

    session.scheduler.tick().await;

    // Sweep with a tiny timeout before the response arrives
    tokio::time::sleep(Duration::from_millis(20)).await;
    let evicted = session
        .pending
        .sweep_expired(Instant::now(), Duration::from_millis(10));
    assert_eq!(evicted, vec![1]);

    let frame = recv_frame(&mut session).await;
    assert!(matches!(session.collector.process(frame).await, CollectOutcome::Unmatched(1)));
    assert!(session.log.is_empty());
}

#[tokio::test]
async fn entries_follow_response_arrival_order() {
    let session = loopback_session(|t| t);
    let now = Instant::now();
    session.pending.insert(1, now);
    session.pending.insert(2, now);

    // Responses arrive reordered
    let pong = |n: u64| InboundFrame::new(ResponsePayload::new(n).encode().unwrap(), None);
    session.collector.process(pong(2)).await;
    session.collector.process(pong(1)).await;

    let sequences: Vec<u64> = session.log.snapshot().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![2, 1]);
}

#[tokio::test]
async fn link_metadata_flows_from_transport_to_entry() {
    let link = LinkQuality { rssi: Some(-104), snr: Some(-1.25) };
    let mut session = loopback_session(|t| {
        t.with_response_delay(Duration::from_millis(5)).with_link(link)
    });

    session.scheduler.tick().await;

    let frame = recv_frame(&mut session).await;
    session.collector.process(frame).await;

    assert_eq!(session.log.snapshot()[0].link, Some(link));
}

#[tokio::test]
async fn udp_round_trip_through_responder() {
    use tokio::sync::watch;

    let (_stop_tx, stop_rx) = watch::channel(false);

    // Pick a free port for the responder
    let probe_socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let responder_addr = probe_socket.local_addr().unwrap();
    drop(probe_socket);

    let responder = tokio::spawn({
        let bind = responder_addr.to_string();
        async move { mesh_range_tester::responder::run(&bind, stop_rx).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (tx, rx) = inbound_channel();
    let transport = Arc::new(
        UdpTransport::bind(responder_addr.to_string(), tx).await.unwrap(),
    );
    let mut session = session_over(transport.clone(), rx);

    assert!(transport.resolve_destination().await.unwrap());
    assert!(matches!(session.scheduler.tick().await, TickOutcome::Sent(1)));

    let frame = recv_frame(&mut session).await;
    match session.collector.process(frame).await {
        CollectOutcome::Recorded(entry) => {
            assert_eq!(entry.sequence, 1);
            // UDP reports no link quality
            assert!(entry.link.is_none());
        }
        other => panic!("expected Recorded, got {:?}", other),
    }

    responder.abort();
}
