//! End-to-end frame loop scenarios using the scripted collaborators.

use frame_loop::{FrameLoopConfig, FrameOutcome, FramePhase};
use glam::{DMat4, DVec3};
use mock::{make_loop, make_loop_with, RecordingConsumer, ScriptedRenderer};
use xr_abi::{Chirality, SpatialEvent};
use xr_sim::{simulate, SimConfig};
use xr_uniforms::SyncError;

#[test]
fn events_arrive_in_the_frame_after_ingestion() {
    let mut frame_loop = make_loop(FrameLoopConfig::default()).expect("loop");
    let consumer = RecordingConsumer::new();
    frame_loop
        .router()
        .register_consumer(Box::new(consumer.clone()));
    let ingest = frame_loop.router().ingest_handle();

    let m1 = DMat4::from_translation(DVec3::X);
    let m2 = DMat4::from_translation(DVec3::Y);
    ingest.ingest(SpatialEvent::active(1, Chirality::Left, m1));
    frame_loop.run_frame().expect("frame");

    ingest.ingest(SpatialEvent::active(1, Chirality::Left, m2));
    ingest.ingest(SpatialEvent::ended(1, Chirality::Left));
    ingest.ingest(SpatialEvent::ended(7, Chirality::Left));
    frame_loop.run_frame().expect("frame");

    let batches = consumer.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(&*batches[0], &[SpatialEvent::active(1, Chirality::Left, m1)]);
    assert_eq!(
        &*batches[1],
        &[
            SpatialEvent::active(1, Chirality::Left, m2),
            SpatialEvent::ended(1, Chirality::Left),
        ]
    );
    assert_eq!(frame_loop.router().diagnostics().len(), 1);
}

#[test]
fn stalled_renderer_drops_then_recovers() {
    let config = FrameLoopConfig::default();
    let mut frame_loop = make_loop_with(config, ScriptedRenderer::new()).expect("loop");
    frame_loop.renderer_mut().set_stalled(true);

    for _ in 0..config.ring_size {
        assert!(matches!(
            frame_loop.run_frame().expect("frame"),
            FrameOutcome::Presented { .. }
        ));
    }
    for _ in 0..3 {
        assert_eq!(
            frame_loop.run_frame().expect("frame"),
            FrameOutcome::Dropped {
                error: SyncError::SlotExhausted {
                    ring_size: config.ring_size
                }
            }
        );
        assert_eq!(frame_loop.phase(), FramePhase::Idle);
    }
    assert_eq!(frame_loop.renderer().dropped().len(), 3);
    assert_eq!(frame_loop.health().dropped_frames, 3);
    assert!(frame_loop.health().in_relief());

    frame_loop.renderer_mut().set_stalled(false);
    assert!(matches!(
        frame_loop.run_frame().expect("frame"),
        FrameOutcome::Presented { .. }
    ));
    assert_eq!(frame_loop.renderer().in_flight(), 0);
    assert_eq!(frame_loop.synchronizer().in_flight(), 0);
    assert!(!frame_loop.health().flags.render_stalled);
}

#[test]
fn presented_frames_carry_increasing_ids() {
    let mut frame_loop = make_loop(FrameLoopConfig::default()).expect("loop");
    for _ in 0..20 {
        frame_loop.run_frame().expect("frame");
    }
    let ids: Vec<u64> = frame_loop
        .renderer()
        .presented()
        .iter()
        .map(|snapshot| snapshot.frame_id)
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(
        frame_loop.synchronizer().current_frame().map(|s| s.frame_id),
        ids.last().copied()
    );
}

#[test]
fn simulation_delivers_every_accepted_event() {
    let config = SimConfig {
        frames: 120,
        orphans: 2,
        ..SimConfig::default()
    };
    let report = simulate(&config).expect("simulate");
    assert_eq!(report.presented, 120);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.events_ingested, 4 * 31);
    assert_eq!(report.events_delivered, report.events_ingested);
    assert_eq!(report.orphans, 2);
}

#[test]
fn simulation_stall_is_reported_in_health() {
    let config = SimConfig {
        frames: 200,
        stall_at: Some(100),
        stall_for: 10,
        ..SimConfig::default()
    };
    let report = simulate(&config).expect("simulate");
    assert!(report.dropped > 0);
    assert_eq!(report.presented + report.dropped, 200);
    assert_eq!(report.health.dropped_frames, report.dropped);
    assert!(!report.health.flags.render_stalled);
}
