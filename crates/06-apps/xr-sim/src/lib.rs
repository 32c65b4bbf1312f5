//! Headless simulation of a compositor driving the frame loop while a
//! tracking thread streams spatial events.

use std::path::Path;
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;
use frame_loop::{FrameHealth, FrameLoopConfig, FrameOutcome};
use log::{debug, info, warn};
use mock::{hands_at, make_loop_with, pinch, RecordingConsumer, ScriptedRenderer, ScriptedTracker};
use serde::Deserialize;
use xr_abi::{Chirality, LayerState, SpatialEvent};

/// Simulation settings; every field may be omitted from the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub frame_loop: FrameLoopConfig,
    pub frames: u64,
    /// Frames each presented snapshot stays in flight.
    pub hold_frames: u64,
    pub gestures: usize,
    pub samples_per_gesture: usize,
    /// Events the tracking thread ingests per frame.
    pub events_per_frame: usize,
    /// Terminal events appended for ids that were never opened.
    pub orphans: usize,
    pub stall_at: Option<u64>,
    pub stall_for: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_loop: FrameLoopConfig::default(),
            frames: 600,
            hold_frames: 1,
            gestures: 4,
            samples_per_gesture: 30,
            events_per_frame: 3,
            orphans: 0,
            stall_at: None,
            stall_for: 10,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn script(&self) -> ScriptedTracker {
        let gestures = (0..self.gestures)
            .map(|idx| {
                let chirality = if idx % 2 == 0 {
                    Chirality::Left
                } else {
                    Chirality::Right
                };
                pinch(idx as i32 + 1, chirality, self.samples_per_gesture)
            })
            .collect();
        let mut script = ScriptedTracker::interleaved(gestures).script().to_vec();
        script.extend(
            (0..self.orphans).map(|idx| SpatialEvent::ended(10_000 + idx as i32, Chirality::Left)),
        );
        ScriptedTracker::new(script)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimReport {
    pub presented: u64,
    pub dropped: u64,
    pub skipped: u64,
    pub events_ingested: usize,
    pub events_delivered: usize,
    pub orphans: usize,
    pub health: FrameHealth,
}

/// Runs the simulation to completion and closes the immersive space.
pub fn simulate(config: &SimConfig) -> Result<SimReport> {
    let renderer = ScriptedRenderer::new().holding(config.hold_frames);
    let mut frame_loop =
        make_loop_with(config.frame_loop, renderer).context("failed to build frame loop")?;
    let consumer = RecordingConsumer::new();
    frame_loop
        .router()
        .register_consumer(Box::new(consumer.clone()));

    let ingest = frame_loop.router().ingest_handle();
    let mut tracker = config.script();
    let events_per_frame = config.events_per_frame;
    let (tick_tx, tick_rx) = bounded::<u64>(1);
    let (ack_tx, ack_rx) = bounded::<usize>(1);
    let tracking = thread::Builder::new()
        .name("tracking".into())
        .spawn(move || {
            for frame in tick_rx {
                let accepted = tracker.feed(&ingest, events_per_frame);
                ingest.post_hands(hands_at(frame));
                if ack_tx.send(accepted).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn tracking thread")?;

    let mut report = SimReport::default();
    for frame in 0..config.frames {
        if config.stall_at == Some(frame) {
            warn!("stalling renderer for {} frames", config.stall_for);
            frame_loop.renderer_mut().set_stalled(true);
        }
        if config.stall_at.map(|at| at + config.stall_for) == Some(frame) {
            info!("renderer recovered at frame {frame}");
            frame_loop.renderer_mut().set_stalled(false);
        }

        tick_tx.send(frame).context("tracking thread exited")?;
        report.events_ingested += ack_rx.recv().context("tracking thread exited")?;

        match frame_loop.run_frame().context("frame loop misuse")? {
            FrameOutcome::Presented { frame_id, events } => {
                report.presented += 1;
                debug!("frame {frame_id} presented with {events} events");
            }
            FrameOutcome::Dropped { error } => {
                report.dropped += 1;
                debug!("frame {frame} dropped: {error}");
            }
            FrameOutcome::Skipped { .. } => report.skipped += 1,
        }
    }
    drop(tick_tx);
    tracking
        .join()
        .map_err(|_| anyhow!("tracking thread panicked"))?;

    // Deliver whatever arrived after the last frame.
    frame_loop.router().dispatch();
    frame_loop.on_layer_state(LayerState::Invalidated);

    report.events_delivered = consumer.events().len();
    report.orphans = frame_loop.router().take_diagnostics().len();
    report.health = frame_loop.health();
    info!(
        "presented {} dropped {} skipped {}; events ingested {} delivered {} orphans {}",
        report.presented,
        report.dropped,
        report.skipped,
        report.events_ingested,
        report.events_delivered,
        report.orphans
    );
    Ok(report)
}
