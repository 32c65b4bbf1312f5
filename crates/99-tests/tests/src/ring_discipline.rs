//! Property checks for the uniform ring under arbitrary begin/publish/release
//! interleavings.

use proptest::collection;
use proptest::prelude::*;
use xr_abi::{ProjectionParams, ViewerPose};
use xr_uniforms::{
    FrameSlotHandle, FrameUniformSynchronizer, SyncConfig, SyncError, MAX_RING_SIZE,
    MIN_RING_SIZE,
};

#[derive(Clone, Debug)]
enum Op {
    Begin,
    Publish(usize),
    Release(usize),
    Discard(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Begin),
        2 => any::<usize>().prop_map(Op::Publish),
        2 => any::<usize>().prop_map(Op::Release),
        1 => any::<usize>().prop_map(Op::Discard),
    ]
}

proptest! {
    /// Slot accounting, exhaustion and the current snapshot always agree with a
    /// simple model of writing and published frames.
    #[test]
    fn ring_matches_model(
        ring_size in MIN_RING_SIZE..=MAX_RING_SIZE,
        ops in collection::vec(op(), 1..200),
    ) {
        let sync = FrameUniformSynchronizer::new(SyncConfig { ring_size }).expect("sync");
        let pose = ViewerPose::default();
        let params = ProjectionParams::default();

        let mut writing: Vec<FrameSlotHandle> = Vec::new();
        let mut published: Vec<FrameSlotHandle> = Vec::new();
        let mut current: Option<u64> = None;
        let mut last_frame_id = 0u64;

        for op in ops {
            match op {
                Op::Begin => {
                    let held = writing.len() + published.len();
                    match sync.begin_frame(&pose, &params) {
                        Ok(handle) => {
                            prop_assert!(held < ring_size as usize);
                            prop_assert!(handle.frame_id() > last_frame_id, "frame ids increase");
                            last_frame_id = handle.frame_id();
                            writing.push(handle);
                        }
                        Err(err) => {
                            prop_assert_eq!(held, ring_size as usize);
                            prop_assert_eq!(err, SyncError::SlotExhausted { ring_size });
                        }
                    }
                }
                Op::Publish(pick) if !writing.is_empty() => {
                    let handle = writing.remove(pick % writing.len());
                    match sync.publish(handle) {
                        Ok(snapshot) => {
                            prop_assert!(current.map_or(true, |id| id <= handle.frame_id()));
                            prop_assert_eq!(snapshot.frame_id, handle.frame_id());
                            current = Some(handle.frame_id());
                            published.push(handle);
                        }
                        Err(SyncError::StaleFrame { frame_id, current: newer }) => {
                            prop_assert_eq!(frame_id, handle.frame_id());
                            prop_assert_eq!(Some(newer), current);
                            sync.discard(handle).expect("discard stale");
                        }
                        Err(other) => prop_assert!(false, "unexpected {:?}", other),
                    }
                }
                Op::Release(pick) if !published.is_empty() => {
                    let handle = published.remove(pick % published.len());
                    sync.release(handle).expect("release");
                    prop_assert!(sync.release(handle).is_err(), "double release rejected");
                }
                Op::Discard(pick) if !writing.is_empty() => {
                    let handle = writing.remove(pick % writing.len());
                    sync.discard(handle).expect("discard");
                    prop_assert!(sync.publish(handle).is_err(), "discarded slot cannot publish");
                }
                _ => {}
            }

            let held = (writing.len() + published.len()) as u32;
            prop_assert_eq!(sync.in_flight(), held);
            prop_assert_eq!(sync.free_slots(), ring_size - held);
            prop_assert_eq!(sync.current_frame().map(|s| s.frame_id), current);
        }
    }
}

#[test]
fn every_frame_renders_both_eyes() {
    let sync = FrameUniformSynchronizer::new(SyncConfig::default()).expect("sync");
    let params = ProjectionParams::default();
    let handle = sync
        .begin_frame(&ViewerPose::default(), &params)
        .expect("begin");
    let snapshot = sync.publish(handle).expect("publish");
    assert_eq!(snapshot.uniforms.left().projection, params.left.projection);
    assert_eq!(snapshot.uniforms.right().projection, params.right.projection);
    assert_ne!(
        snapshot.uniforms.left().view,
        snapshot.uniforms.right().view,
        "eyes are offset"
    );
}
