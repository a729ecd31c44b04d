/*!
 * Scavenge Tests
 * Draining order, validation, failure absorption and concurrency
 */

use crate::common::{builder, three_block_scavenger, CountingModule, ScriptedClaimer, BLOCK};
use memscav::core::types::{NodeId, PhysAddr};
use memscav::memory::{LatchState, MemoryError, NodeAffinity};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

mock! {
    pub Nodes {}

    impl NodeAffinity for Nodes {
        fn node_for(&self, addr: PhysAddr) -> NodeId;
    }
}

#[test]
fn test_rejects_zero_and_partial_blocks() {
    let claimer = ScriptedClaimer::succeeding();
    let scavenger = three_block_scavenger(claimer.clone());

    for requested in [0, 0x8000, BLOCK + 1] {
        let err = scavenger.scavenge(requested).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArgument(_)), "{requested:#x}");
    }

    assert_eq!(scavenger.hidden_blocks(), vec![0x10000, 0x20000, 0x40000]);
    assert!(claimer.calls().is_empty());
    assert_eq!(scavenger.latch_state(), LatchState::Unloadable);
}

#[test]
fn test_failed_claim_still_consumes_block() {
    let claimer = ScriptedClaimer::failing_at(&[0x20000]);
    let scavenger = three_block_scavenger(claimer.clone());

    let consumed = scavenger.scavenge(0x20000).unwrap();

    assert_eq!(consumed, 0x20000);
    assert_eq!(claimer.claimed_addrs(), vec![0x10000, 0x20000]);
    assert_eq!(scavenger.hidden_blocks(), vec![0x40000]);
    assert_eq!(scavenger.latch_state(), LatchState::Pinned);
}

#[test]
fn test_blocks_taken_lowest_first_in_one_block_steps() {
    let claimer = ScriptedClaimer::succeeding();
    let scavenger = three_block_scavenger(claimer.clone());

    assert_eq!(scavenger.scavenge(BLOCK).unwrap(), BLOCK);
    assert_eq!(scavenger.scavenge(BLOCK).unwrap(), BLOCK);

    assert_eq!(claimer.claimed_addrs(), vec![0x10000, 0x20000]);
    assert!(claimer.calls().iter().all(|c| c.size == BLOCK));
    assert_eq!(scavenger.hidden_count(), 1);
}

#[test]
fn test_over_request_stops_at_empty_registry() {
    let claimer = ScriptedClaimer::succeeding();
    let scavenger = three_block_scavenger(claimer.clone());

    assert_eq!(scavenger.scavenge(10 * BLOCK).unwrap(), 3 * BLOCK);
    assert_eq!(scavenger.hidden_count(), 0);
    assert_eq!(claimer.calls().len(), 3);
}

#[test]
fn test_empty_registry_consumes_nothing() {
    let claimer = ScriptedClaimer::succeeding();
    // The only candidate is claimed by someone else.
    let scavenger = builder(&[(0x0, 0x20000)], &[0x0], claimer.clone())
        .build()
        .unwrap();

    assert_eq!(scavenger.hidden_count(), 0);
    assert_eq!(scavenger.scavenge(BLOCK).unwrap(), 0);
    assert_eq!(scavenger.latch_state(), LatchState::Unloadable);
    assert!(claimer.calls().is_empty());
}

#[test]
fn test_all_claims_failing_still_pins() {
    let claimer = ScriptedClaimer::failing_always();
    let scavenger = three_block_scavenger(claimer.clone());

    assert_eq!(scavenger.scavenge(3 * BLOCK).unwrap(), 3 * BLOCK);
    assert_eq!(scavenger.hidden_count(), 0);
    assert!(scavenger.is_pinned());
}

#[test]
fn test_refused_reference_leaves_subsystem_unloadable() {
    let module = CountingModule::refusing();
    let scavenger = builder(&[(0x0, 0x60000)], &[0x0, 0x30000], ScriptedClaimer::succeeding())
        .with_module_ref(module.clone())
        .build()
        .unwrap();

    assert_eq!(scavenger.scavenge(BLOCK).unwrap(), BLOCK);
    assert_eq!(scavenger.latch_state(), LatchState::Unloadable);
    assert_eq!(module.gets(), 0);
}

#[test]
fn test_claim_receives_node_hint_and_label() {
    let mut nodes = MockNodes::new();
    nodes
        .expect_node_for()
        .times(3)
        .returning(|addr| if addr >= 0x40000 { 1 } else { 0 });

    let claimer = ScriptedClaimer::succeeding();
    let scavenger = builder(&[(0x0, 0x60000)], &[0x0, 0x30000], claimer.clone())
        .with_node_affinity(Arc::new(nodes))
        .with_label("Hidden RAM")
        .build()
        .unwrap();

    scavenger.scavenge(3 * BLOCK).unwrap();

    let calls = claimer.calls();
    let placed: Vec<(PhysAddr, NodeId)> = calls.iter().map(|c| (c.addr, c.node)).collect();
    assert_eq!(placed, vec![(0x10000, 0), (0x20000, 0), (0x40000, 1)]);
    assert!(calls.iter().all(|c| c.label == "Hidden RAM"));
}

#[test]
fn test_default_label_and_node() {
    let claimer = ScriptedClaimer::succeeding();
    let scavenger = three_block_scavenger(claimer.clone());

    scavenger.scavenge(BLOCK).unwrap();

    let call = &claimer.calls()[0];
    assert_eq!(call.node, 0);
    assert_eq!(call.label, "System RAM (memscav)");
}

#[test]
fn test_concurrent_scavenges_never_share_a_block() {
    let claimer = ScriptedClaimer::succeeding();
    let scavenger = Arc::new(
        builder(&[(0x0, 0x1000000)], &[], claimer.clone())
            .build()
            .unwrap(),
    );
    let total = scavenger.hidden_count();
    assert_eq!(total, 255);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scavenger = scavenger.clone();
            thread::spawn(move || {
                (0..40)
                    .map(|_| scavenger.scavenge(BLOCK).unwrap())
                    .sum::<u64>()
            })
        })
        .collect();
    let consumed: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let addrs = claimer.claimed_addrs();
    let unique: HashSet<_> = addrs.iter().copied().collect();
    assert_eq!(consumed, total as u64 * BLOCK);
    assert_eq!(addrs.len(), total);
    assert_eq!(unique.len(), total);
    assert_eq!(scavenger.hidden_count(), 0);
}

#[cfg(feature = "debug-probe")]
mod probe {
    use super::*;
    use memscav::memory::ClaimError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_probe_claims_outside_registry() {
        let claimer = ScriptedClaimer::succeeding();
        let scavenger = three_block_scavenger(claimer.clone());

        scavenger.probe(0x50000).unwrap();

        assert_eq!(claimer.claimed_addrs(), vec![0x50000]);
        assert_eq!(scavenger.hidden_blocks(), vec![0x10000, 0x20000, 0x40000]);
        assert!(scavenger.is_pinned());
    }

    #[test]
    fn test_probe_rejects_misaligned_address() {
        let claimer = ScriptedClaimer::succeeding();
        let scavenger = three_block_scavenger(claimer.clone());

        let err = scavenger.probe(0x50001).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArgument(_)));
        assert!(claimer.calls().is_empty());
        assert!(!scavenger.is_pinned());
    }

    #[test]
    fn test_probe_propagates_claim_failure() {
        let claimer = ScriptedClaimer::failing_at(&[0x50000]);
        let scavenger = three_block_scavenger(claimer);

        let err = scavenger.probe(0x50000).unwrap_err();
        assert!(matches!(err, MemoryError::Claim(ClaimError::Rejected { addr: 0x50000, .. })));
        assert!(!scavenger.is_pinned());
    }
}
