/*!
 * Report Rendering Tests
 */

use crate::common::{block_size, three_block_scavenger, ScriptedClaimer, BLOCK};
use memscav::memory::{coalesce, hidden_blocks_report, ranges_report, HiddenBlock, Range};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_hidden_blocks_coalesced_into_runs() {
    let scavenger = three_block_scavenger(ScriptedClaimer::succeeding());

    assert_eq!(
        scavenger.hidden_blocks_report(4096),
        "0x10000-0x2ffff (0x20000)\n0x40000-0x4ffff (0x10000)\n"
    );
}

#[test]
fn test_ranges_report_zero_start() {
    let scavenger = three_block_scavenger(ScriptedClaimer::succeeding());
    assert_eq!(scavenger.ranges_report(4096), "0-0x5ffff (0x60000)\n");
}

#[test]
fn test_ranges_report_one_line_per_range() {
    let ranges = [Range::new(0x0, 0xfffff), Range::new(0x100000, 0x1fffff)];
    assert_eq!(
        ranges_report(ranges.iter(), 4096),
        "0-0xfffff (0x100000)\n0x100000-0x1fffff (0x100000)\n"
    );
}

#[test]
fn test_report_truncated_at_capacity() {
    let scavenger = three_block_scavenger(ScriptedClaimer::succeeding());

    let report = scavenger.hidden_blocks_report(10);
    assert_eq!(report, "0x10000-0x");

    let full = scavenger.hidden_blocks_report(4096);
    let exact = scavenger.hidden_blocks_report(full.len());
    assert_eq!(exact, full);
}

#[test]
fn test_report_after_drain_is_empty() {
    let scavenger = three_block_scavenger(ScriptedClaimer::succeeding());
    scavenger.scavenge(3 * BLOCK).unwrap();
    assert_eq!(scavenger.hidden_blocks_report(4096), "");
}

#[test]
fn test_report_shrinks_as_blocks_are_claimed() {
    let scavenger = three_block_scavenger(ScriptedClaimer::succeeding());
    scavenger.scavenge(BLOCK).unwrap();
    assert_eq!(
        scavenger.hidden_blocks_report(4096),
        "0x20000-0x2ffff (0x10000)\n0x40000-0x4ffff (0x10000)\n"
    );
}

#[test]
fn test_long_run_in_one_line() {
    let blocks: Vec<HiddenBlock> = (0..256).map(|i| HiddenBlock::new(0x1_0000_0000 + i * BLOCK)).collect();
    assert_eq!(
        hidden_blocks_report(blocks.iter(), block_size(), 4096),
        "0x100000000-0x100ffffff (0x1000000)\n"
    );
}

proptest! {
    #[test]
    fn prop_runs_expand_back_to_blocks(slots in prop::collection::btree_set(0u64..512, 0..128)) {
        let blocks: Vec<HiddenBlock> = slots.iter().map(|s| HiddenBlock::new(s * BLOCK)).collect();
        let runs: Vec<_> = coalesce(blocks.iter(), block_size()).collect();

        let expanded: Vec<u64> = runs
            .iter()
            .flat_map(|run| (0..run.size / BLOCK).map(move |i| run.start + i * BLOCK))
            .collect();
        let original: Vec<u64> = blocks.iter().map(|b| b.addr).collect();
        prop_assert_eq!(expanded, original);

        // Runs are maximal: neighbours never touch.
        for pair in runs.windows(2) {
            prop_assert!(pair[0].start + pair[0].size < pair[1].start);
        }
    }
}
