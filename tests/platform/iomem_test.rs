/*!
 * Resource Snapshot Tests
 */

use crate::fixtures::FakeHost;
use memscav::memory::{MemoryError, OwnershipOracle};
use memscav::platform::IomemSnapshot;

const IOMEM: &str = "\
00000000-00000fff : Reserved
00001000-0009fbff : System RAM
000f0000-000fffff : System ROM
00100000-0fffffff : System RAM
  01000000-01e02fff : Kernel code
fee00000-fee00fff : Local APIC
";

#[test]
fn test_load_and_classify() {
    let host = FakeHost::new();
    host.iomem(IOMEM);

    let snapshot = IomemSnapshot::load(&host.procfs().join("iomem")).unwrap();
    assert_eq!(snapshot.len(), 5);

    assert!(!snapshot.region_is_disjoint(0x0, 0x10000));
    assert!(!snapshot.region_is_disjoint(0xfff0000, 0x10000));
    assert!(snapshot.region_is_disjoint(0x10000000, 0x10000));
    assert!(snapshot.region_is_disjoint(0xa0000, 0x10000));
}

#[test]
fn test_redacted_snapshot_rejected() {
    let host = FakeHost::new();
    host.iomem("00000000-00000000 : Reserved\n00000000-00000000 : System RAM\n");

    let err = IomemSnapshot::load(&host.procfs().join("iomem")).unwrap_err();
    assert!(matches!(err, MemoryError::Platform { .. }));
}

#[test]
fn test_malformed_and_missing() {
    assert!(IomemSnapshot::parse("not a resource line\n").is_err());
    assert!(IomemSnapshot::parse("00002000-00001000 : Inverted\n").is_err());

    let host = FakeHost::new();
    let err = IomemSnapshot::load(&host.procfs().join("iomem")).unwrap_err();
    assert!(matches!(err, MemoryError::Platform { .. }));
}

#[test]
fn test_empty_snapshot_claims_nothing() {
    let snapshot = IomemSnapshot::parse("").unwrap();
    assert!(snapshot.is_empty());
    assert!(snapshot.region_is_disjoint(0x0, 0x10000));
}
