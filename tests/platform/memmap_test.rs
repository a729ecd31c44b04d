/*!
 * Firmware Memory Map Tests
 */

use crate::fixtures::FakeHost;
use memscav::memory::{FirmwareEntry, FirmwareMemoryMap, MemoryError, MemoryKind};
use memscav::platform::memmap::parse_kind;
use memscav::platform::SysfsMemmap;
use pretty_assertions::assert_eq;

#[test]
fn test_entries_in_numeric_order() {
    let host = FakeHost::new();
    host.memmap_entry(0, 0x0, 0x9fbff, "System RAM")
        .memmap_entry(1, 0x9fc00, 0x9ffff, "Reserved")
        .memmap_entry(2, 0x100000, 0x7ffdffff, "System RAM")
        .memmap_entry(10, 0x100000000, 0x17fffffff, "System RAM");

    let map = SysfsMemmap::new(host.memmap_dir());
    assert!(map.is_present());

    let entries = map.entries().unwrap();
    let bases: Vec<u64> = entries.iter().map(|e| e.base).collect();
    assert_eq!(bases, vec![0x0, 0x9fc00, 0x100000, 0x100000000]);
    assert_eq!(
        entries[0],
        FirmwareEntry {
            base: 0,
            size: 0x9fc00,
            kind: MemoryKind::Usable,
        }
    );
    assert_eq!(entries[1].kind, MemoryKind::Reserved);
    assert_eq!(entries[3].size, 0x80000000);
}

#[test]
fn test_missing_or_empty_map_is_absent() {
    let host = FakeHost::new();
    assert!(!SysfsMemmap::new(host.memmap_dir()).is_present());

    std::fs::create_dir_all(host.memmap_dir()).unwrap();
    assert!(!SysfsMemmap::new(host.memmap_dir()).is_present());
}

#[test]
fn test_unreadable_entry_is_platform_error() {
    let host = FakeHost::new();
    host.memmap_entry(0, 0x0, 0xfff, "System RAM");
    std::fs::remove_file(host.memmap_dir().join("0/end")).unwrap();

    let err = SysfsMemmap::new(host.memmap_dir()).entries().unwrap_err();
    assert!(matches!(err, MemoryError::Platform { .. }));
}

#[test]
fn test_type_strings() {
    assert_eq!(parse_kind("System RAM"), MemoryKind::Usable);
    assert_eq!(parse_kind("Soft Reserved"), MemoryKind::Reserved);
    assert_eq!(parse_kind("ACPI Non-volatile Storage"), MemoryKind::AcpiNvs);
    assert_eq!(parse_kind("Unusable memory"), MemoryKind::Unusable);
    assert_eq!(parse_kind("Persistent Memory (legacy)"), MemoryKind::Persistent);
    assert!(!parse_kind("Persistent Memory").is_usable());
}
