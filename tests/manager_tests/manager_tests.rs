//! Tests for Manager
//!
//! These tests verify:
//! - Device construction from configuration
//! - Lookup by index
//! - Introspection report
//! - Shutdown and drop release every device
//! - Configuration validation and error kinds

use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use scull::config::{DEFAULT_NR_DEVS, DEFAULT_QSET, DEFAULT_QUANTUM};
use scull::{Block, BlockAllocator, CancelToken, Config, HeapAllocator, Manager, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_manager(nr_devs: usize) -> Manager {
    let config = Config::builder().quantum(4).qset(2).nr_devs(nr_devs).build();
    Manager::new(config).unwrap()
}

/// Counts live blocks so tests can observe releases
#[derive(Default)]
struct CountingAllocator {
    blocks: AtomicUsize,
}

impl BlockAllocator for CountingAllocator {
    fn allocate_block(&self, quantum: usize) -> scull::Result<Block> {
        self.blocks.fetch_add(1, Ordering::SeqCst);
        HeapAllocator.allocate_block(quantum)
    }

    fn allocate_slots(&self, qset: usize) -> scull::Result<Vec<Option<Block>>> {
        HeapAllocator.allocate_slots(qset)
    }
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.quantum, DEFAULT_QUANTUM);
    assert_eq!(config.qset, DEFAULT_QSET);
    assert_eq!(config.nr_devs, DEFAULT_NR_DEVS);
    assert_eq!((config.quantum, config.qset, config.nr_devs), (4000, 1000, 1));
    assert!(config.validate().is_ok());
}

#[test]
fn test_manager_builds_devices() {
    let manager = setup_manager(4);

    assert_eq!(manager.len(), 4);
    assert!(!manager.is_empty());
    assert_eq!(manager.config().nr_devs, 4);
    assert_eq!(manager.layout().quantum(), 4);
    assert_eq!(manager.layout().qset(), 2);

    for (i, device) in manager.devices().iter().enumerate() {
        assert_eq!(device.index(), i);
        assert_eq!(device.quantum(), 4);
        assert_eq!(device.qset(), 2);
        assert_eq!(device.size(), 0);
    }
}

#[test]
fn test_device_lookup_out_of_range() {
    let manager = setup_manager(2);

    assert!(manager.device(1).is_ok());
    assert!(matches!(manager.device(2), Err(ScullError::NoSuchDevice(2))));
}

#[test]
fn test_devices_are_independent() {
    let manager = setup_manager(3);
    let cancel = CancelToken::new();

    manager.device(0).unwrap().write(0, b"zero", &cancel).unwrap();
    manager.device(2).unwrap().write(8, b"two", &cancel).unwrap();

    assert_eq!(manager.device(0).unwrap().size(), 4);
    assert_eq!(manager.device(1).unwrap().size(), 0);
    assert_eq!(manager.device(2).unwrap().size(), 11);

    manager.device(0).unwrap().truncate(&cancel).unwrap();
    assert_eq!(manager.device(2).unwrap().size(), 11);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_zero_devices_rejected() {
    let config = Config::builder().nr_devs(0).build();
    assert!(matches!(Manager::new(config), Err(ScullError::Config(_))));
}

#[test]
fn test_zero_quantum_rejected() {
    let config = Config::builder().quantum(0).build();
    assert!(matches!(config.validate(), Err(ScullError::Config(_))));
    assert!(Manager::new(config).is_err());
}

#[test]
fn test_zero_qset_rejected() {
    let config = Config::builder().qset(0).build();
    assert!(matches!(Manager::new(config), Err(ScullError::Config(_))));
}

#[test]
fn test_overflowing_layout_rejected() {
    let config = Config::builder().quantum(usize::MAX / 2).qset(4).build();
    assert!(matches!(Manager::new(config), Err(ScullError::Config(_))));
}

#[test]
fn test_error_kinds() {
    assert_eq!(ScullError::Interrupted.kind(), ErrorKind::Interrupted);
    assert_eq!(ScullError::OutOfMemory.kind(), ErrorKind::OutOfMemory);
    assert_eq!(ScullError::InvalidRange("x".into()).kind(), ErrorKind::InvalidInput);
    assert_eq!(ScullError::Config("x".into()).kind(), ErrorKind::InvalidInput);
    assert_eq!(ScullError::NoSuchDevice(3).kind(), ErrorKind::NotFound);

    let io: std::io::Error = ScullError::Interrupted.into();
    assert_eq!(io.kind(), ErrorKind::Interrupted);
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_report_lists_every_device() {
    let manager = setup_manager(2);
    let cancel = CancelToken::new();

    // Slots 0 and 1 of segment 0, then slot 1 of segment 1
    manager.device(1).unwrap().write(0, b"abcd", &cancel).unwrap();
    manager.device(1).unwrap().write(4, b"ef", &cancel).unwrap();
    manager.device(1).unwrap().write(12, b"g", &cancel).unwrap();

    let report = manager.report(&cancel).unwrap();

    assert_eq!(
        report,
        "Device 0: qset 2, q 4, sz 0\n\
         Device 1: qset 2, q 4, sz 13\n  \
         segment 0: 2 blocks\n  \
         segment 1: 0 blocks\n"
    );
}

#[test]
fn test_stats_snapshot() {
    let manager = setup_manager(1);
    let cancel = CancelToken::new();
    let device = manager.device(0).unwrap();

    device.write(0, b"abcd", &cancel).unwrap();
    device.write(8, b"x", &cancel).unwrap();

    let stats = device.stats(&cancel).unwrap();
    assert_eq!(stats.index, 0);
    assert_eq!(stats.quantum, 4);
    assert_eq!(stats.qset, 2);
    assert_eq!(stats.size, 9);
    assert_eq!(stats.segments, vec![1, 1]);
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_shutdown_releases_devices() {
    let allocator = Arc::new(CountingAllocator::default());
    let config = Config::builder().quantum(4).qset(2).nr_devs(2).build();
    let manager = Manager::with_allocator(config, allocator.clone()).unwrap();
    let cancel = CancelToken::new();

    manager.device(0).unwrap().write(0, b"abcd", &cancel).unwrap();
    manager.device(1).unwrap().write(100, b"z", &cancel).unwrap();
    assert_eq!(allocator.blocks.load(Ordering::SeqCst), 2);

    manager.shutdown();

    // Only the manager's devices hold the allocator besides this test
    assert_eq!(Arc::strong_count(&allocator), 1);
}

#[test]
fn test_drop_releases_devices() {
    let allocator = Arc::new(CountingAllocator::default());
    let config = Config::builder().quantum(4).qset(2).nr_devs(3).build();

    {
        let manager = Manager::with_allocator(config, allocator.clone()).unwrap();
        manager.device(2).unwrap().write(0, b"data", &CancelToken::new()).unwrap();
        assert_eq!(Arc::strong_count(&allocator), 4);
    }

    assert_eq!(Arc::strong_count(&allocator), 1);
}
