//! End-to-end publish cycles against real shared memory
//!
//! The data regions, the monitor and the writer lock are process-wide named
//! objects, so the scenarios run back to back inside one test function
//! instead of racing each other from the parallel test runner.

mod common;

use common::{Fixture, FixtureSpec};
use std::time::Duration;
use waystore_core::layout::ALL_BLOCKS;
use waystore_core::{
    BlockId, DataLayout, Error, MonitorData, RegionTag, SharedMemory, SharedMonitor, Storage,
    StorageConfig,
};

fn cleanup() {
    let _ = SharedMemory::remove(RegionTag::A);
    let _ = SharedMemory::remove(RegionTag::B);
    let _ = SharedMonitor::remove();
}

fn monitor_record() -> MonitorData {
    SharedMonitor::open_or_create(MonitorData {
        region: RegionTag::None,
        timestamp: 0,
    })
    .expect("open monitor")
    .peek()
}

#[test]
fn test_publish_cycles_end_to_end() {
    cleanup();

    let fixture = Fixture::full();
    let storage = Storage::new(fixture.config.clone());

    // --- cold start: no prior region, first publish goes to A with timestamp 1
    storage.run(-1).expect("cold start publish");
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::A,
            timestamp: 1
        }
    );
    assert!(SharedMemory::exists(RegionTag::A));
    assert!(!SharedMemory::exists(RegionTag::B));

    // a reader can attach, rebuild the catalog and verify every canary frame
    {
        let mut region = SharedMemory::open(RegionTag::A).expect("attach");
        let layout = DataLayout::from_bytes(region.as_slice()).expect("read catalog");
        let base = unsafe { region.as_mut_ptr().add(DataLayout::HEADER_SIZE) };
        for id in ALL_BLOCKS {
            assert!(unsafe { layout.block_ptr(base, id) }.is_ok());
        }
        let names: &[u8] =
            unsafe { layout.read_block_slice(base, BlockId::NameCharData) }.unwrap();
        assert_eq!(names, common::NAMES);
    }

    // --- hot swap: a reader still attached to A delays its reclamation
    let reader = SharedMemory::open(RegionTag::A).expect("reader attach");
    let reader_handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        drop(reader);
    });

    storage.run(-1).expect("hot swap publish");
    reader_handle.join().unwrap();
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::B,
            timestamp: 2
        }
    );
    assert!(!SharedMemory::exists(RegionTag::A));
    assert!(SharedMemory::exists(RegionTag::B));

    // --- stale target: a leftover segment under the target key is replaced
    drop(SharedMemory::create(RegionTag::A, 4096).expect("stale segment"));
    assert!(SharedMemory::exists(RegionTag::A));

    storage.run(-1).expect("stale target publish");
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::A,
            timestamp: 3
        }
    );
    assert!(!SharedMemory::exists(RegionTag::B));
    let published_size = SharedMemory::open(RegionTag::A).expect("attach").size();
    assert!(published_size > 4096, "stale segment was not rebuilt");

    // --- checksum mismatch: the cycle aborts, nothing is published
    let broken = Fixture::create(FixtureSpec {
        mldgr: Some(0xDEAD),
        ..FixtureSpec::default()
    });
    let err = Storage::new(broken.config.clone()).run(-1).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::A,
            timestamp: 3
        }
    );

    // --- metric overflow: rejected while planning, no region allocated
    let overflowing = Fixture::create(FixtureSpec {
        cell_metrics: Some(9),
        ..FixtureSpec::default()
    });
    let err = Storage::new(overflowing.config.clone()).run(-1).unwrap_err();
    assert!(matches!(err, Error::LayoutOverflow { declared: 9, max: 8 }));
    assert!(
        !SharedMemory::exists(RegionTag::B),
        "overflowing publish must not allocate a region"
    );
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::A,
            timestamp: 3
        }
    );

    // --- monitor timeout: a rogue holder is evicted after max_wait seconds
    let rogue = std::thread::spawn(|| {
        let monitor = SharedMonitor::open_or_create(MonitorData {
            region: RegionTag::None,
            timestamp: 0,
        })
        .expect("rogue open");
        let guard = monitor.lock();
        std::thread::sleep(Duration::from_secs(3));
        drop(guard);
    });
    std::thread::sleep(Duration::from_millis(100));

    storage.run(1).expect("publish with monitor reset");
    rogue.join().unwrap();
    assert_eq!(
        monitor_record(),
        MonitorData {
            region: RegionTag::B,
            timestamp: 4
        }
    );
    // the predecessor is never retired after a reset; it lingers by design
    assert!(SharedMemory::exists(RegionTag::A));

    cleanup();
}

#[test]
fn test_invalid_config_fails_before_touching_shared_state() {
    let storage = Storage::new(StorageConfig::new("/nonexistent/dataset"));
    let err = storage.run(-1).unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));
}
