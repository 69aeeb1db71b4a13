//! Region watcher - attach to the published region and follow swaps
//!
//! Run the `waystore` binary against a dataset first, then this example:
//!
//! ```bash
//! cargo run --example watcher
//! ```
//!
//! The watcher attaches to whatever region is currently published, prints a
//! few block sizes, then sleeps on the monitor until the next publish.

use waystore_core::{
    BlockId, DataLayout, MonitorData, RegionTag, SharedMemory, SharedMonitor,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let monitor = SharedMonitor::open_or_create(MonitorData {
        region: RegionTag::None,
        timestamp: 0,
    })?;

    let mut seen = monitor.peek();
    loop {
        if seen.region == RegionTag::None {
            println!("no region published yet, waiting...");
        } else {
            inspect(seen)?;
        }

        // snapshot the notify generation before re-checking, then sleep
        loop {
            let snapshot = monitor.generation();
            let current = monitor.lock().read();
            if current != seen {
                seen = current;
                break;
            }
            monitor.wait(snapshot, None);
        }
    }
}

fn inspect(data: MonitorData) -> Result<(), Box<dyn std::error::Error>> {
    let mut region = SharedMemory::open(data.region)?;
    let layout = DataLayout::from_bytes(region.as_slice())?;
    let base = unsafe { region.as_mut_ptr().add(DataLayout::HEADER_SIZE) };

    println!(
        "attached to {} (timestamp {}, {} bytes)",
        data.region,
        data.timestamp,
        region.size()
    );
    for id in [
        BlockId::NameCharData,
        BlockId::CoordinateList,
        BlockId::TurnInstruction,
        BlockId::RSearchTree,
    ] {
        // canary-verified access; a corrupt block fails loudly here
        unsafe { layout.block_ptr(base, id)? };
        println!(
            "  {:<20} {:>10} entries {:>12} bytes",
            id.name(),
            layout.entries(id),
            layout.byte_size(id)
        );
    }
    Ok(())
}
