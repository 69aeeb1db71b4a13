//! Publish orchestrator
//!
//! One call to [`Storage::run`] is one publish cycle: take the writer lock,
//! plan the layout, fill the staging region, flip the monitor record to the
//! new region, wake the readers and wait out the retiring region. Every
//! lock is scoped, so an error anywhere releases the writer lock and the
//! monitor mutex on the way out.

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::layout::DataLayout;
use crate::lock::WriterLock;
use crate::monitor::{MonitorData, SharedMonitor};
use crate::populate::{populate_data, populate_layout};
use crate::region::RegionTag;
use crate::shm::{lock_pages_in_ram, SharedMemory};
use std::time::Duration;
use tracing::{info, warn};

/// The publisher: owns the configuration, runs publish cycles
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Run one publish cycle.
    ///
    /// `max_wait < 0` waits on the monitor mutex forever; `max_wait >= 0`
    /// waits up to that many seconds and then forcibly resets the monitor,
    /// stranding whoever held it.
    pub fn run(&self, max_wait: i32) -> Result<()> {
        let missing = self.config.missing_required();
        if !missing.is_empty() {
            return Err(Error::ConfigInvalid(format!(
                "missing artifacts: {}",
                missing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let _writer_lock = WriterLock::acquire()?;

        // keep the staged data out of swap; best effort
        lock_pages_in_ram();

        let mut monitor = SharedMonitor::open_or_create(MonitorData {
            region: RegionTag::None,
            timestamp: 0,
        })?;

        // No mutex needed for this read: the record only changes under the
        // writer lock, which we hold.
        let current = monitor.peek();
        let mut in_use_region = current.region;
        let next_timestamp = current.timestamp.wrapping_add(1);
        let next_region = in_use_region.other();

        // Failure recovery: a crashed cycle can leave the target segment
        // behind. We wait for detach at the end of every cycle, so anything
        // under the target key now is garbage.
        if SharedMemory::exists(next_region) {
            warn!("old shared memory region {next_region} still exists, removing");
            SharedMemory::remove(next_region)?;
        }

        info!("loading data into {next_region}");

        let mut layout = DataLayout::default();
        populate_layout(&self.config, &mut layout)?;

        let region_size = DataLayout::HEADER_SIZE + layout.total_size() as usize;
        info!("allocating shared memory of {region_size} bytes");
        let mut staging = SharedMemory::create(next_region, region_size)?;

        let base = staging.as_mut_ptr();
        // SAFETY: the segment was sized as header + total_size above, and no
        // reader can attach before the monitor swap below.
        unsafe {
            std::ptr::copy_nonoverlapping(
                layout.as_bytes().as_ptr(),
                base,
                DataLayout::HEADER_SIZE,
            );
            populate_data(&self.config, &layout, base.add(DataLayout::HEADER_SIZE))?;
        }

        let record = MonitorData {
            region: next_region,
            timestamp: next_timestamp,
        };
        let mut swapped = false;
        if max_wait >= 0 {
            if let Some(mut guard) = monitor.try_lock_for(Duration::from_secs(max_wait as u64)) {
                guard.write(record);
                swapped = true;
            }
        } else {
            monitor.lock().write(record);
            swapped = true;
        }
        if !swapped {
            warn!(
                "could not acquire current region lock after {max_wait} seconds; \
                 removing locked monitor and creating a new one; all currently \
                 attached processes will not receive notifications and must be \
                 restarted"
            );
            drop(monitor);
            SharedMonitor::remove()?;
            in_use_region = RegionTag::None;
            monitor = SharedMonitor::open_or_create(MonitorData {
                region: RegionTag::None,
                timestamp: 0,
            })?;
            monitor.lock().write(record);
        }

        info!(
            "all data loaded, notifying clients about new data in {next_region} \
             with timestamp {next_timestamp}"
        );
        monitor.notify_all();

        // Mark the predecessor for destruction; the OS reclaims it when the
        // last reader detaches, and we block here until only our own
        // bookkeeping attachment is left.
        if in_use_region != RegionTag::None && SharedMemory::exists(in_use_region) {
            info!("marking old shared memory region {in_use_region} for removal");
            let retiring = SharedMemory::open(in_use_region)?;
            SharedMemory::remove(in_use_region)?;
            info!("waiting for clients to detach...");
            retiring.wait_for_detach()?;
            info!("old region reclaimed");
        }

        info!("all clients switched");
        Ok(())
    }
}
