//! Cross-process publish monitor
//!
//! A tiny POSIX shared segment under a well-known name carrying the
//! `{region, timestamp}` handshake record, a futex mutex and a notify
//! counter that plays the condition-variable role: the writer bumps the
//! counter and wakes everybody after a swap, readers snapshot it before
//! re-checking the record and sleep on the futex until it moves.
//!
//! The monitor deliberately outlives both data regions and every process
//! that touches it; the segment is only destroyed through [`SharedMonitor::remove`].

use crate::error::{Error, Result};
use crate::futex::{futex_wait, futex_wake, futex_wake_all};
use crate::region::RegionTag;
use shared_memory::{Shmem, ShmemConf, ShmemError};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Well-known name of the monitor segment
pub const MONITOR_NAME: &str = "waystore-region";

const MONITOR_MAGIC: u32 = 0x5753_4D4E; // "WSMN"

// futex mutex states
const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// The handshake record readers poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorData {
    pub region: RegionTag,
    pub timestamp: u32,
}

#[repr(C)]
struct MonitorSegment {
    magic: AtomicU32,
    mutex: AtomicU32,
    cond: AtomicU32,
    region: AtomicU8,
    timestamp: AtomicU32,
}

/// Handle to the shared monitor segment
pub struct SharedMonitor {
    shmem: Shmem,
}

impl SharedMonitor {
    /// Open the well-known monitor, creating and initializing it to
    /// `initial` if it does not exist yet.
    pub fn open_or_create(initial: MonitorData) -> Result<Self> {
        Self::open_or_create_named(MONITOR_NAME, initial)
    }

    fn open_or_create_named(name: &str, initial: MonitorData) -> Result<Self> {
        let size = std::mem::size_of::<MonitorSegment>();
        match ShmemConf::new().size(size).os_id(name).create() {
            Ok(mut shmem) => {
                // the monitor must survive this process
                shmem.set_owner(false);
                let monitor = Self { shmem };
                let segment = monitor.segment();
                segment.mutex.store(UNLOCKED, Ordering::Relaxed);
                segment.cond.store(0, Ordering::Relaxed);
                segment.region.store(initial.region as u8, Ordering::Relaxed);
                segment.timestamp.store(initial.timestamp, Ordering::Relaxed);
                // publish the magic last so openers never see a half-built segment
                segment.magic.store(MONITOR_MAGIC, Ordering::Release);
                Ok(monitor)
            }
            Err(ShmemError::MappingIdExists | ShmemError::LinkExists) => {
                let shmem = ShmemConf::new().os_id(name).open().map_err(|e| {
                    Error::Monitor(format!("could not open monitor segment: {e}"))
                })?;
                if shmem.len() < size {
                    return Err(Error::Monitor(format!(
                        "monitor segment too small: {} < {size}",
                        shmem.len()
                    )));
                }
                let monitor = Self { shmem };
                if monitor.segment().magic.load(Ordering::Acquire) != MONITOR_MAGIC {
                    return Err(Error::Monitor("invalid monitor magic".to_string()));
                }
                Ok(monitor)
            }
            Err(e) => Err(Error::Monitor(format!(
                "could not create monitor segment: {e}"
            ))),
        }
    }

    /// Destroy the well-known monitor segment unconditionally.
    ///
    /// Escape hatch for a wedged mutex; every process still attached to the
    /// old segment is stranded and must reconnect.
    pub fn remove() -> Result<()> {
        match ShmemConf::new().os_id(MONITOR_NAME).open() {
            Ok(mut shmem) => {
                shmem.set_owner(true);
                drop(shmem);
                Ok(())
            }
            Err(ShmemError::LinkDoesNotExist | ShmemError::MapOpenFailed(_)) => Ok(()),
            Err(e) => Err(Error::Monitor(format!(
                "could not remove monitor segment: {e}"
            ))),
        }
    }

    fn segment(&self) -> &MonitorSegment {
        // SAFETY: the segment was created with at least size_of::<MonitorSegment>()
        // bytes (checked on open) and mmap gives page alignment.
        unsafe { &*(self.shmem.as_ptr() as *const MonitorSegment) }
    }

    /// Acquire the shared mutex, waiting as long as it takes
    pub fn lock(&self) -> MonitorGuard<'_> {
        self.lock_with_deadline(None)
            .expect("untimed monitor lock cannot time out")
    }

    /// Acquire the shared mutex or give up after `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MonitorGuard<'_>> {
        self.lock_with_deadline(Some(Instant::now() + timeout))
    }

    fn lock_with_deadline(&self, deadline: Option<Instant>) -> Option<MonitorGuard<'_>> {
        let mutex = &self.segment().mutex;
        if mutex
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            return Some(MonitorGuard { monitor: self });
        }

        loop {
            // mark contended; a swap that reads UNLOCKED hands us the lock
            if mutex.swap(CONTENDED, Ordering::Acquire) == UNLOCKED {
                return Some(MonitorGuard { monitor: self });
            }
            let timeout = match deadline {
                None => None,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    Some(deadline - now)
                }
            };
            futex_wait(mutex, CONTENDED, timeout);
        }
    }

    fn unlock(&self) {
        let mutex = &self.segment().mutex;
        if mutex.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            futex_wake(mutex, 1);
        }
    }

    /// Lock-free snapshot of the handshake record.
    ///
    /// Good enough to notice a change; correctness-sensitive transitions must
    /// go through [`lock`](Self::lock) and [`wait`](Self::wait).
    pub fn peek(&self) -> MonitorData {
        let segment = self.segment();
        MonitorData {
            region: RegionTag::from_u8(segment.region.load(Ordering::Relaxed))
                .unwrap_or(RegionTag::None),
            timestamp: segment.timestamp.load(Ordering::Relaxed),
        }
    }

    /// Wake every process waiting on the monitor
    pub fn notify_all(&self) {
        let segment = self.segment();
        segment.cond.fetch_add(1, Ordering::Release);
        futex_wake_all(&segment.cond);
    }

    /// Current notify generation; snapshot this before re-checking the record
    pub fn generation(&self) -> u32 {
        self.segment().cond.load(Ordering::Acquire)
    }

    /// Sleep until the notify generation moves past `generation`, a wake
    /// arrives or `timeout` expires
    pub fn wait(&self, generation: u32, timeout: Option<Duration>) {
        futex_wait(&self.segment().cond, generation, timeout);
    }
}

/// Scoped ownership of the monitor mutex
pub struct MonitorGuard<'a> {
    monitor: &'a SharedMonitor,
}

impl MonitorGuard<'_> {
    /// Read the record under the mutex
    pub fn read(&self) -> MonitorData {
        let segment = self.monitor.segment();
        MonitorData {
            region: RegionTag::from_u8(segment.region.load(Ordering::Acquire))
                .unwrap_or(RegionTag::None),
            timestamp: segment.timestamp.load(Ordering::Acquire),
        }
    }

    /// Replace the record under the mutex
    pub fn write(&mut self, data: MonitorData) {
        let segment = self.monitor.segment();
        segment.region.store(data.region as u8, Ordering::Release);
        segment.timestamp.store(data.timestamp, Ordering::Release);
    }
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        self.monitor.unlock();
    }
}
