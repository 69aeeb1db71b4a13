//! SysV shared memory regions
//!
//! The data regions use System V shared memory rather than POSIX `shm_open`
//! because the publish protocol leans on two SysV behaviors: `IPC_RMID` is a
//! sticky destruction marker that only reclaims the segment once the last
//! attacher is gone, and `IPC_STAT` exposes the live attach count the
//! retire step polls in [`SharedMemory::wait_for_detach`].

use crate::error::{Error, Result};
use crate::region::RegionTag;
use std::io;
use std::time::Duration;

/// Interval between attach-count polls while waiting for readers to detach
const DETACH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An attached SysV shared memory region
pub struct SharedMemory {
    id: i32,
    ptr: *mut u8,
    size: usize,
    tag: RegionTag,
}

// SAFETY: the mapping is process-wide; concurrent access is governed by the
// publish protocol (single writer before the swap, read-only afterwards).
unsafe impl Send for SharedMemory {}

impl SharedMemory {
    /// Create a new region of exactly `size` bytes under `tag`.
    ///
    /// Fails if a segment already exists under the tag's key.
    pub fn create(tag: RegionTag, size: usize) -> Result<Self> {
        // SAFETY: shmget takes no pointers; flags request exclusive creation.
        let id = unsafe {
            libc::shmget(
                tag.key(),
                size,
                libc::IPC_CREAT | libc::IPC_EXCL | 0o600,
            )
        };
        if id < 0 {
            return Err(Error::SharedMemory(format!(
                "could not create segment {tag} ({} bytes): {}",
                size,
                io::Error::last_os_error()
            )));
        }
        let ptr = Self::attach(id, tag)?;
        Ok(Self { id, ptr, size, tag })
    }

    /// Attach to the existing region under `tag`
    pub fn open(tag: RegionTag) -> Result<Self> {
        // SAFETY: probe-only shmget, no pointers involved.
        let id = unsafe { libc::shmget(tag.key(), 0, 0) };
        if id < 0 {
            return Err(Error::SharedMemory(format!(
                "could not open segment {tag}: {}",
                io::Error::last_os_error()
            )));
        }
        let size = Self::stat(id, tag)?.shm_segsz as usize;
        let ptr = Self::attach(id, tag)?;
        Ok(Self { id, ptr, size, tag })
    }

    /// Whether a segment exists under `tag`; non-blocking
    pub fn exists(tag: RegionTag) -> bool {
        // SAFETY: probe-only shmget.
        unsafe { libc::shmget(tag.key(), 0, 0) >= 0 }
    }

    /// Mark the segment under `tag` for destruction.
    ///
    /// The segment is reclaimed once its attach count reaches zero; until
    /// then existing attachments keep working. Removing an absent segment is
    /// not an error.
    pub fn remove(tag: RegionTag) -> Result<()> {
        // SAFETY: probe-only shmget.
        let id = unsafe { libc::shmget(tag.key(), 0, 0) };
        if id < 0 {
            return Ok(());
        }
        // SAFETY: IPC_RMID ignores the buffer argument.
        let ret = unsafe { libc::shmctl(id, libc::IPC_RMID, std::ptr::null_mut()) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            // racing removal is fine
            if !matches!(err.raw_os_error(), Some(libc::EINVAL) | Some(libc::EIDRM)) {
                return Err(Error::SharedMemory(format!(
                    "could not remove segment {tag}: {err}"
                )));
            }
        }
        Ok(())
    }

    /// Block until the attach count drops to one (this handle).
    ///
    /// Polls at a bounded interval; never spins at full CPU. There is no
    /// timeout: reclaiming a region under a live reader would be a
    /// use-after-free at the OS level, so the wait is open ended.
    pub fn wait_for_detach(&self) -> Result<()> {
        loop {
            if self.attach_count()? <= 1 {
                return Ok(());
            }
            std::thread::sleep(DETACH_POLL_INTERVAL);
        }
    }

    /// Current number of attachments, including this handle
    pub fn attach_count(&self) -> Result<u64> {
        Ok(Self::stat(self.id, self.tag)?.shm_nattch as u64)
    }

    /// The region tag this handle refers to
    pub fn tag(&self) -> RegionTag {
        self.tag
    }

    /// Size of the region in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Attached base address; stable for the lifetime of the handle
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Mutable base address
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr
    }

    /// Byte view of the region
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/size come from a successful shmat/stat pair.
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    /// Mutable byte view of the region
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as as_slice; exclusive through &mut self.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    fn attach(id: i32, tag: RegionTag) -> Result<*mut u8> {
        // SAFETY: null address lets the kernel pick the mapping; id came from
        // a successful shmget.
        let ptr = unsafe { libc::shmat(id, std::ptr::null(), 0) };
        if ptr == usize::MAX as *mut libc::c_void {
            return Err(Error::SharedMemory(format!(
                "could not attach segment {tag}: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(ptr as *mut u8)
    }

    fn stat(id: i32, tag: RegionTag) -> Result<libc::shmid_ds> {
        // SAFETY: IPC_STAT fills the zeroed out-parameter.
        let mut ds: libc::shmid_ds = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::shmctl(id, libc::IPC_STAT, &mut ds) };
        if ret < 0 {
            return Err(Error::SharedMemory(format!(
                "could not stat segment {tag}: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(ds)
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        // SAFETY: ptr came from shmat and is detached exactly once.
        unsafe {
            libc::shmdt(self.ptr as *const libc::c_void);
        }
    }
}

/// Try to pin current and future pages into RAM.
///
/// Failure only costs swap immunity, so it is logged and ignored.
pub fn lock_pages_in_ram() {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: mlockall takes flags only.
        if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } != 0 {
            tracing::warn!("could not request RAM lock: {}", io::Error::last_os_error());
        }
    }
}
