//! Futex wrappers for cross-process synchronization
//!
//! Uses the SHARED futex operations (`FUTEX_WAIT`/`FUTEX_WAKE`), not the
//! `_PRIVATE` variants: the private ones never wake waiters in another
//! process. The futex word lives inside the monitor's shared segment.

use std::ptr;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

#[cfg(target_os = "linux")]
const FUTEX_WAIT: i32 = 0;
#[cfg(target_os = "linux")]
const FUTEX_WAKE: i32 = 1;

/// Block until the word at `addr` changes away from `expected`, a wake
/// arrives, or `timeout` expires.
///
/// Returns 0 on wake (including spurious wakeups), -1 with `errno` set to
/// `EAGAIN` if the word no longer equals `expected`, and -1 with `ETIMEDOUT`
/// on timeout. The word must live in memory mapped by every participating
/// process.
#[cfg(target_os = "linux")]
pub fn futex_wait(addr: &AtomicU32, expected: u32, timeout: Option<Duration>) -> i32 {
    let ts = timeout.map(|d| libc::timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: libc::c_long::from(d.subsec_nanos()),
    });
    let ts_ptr = ts
        .as_ref()
        .map_or(ptr::null(), |t| t as *const libc::timespec);

    // SAFETY: addr is a live reference for the duration of the call and the
    // remaining syscall arguments are either valid pointers or unused.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            addr as *const AtomicU32 as *const u32,
            FUTEX_WAIT,
            expected,
            ts_ptr,
            ptr::null::<u32>(),
            0i32,
        ) as i32
    }
}

/// Wake up to `count` waiters blocked on the word at `addr`.
///
/// Returns the number of waiters woken, or -1 on error.
#[cfg(target_os = "linux")]
pub fn futex_wake(addr: &AtomicU32, count: i32) -> i32 {
    // SAFETY: addr is a live reference; wake takes no pointer operands.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            addr as *const AtomicU32 as *const u32,
            FUTEX_WAKE,
            count,
            ptr::null::<libc::timespec>(),
            ptr::null::<u32>(),
            0i32,
        ) as i32
    }
}

/// Wake every waiter
#[cfg(target_os = "linux")]
#[inline]
pub fn futex_wake_all(addr: &AtomicU32) -> i32 {
    futex_wake(addr, i32::MAX)
}

// Non-Linux fallback: bounded sleep instead of a kernel wait queue. Keeps
// the monitor functional for tests on other hosts at the cost of latency.
#[cfg(not(target_os = "linux"))]
pub fn futex_wait(_addr: &AtomicU32, _expected: u32, timeout: Option<Duration>) -> i32 {
    let nap = timeout.unwrap_or(Duration::from_millis(1));
    std::thread::sleep(nap.min(Duration::from_millis(10)));
    0
}

#[cfg(not(target_os = "linux"))]
pub fn futex_wake(_addr: &AtomicU32, _count: i32) -> i32 {
    0
}

#[cfg(not(target_os = "linux"))]
#[inline]
pub fn futex_wake_all(_addr: &AtomicU32) -> i32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wake_without_waiters() {
        let word = AtomicU32::new(0);
        assert!(futex_wake(&word, 1) >= 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_wait_value_mismatch_returns_immediately() {
        let word = AtomicU32::new(7);
        assert_eq!(futex_wait(&word, 0, Some(Duration::from_millis(100))), -1);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_wait_times_out() {
        let word = AtomicU32::new(7);
        let start = std::time::Instant::now();
        let _ = futex_wait(&word, 7, Some(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_wake_releases_waiter() {
        let word = Arc::new(AtomicU32::new(0));
        let waiter = Arc::clone(&word);

        let handle = thread::spawn(move || {
            while waiter.load(Ordering::Acquire) == 0 {
                futex_wait(&waiter, 0, Some(Duration::from_secs(1)));
            }
            waiter.load(Ordering::Acquire)
        });

        thread::sleep(Duration::from_millis(10));
        word.store(42, Ordering::Release);
        futex_wake_all(&word);

        assert_eq!(handle.join().expect("waiter panicked"), 42);
    }
}
