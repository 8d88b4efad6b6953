//! Atomic `(state, speed)` cell shared between the main loop and the
//! interrupt context.
//!
//! The pair lives in one `AtomicU64`, so a reader can never observe the state
//! of one update combined with the speed of another. Writers publish with
//! `Release`, readers load with `Acquire`. No locks.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use spindle_common::spindle::state::{SpindleSpeed, SpindleState, SpindleStatus};
use static_assertions::assert_impl_all;

/// Lock-free spindle status shared across execution contexts.
#[derive(Debug)]
pub struct AtomicSpindleStatus {
    /// Packed `SpindleStatus`.
    status: AtomicU64,
    /// Last device value written to the output, from either context.
    device_value: AtomicU32,
}

assert_impl_all!(AtomicSpindleStatus: Send, Sync);

impl AtomicSpindleStatus {
    /// Power-up status: `Unknown`, speed 0, device value 0.
    pub const fn new() -> Self {
        Self {
            status: AtomicU64::new(SpindleStatus::POWER_UP.pack()),
            device_value: AtomicU32::new(0),
        }
    }

    /// Consistent snapshot of the pair.
    #[inline]
    pub fn load(&self) -> SpindleStatus {
        SpindleStatus::unpack(self.status.load(Ordering::Acquire))
    }

    /// Publish a new pair in a single store.
    #[inline]
    pub fn store(&self, status: SpindleStatus) {
        self.status.store(status.pack(), Ordering::Release);
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> SpindleState {
        self.load().state
    }

    /// Current logical speed.
    #[inline]
    pub fn speed(&self) -> SpindleSpeed {
        self.load().speed
    }

    /// Last device value written.
    #[inline]
    pub fn device_value(&self) -> u32 {
        self.device_value.load(Ordering::Acquire)
    }

    /// Record a device value.
    #[inline]
    pub fn store_device_value(&self, value: u32) {
        self.device_value.store(value, Ordering::Release);
    }
}

impl Default for AtomicSpindleStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_unknown() {
        let status = AtomicSpindleStatus::new();
        assert_eq!(status.load(), SpindleStatus::POWER_UP);
        assert_eq!(status.device_value(), 0);
    }

    #[test]
    fn store_then_load() {
        let status = AtomicSpindleStatus::new();
        status.store(SpindleStatus::new(SpindleState::Ccw, 8000));
        assert_eq!(status.state(), SpindleState::Ccw);
        assert_eq!(status.speed(), 8000);
    }

    #[test]
    fn concurrent_readers_see_whole_pairs() {
        // Every published pair satisfies speed == state as u32 * 1000.
        let status = Arc::new(AtomicSpindleStatus::new());
        let writer = {
            let status = Arc::clone(&status);
            thread::spawn(move || {
                for i in 0..20_000u32 {
                    let state = match i % 3 {
                        0 => SpindleState::Disable,
                        1 => SpindleState::Cw,
                        _ => SpindleState::Ccw,
                    };
                    status.store(SpindleStatus::new(state, state as u32 * 1000));
                }
            })
        };
        for _ in 0..20_000 {
            let seen = status.load();
            assert_eq!(seen.speed, seen.state as u32 * 1000, "torn read: {seen:?}");
        }
        writer.join().unwrap();
    }
}
