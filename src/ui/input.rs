//! Input snapshot shared between the polling thread and the UI thread
//!
//! The poller publishes into a mutex-guarded slot; the UI thread takes one
//! copy per frame under the same lock, so it never sees a half-written state.

use bitflags::bitflags;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u32 {
        const A = 1 << 0;
        const B = 1 << 1;
        const X = 1 << 2;
        const Y = 1 << 3;
        const L = 1 << 4;
        const R = 1 << 5;
        const ZL = 1 << 6;
        const ZR = 1 << 7;
        const PLUS = 1 << 8;
        const MINUS = 1 << 9;
        const UP = 1 << 10;
        const DOWN = 1 << 11;
        const LEFT = 1 << 12;
        const RIGHT = 1 << 13;

        const DPAD = Self::UP.bits() | Self::DOWN.bits() | Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickPosition {
    pub x: i32,
    pub y: i32,
}

/// Everything the UI needs from the devices for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputSnapshot {
    /// Pressed since the previous snapshot was taken
    pub buttons_down: Buttons,
    pub buttons_held: Buttons,
    pub touches: Vec<TouchPoint>,
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,
}

impl InputSnapshot {
    pub fn touch(&self) -> Option<TouchPoint> {
        self.touches.first().copied()
    }

    pub fn is_touching(&self) -> bool {
        !self.touches.is_empty()
    }
}

#[derive(Default)]
struct Slot {
    latest: InputSnapshot,
    sequence: u64,
}

/// Cloneable handle to the shared snapshot
#[derive(Clone, Default)]
pub struct SharedInput {
    slot: Arc<Mutex<Slot>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held state; pressed flags accumulate until the UI takes them
    pub fn publish(&self, snapshot: InputSnapshot) {
        let mut slot = self.slot.lock();
        let pending_down = slot.latest.buttons_down;
        slot.latest = snapshot;
        slot.latest.buttons_down |= pending_down;
        slot.sequence += 1;
    }

    /// Copy out the latest state and clear the pressed-this-frame flags
    pub fn take(&self) -> InputSnapshot {
        let mut slot = self.slot.lock();
        let snapshot = slot.latest.clone();
        slot.latest.buttons_down = Buttons::empty();
        snapshot
    }

    /// Number of publishes so far
    pub fn sequence(&self) -> u64 {
        self.slot.lock().sequence
    }
}

/// A device the poller thread can read
pub trait InputSource: Send + 'static {
    fn poll(&mut self) -> InputSnapshot;
}

/// Handle to the background polling thread; stops and joins on drop
pub struct InputPoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputPoller {
    pub fn spawn(
        mut source: impl InputSource,
        shared: SharedInput,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("input-poller".into())
            .spawn(move || {
                log::debug!("input poller started ({:?} interval)", interval);
                while !thread_stop.load(Ordering::Acquire) {
                    shared.publish(source.poll());
                    std::thread::sleep(interval);
                }
                log::debug!("input poller stopped");
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("input poller thread panicked");
            }
        }
    }
}

impl Drop for InputPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_pressed_but_keeps_held() {
        let shared = SharedInput::new();
        shared.publish(InputSnapshot {
            buttons_down: Buttons::A,
            buttons_held: Buttons::A,
            ..Default::default()
        });
        let first = shared.take();
        assert_eq!(first.buttons_down, Buttons::A);
        let second = shared.take();
        assert!(second.buttons_down.is_empty());
        assert_eq!(second.buttons_held, Buttons::A);
    }

    #[test]
    fn test_presses_between_frames_are_not_lost() {
        let shared = SharedInput::new();
        shared.publish(InputSnapshot {
            buttons_down: Buttons::DOWN,
            ..Default::default()
        });
        shared.publish(InputSnapshot {
            buttons_down: Buttons::A,
            ..Default::default()
        });
        let snapshot = shared.take();
        assert_eq!(snapshot.buttons_down, Buttons::DOWN | Buttons::A);
        assert_eq!(shared.sequence(), 2);
    }

    struct Scripted(u32);

    impl InputSource for Scripted {
        fn poll(&mut self) -> InputSnapshot {
            self.0 += 1;
            InputSnapshot {
                buttons_held: Buttons::B,
                touches: vec![TouchPoint {
                    x: self.0 as i32,
                    y: 0,
                }],
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_poller_publishes_until_stopped() {
        let shared = SharedInput::new();
        let poller = InputPoller::spawn(Scripted(0), shared.clone(), Duration::from_millis(1)).unwrap();
        while shared.sequence() < 3 {
            std::thread::sleep(Duration::from_millis(1));
        }
        poller.stop();
        let seq = shared.sequence();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(shared.sequence(), seq);
        let snapshot = shared.take();
        assert_eq!(snapshot.buttons_held, Buttons::B);
        assert!(snapshot.touch().is_some());
    }

    #[test]
    fn test_dpad_mask() {
        assert!(Buttons::DPAD.contains(Buttons::LEFT));
        assert!(!Buttons::DPAD.contains(Buttons::A));
    }
}
