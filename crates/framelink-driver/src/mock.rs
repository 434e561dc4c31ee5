//! Deterministic in-process driver for tests and offline development.
//!
//! Capture events injected through [`MockDriver::deliver`] are replayed to
//! the subscriber on a dedicated thread, so sessions see the same callback
//! threading the hardware driver gives them. Playback completions are fired
//! with [`MockDriver::complete`] (or automatically with auto-complete on),
//! also from a driver-owned thread.

use crate::device::{
    CaptureSession, CompletionCallback, DeviceInfo, Driver, FrameCallback, FrameEvent,
    PlaybackSession,
};
use crate::mode::{standard_modes, DisplayMode};
use crossbeam_channel::{unbounded, Sender};
use framelink_core::{FramelinkError, Result, SharedFrameBuffer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

enum CaptureCommand {
    Deliver(FrameEvent),
    Stop,
}

enum PlaybackCommand {
    Complete(u64),
    Stop,
}

#[derive(Default)]
struct Shared {
    capture_tx: Mutex<Option<Sender<CaptureCommand>>>,
    playback_tx: Mutex<Option<Sender<PlaybackCommand>>>,
    scheduled: Mutex<Vec<u64>>,
    reference_locked: AtomicBool,
    auto_complete: AtomicBool,
}

/// A driver backed by in-memory state instead of hardware.
pub struct MockDriver {
    devices: Vec<DeviceInfo>,
    modes: Vec<DisplayMode>,
    shared: Arc<Shared>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            devices: vec![
                DeviceInfo {
                    index: 0,
                    name: "Mock SDI 1".to_string(),
                },
                DeviceInfo {
                    index: 1,
                    name: "Mock SDI 2".to_string(),
                },
            ],
            modes: standard_modes(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Inject a capture event. Dropped silently when no capture session is
    /// subscribed, like a signal arriving at an unwatched input.
    pub fn deliver(&self, event: FrameEvent) {
        if let Some(tx) = &*self.shared.capture_tx.lock() {
            let _ = tx.send(CaptureCommand::Deliver(event));
        }
    }

    /// Signal playback completion for a sequence number.
    pub fn complete(&self, sequence: u64) {
        if let Some(tx) = &*self.shared.playback_tx.lock() {
            let _ = tx.send(PlaybackCommand::Complete(sequence));
        }
    }

    /// When on, every scheduled frame completes immediately (still on the
    /// playback callback thread).
    pub fn set_auto_complete(&self, on: bool) {
        self.shared.auto_complete.store(on, Ordering::Release);
    }

    /// Toggle the simulated external genlock.
    pub fn set_reference_locked(&self, locked: bool) {
        self.shared.reference_locked.store(locked, Ordering::Release);
    }

    /// Sequence numbers of every frame scheduled so far, in order.
    pub fn scheduled_sequences(&self) -> Vec<u64> {
        self.shared.scheduled.lock().clone()
    }

    fn check_device(&self, device: usize) -> Result<()> {
        if device >= self.devices.len() {
            return Err(FramelinkError::DeviceUnavailable(format!(
                "no device at index {device}"
            )));
        }
        Ok(())
    }

    fn mode_at(&self, mode_index: usize) -> Result<DisplayMode> {
        self.modes.get(mode_index).cloned().ok_or_else(|| {
            FramelinkError::ModeUnavailable(format!("no display mode at index {mode_index}"))
        })
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn display_modes(&self, device: usize) -> Result<Vec<DisplayMode>> {
        self.check_device(device)?;
        Ok(self.modes.clone())
    }

    fn open_capture(
        &self,
        device: usize,
        mode_index: usize,
        on_frame: FrameCallback,
    ) -> Result<(DisplayMode, Box<dyn CaptureSession>)> {
        self.check_device(device)?;
        let mode = self.mode_at(mode_index)?;
        debug!(device, mode = %mode, "mock capture session opened");

        let (tx, rx) = unbounded();
        let join = thread::spawn(move || {
            while let Ok(cmd) = rx.recv() {
                match cmd {
                    CaptureCommand::Deliver(event) => on_frame(event),
                    CaptureCommand::Stop => break,
                }
            }
        });
        *self.shared.capture_tx.lock() = Some(tx.clone());

        Ok((
            mode,
            Box::new(MockCaptureSession {
                tx,
                join: Some(join),
            }),
        ))
    }

    fn open_playback(
        &self,
        device: usize,
        mode_index: usize,
        on_completed: CompletionCallback,
    ) -> Result<(DisplayMode, Box<dyn PlaybackSession>)> {
        self.check_device(device)?;
        let mode = self.mode_at(mode_index)?;
        debug!(device, mode = %mode, "mock playback session opened");

        let (tx, rx) = unbounded();
        let join = thread::spawn(move || {
            while let Ok(cmd) = rx.recv() {
                match cmd {
                    PlaybackCommand::Complete(sequence) => on_completed(sequence),
                    PlaybackCommand::Stop => break,
                }
            }
        });
        *self.shared.playback_tx.lock() = Some(tx.clone());

        Ok((
            mode,
            Box::new(MockPlaybackSession {
                shared: self.shared.clone(),
                tx,
                join: Some(join),
                stopped: AtomicBool::new(false),
            }),
        ))
    }
}

struct MockCaptureSession {
    tx: Sender<CaptureCommand>,
    join: Option<JoinHandle<()>>,
}

impl CaptureSession for MockCaptureSession {
    fn stop(&mut self) {
        let _ = self.tx.send(CaptureCommand::Stop);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for MockCaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct MockPlaybackSession {
    shared: Arc<Shared>,
    tx: Sender<PlaybackCommand>,
    join: Option<JoinHandle<()>>,
    stopped: AtomicBool,
}

impl PlaybackSession for MockPlaybackSession {
    fn schedule_frame(&self, _frame: SharedFrameBuffer, sequence: u64) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(FramelinkError::SessionStopped);
        }
        self.shared.scheduled.lock().push(sequence);
        if self.shared.auto_complete.load(Ordering::Acquire) {
            let _ = self.tx.send(PlaybackCommand::Complete(sequence));
        }
        Ok(())
    }

    fn reference_locked(&self) -> bool {
        self.shared.reference_locked.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        let _ = self.tx.send(PlaybackCommand::Stop);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for MockPlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CapturedFrame;
    use crossbeam_channel::bounded;
    use framelink_core::{FrameBuffer, PixelFormat};
    use std::time::Duration;

    #[test]
    fn test_capture_events_reach_callback() {
        let driver = MockDriver::new();
        let (seen_tx, seen_rx) = bounded(4);
        let (_mode, mut session) = driver
            .open_capture(
                0,
                0,
                Box::new(move |event| {
                    let _ = seen_tx.send(matches!(event, FrameEvent::Video(_)));
                }),
            )
            .unwrap();

        driver.deliver(FrameEvent::Video(CapturedFrame {
            data: vec![0; 16],
            width: 2,
            height: 2,
            bytes_per_pixel: 4,
        }));
        driver.deliver(FrameEvent::NoSignal);

        assert!(seen_rx.recv_timeout(Duration::from_secs(1)).unwrap());
        assert!(!seen_rx.recv_timeout(Duration::from_secs(1)).unwrap());
        session.stop();
    }

    #[test]
    fn test_unknown_device_fails_open() {
        let driver = MockDriver::new();
        let err = driver.open_capture(9, 0, Box::new(|_| {})).err().unwrap();
        assert!(matches!(err, FramelinkError::DeviceUnavailable(_)));
        let err = driver.open_playback(0, 99, Box::new(|_| {})).err().unwrap();
        assert!(matches!(err, FramelinkError::ModeUnavailable(_)));
    }

    #[test]
    fn test_playback_completion_roundtrip() {
        let driver = MockDriver::new();
        let (done_tx, done_rx) = bounded(1);
        let (mode, mut session) = driver
            .open_playback(
                0,
                0,
                Box::new(move |seq| {
                    let _ = done_tx.send(seq);
                }),
            )
            .unwrap();

        let frame = Arc::new(FrameBuffer::new(
            mode.width,
            mode.height,
            PixelFormat::Uyvy,
            5,
        ));
        session.schedule_frame(frame, 5).unwrap();
        assert_eq!(driver.scheduled_sequences(), vec![5]);

        driver.complete(5);
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(1)).unwrap(), 5);

        session.stop();
        let frame = Arc::new(FrameBuffer::new(2, 2, PixelFormat::Uyvy, 6));
        assert!(matches!(
            session.schedule_frame(frame, 6),
            Err(FramelinkError::SessionStopped)
        ));
    }
}
