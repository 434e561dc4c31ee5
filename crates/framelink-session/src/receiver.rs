//! Capture session: hardware frames in, queued frames out.
//!
//! The driver's callback thread hands each delivered frame to
//! [`ReceiverShared::on_frame`], which validates its byte size against the
//! configured mode and pushes it into the bounded queue. The consumer
//! (render) thread locks, copies and dequeues at its own cadence, and a
//! control thread reads the query surface. Errors never propagate out of
//! the callback: they degrade to "no frame queued" plus a readable error
//! string that persists until the next error overwrites it.

use framelink_core::{FrameBuffer, FrameQueue, FramelinkError, Result, SharedFrameBuffer};
use framelink_driver::device::CaptureSession;
use framelink_driver::{DisplayMode, Driver, FrameEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// State shared with the hardware callback thread.
struct ReceiverShared {
    mode: DisplayMode,
    queue: FrameQueue,
    last_error: Mutex<String>,
    next_sequence: AtomicU64,
}

impl ReceiverShared {
    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "receiver error");
        *self.last_error.lock() = message;
    }

    /// Runs on the driver's callback thread. Non-blocking: a mutex-guarded
    /// pointer move into the queue, nothing else.
    fn on_frame(&self, event: FrameEvent) {
        match event {
            FrameEvent::Video(captured) => {
                let expected = self.mode.frame_size();
                if captured.data.len() != expected {
                    self.set_error(format!(
                        "frame size mismatch: got {} bytes, expected {expected}",
                        captured.data.len()
                    ));
                    return;
                }
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                match FrameBuffer::from_pixels(
                    captured.data,
                    captured.width,
                    captured.height,
                    captured.bytes_per_pixel,
                    sequence,
                ) {
                    Ok(frame) => {
                        self.queue.push(frame);
                    }
                    Err(err) => self.set_error(err.to_string()),
                }
            }
            FrameEvent::Dropped => self.set_error("input frame dropped by hardware"),
            FrameEvent::NoSignal => self.set_error("no input signal"),
        }
    }
}

/// A live capture session with its frame queue.
///
/// Created already capturing; [`stop`](Self::stop) (or drop) ends the
/// subscription. There is no restart: a new session means a new `Receiver`.
pub struct Receiver {
    shared: Arc<ReceiverShared>,
    session: Mutex<Option<Box<dyn CaptureSession>>>,
    driver: Arc<dyn Driver>,
    device: usize,
    mode_index: usize,
    format_name: RwLock<String>,
}

impl Receiver {
    /// Open a capture session on `device` in mode `mode_index` and start
    /// receiving. Fails when the device or mode is unavailable; no partial
    /// session is left behind on failure.
    pub fn start(driver: Arc<dyn Driver>, device: usize, mode_index: usize) -> Result<Arc<Self>> {
        let modes = driver.display_modes(device)?;
        let mode = modes.get(mode_index).cloned().ok_or_else(|| {
            FramelinkError::ModeUnavailable(format!("no display mode at index {mode_index}"))
        })?;

        let shared = Arc::new(ReceiverShared {
            mode: mode.clone(),
            queue: FrameQueue::new(FrameQueue::DEFAULT_DEPTH),
            last_error: Mutex::new(String::new()),
            next_sequence: AtomicU64::new(1),
        });

        let callback_shared = shared.clone();
        let (_mode, session) = driver.open_capture(
            device,
            mode_index,
            Box::new(move |event| callback_shared.on_frame(event)),
        )?;
        info!(device, mode = %mode, "receiver started");

        Ok(Arc::new(Self {
            shared,
            session: Mutex::new(Some(session)),
            driver,
            device,
            mode_index,
            format_name: RwLock::new(mode.name.clone()),
        }))
    }

    /// Frame dimensions of the configured mode.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.shared.mode.width, self.shared.mode.height)
    }

    /// Frame rate as a floating value (e.g. 29.97).
    pub fn frame_rate(&self) -> f64 {
        self.shared.mode.frame_rate.fps()
    }

    /// Progressive scan; false for interlaced modes.
    pub fn is_progressive(&self) -> bool {
        self.shared.mode.progressive
    }

    /// Human-readable mode name, resolved at start and cached.
    pub fn format_name(&self) -> String {
        self.format_name.read().clone()
    }

    /// Re-fetch the mode name from the driver and update the cache.
    pub fn refresh_format_name(&self) -> String {
        let name = self
            .driver
            .display_modes(self.device)
            .ok()
            .and_then(|modes| modes.into_iter().nth(self.mode_index))
            .map(|mode| mode.name)
            .unwrap_or_else(|| self.format_name.read().clone());
        *self.format_name.write() = name.clone();
        name
    }

    /// Byte size every delivered frame must match.
    pub fn expected_frame_size(&self) -> usize {
        self.shared.mode.frame_size()
    }

    /// Number of frames currently queued. Advisory.
    pub fn queued_frame_count(&self) -> usize {
        self.shared.queue.depth()
    }

    /// Cumulative count of frames lost to queue overflow.
    pub fn dropped_frame_count(&self) -> u64 {
        self.shared.queue.dropped()
    }

    /// The latest error message; empty when no error has occurred. Persists
    /// until overwritten by a newer error.
    pub fn last_error(&self) -> String {
        self.shared.last_error.lock().clone()
    }

    /// Lock the oldest queued frame for a texture upload and return it.
    /// The pixel pointer stays valid until the returned `Arc` is dropped.
    pub fn lock_oldest_frame(&self) -> Option<SharedFrameBuffer> {
        self.shared.queue.lock_oldest()
    }

    /// Release the lock taken by [`lock_oldest_frame`](Self::lock_oldest_frame).
    pub fn unlock_oldest_frame(&self) {
        self.shared.queue.unlock_oldest()
    }

    /// Remove the oldest (unlocked) frame from the queue.
    pub fn dequeue_frame(&self) -> Option<SharedFrameBuffer> {
        self.shared.queue.dequeue_oldest()
    }

    /// Stop capturing: ends the hardware subscription, waits (bounded) for
    /// any in-flight callback, then drops queued frames. Idempotent.
    pub fn stop(&self) {
        let session = self.session.lock().take();
        if let Some(mut session) = session {
            session.stop();
            self.shared.queue.clear();
            info!(device = self.device, "receiver stopped");
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.stop();
    }
}
