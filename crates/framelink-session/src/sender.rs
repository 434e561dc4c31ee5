//! Playback session: caller frames in, scheduled hardware output.
//!
//! Two mutually exclusive feeding modes are fixed at start. In async mode
//! the session pre-rolls a few frames and the hardware's completion
//! callback keeps requesting the next one; the caller just replaces the
//! pending frame whenever it has something new. In manual mode the caller
//! submits one frame at a time and may block on its completion with a
//! bounded wait — the only blocking operation in the core.

use framelink_core::{FrameBuffer, FramelinkError, Result, SharedFrameBuffer};
use framelink_driver::device::PlaybackSession;
use framelink_driver::{DisplayMode, Driver};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// State shared with the hardware completion callback thread.
struct SenderShared {
    mode: DisplayMode,
    session: Mutex<Option<Box<dyn PlaybackSession>>>,
    /// Async mode: the frame scheduled on each completion. Starts black so
    /// the output carries a valid signal before the first feed.
    pending: Mutex<SharedFrameBuffer>,
    /// Highest completed sequence number.
    completed: Mutex<u64>,
    completed_cv: Condvar,
    next_sequence: AtomicU64,
    last_error: Mutex<String>,
    async_mode: bool,
}

impl SenderShared {
    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "sender error");
        *self.last_error.lock() = message;
    }

    /// Runs on the driver's callback thread.
    fn on_completed(&self, sequence: u64) {
        {
            let mut done = self.completed.lock();
            if sequence > *done {
                *done = sequence;
            }
        }
        self.completed_cv.notify_all();

        if self.async_mode {
            // The hardware is asking for the next frame: reschedule the most
            // recently fed one (repeats the last frame when the caller is slow).
            let frame = self.pending.lock().clone();
            let next = self.next_sequence.fetch_add(1, Ordering::Relaxed);
            if let Some(session) = &*self.session.lock() {
                if let Err(err) = session.schedule_frame(frame, next) {
                    self.set_error(err.to_string());
                }
            }
        }
    }
}

/// A live playback session.
pub struct Sender {
    shared: Arc<SenderShared>,
    device: usize,
}

impl Sender {
    /// Open an asynchronously fed playback session. `preroll` frames are
    /// scheduled before playback begins to absorb startup jitter.
    pub fn start_async(
        driver: Arc<dyn Driver>,
        device: usize,
        mode_index: usize,
        preroll: usize,
    ) -> Result<Arc<Self>> {
        Self::open(driver, device, mode_index, true, preroll)
    }

    /// Open a manually fed playback session: one
    /// [`submit_frame`](Self::submit_frame) per output frame, with
    /// [`wait_completion`](Self::wait_completion) available per submission.
    pub fn start_manual(
        driver: Arc<dyn Driver>,
        device: usize,
        mode_index: usize,
    ) -> Result<Arc<Self>> {
        Self::open(driver, device, mode_index, false, 0)
    }

    fn open(
        driver: Arc<dyn Driver>,
        device: usize,
        mode_index: usize,
        async_mode: bool,
        preroll: usize,
    ) -> Result<Arc<Self>> {
        let modes = driver.display_modes(device)?;
        let mode = modes.get(mode_index).cloned().ok_or_else(|| {
            FramelinkError::ModeUnavailable(format!("no display mode at index {mode_index}"))
        })?;

        let black = Arc::new(FrameBuffer::new(mode.width, mode.height, mode.pixel_format, 0));
        let shared = Arc::new(SenderShared {
            mode: mode.clone(),
            session: Mutex::new(None),
            pending: Mutex::new(black),
            completed: Mutex::new(0),
            completed_cv: Condvar::new(),
            next_sequence: AtomicU64::new(1),
            last_error: Mutex::new(String::new()),
            async_mode,
        });

        let callback_shared = shared.clone();
        let (_mode, session) = driver.open_playback(
            device,
            mode_index,
            Box::new(move |sequence| callback_shared.on_completed(sequence)),
        )?;
        *shared.session.lock() = Some(session);

        if async_mode {
            for _ in 0..preroll {
                let frame = shared.pending.lock().clone();
                let sequence = shared.next_sequence.fetch_add(1, Ordering::Relaxed);
                if let Some(session) = &*shared.session.lock() {
                    session.schedule_frame(frame, sequence)?;
                }
            }
        }
        info!(device, mode = %mode, async_mode, preroll, "sender started");

        Ok(Arc::new(Self { shared, device }))
    }

    /// Replace the pending output frame (async mode only). Non-blocking;
    /// the caller's slice is copied and not retained.
    pub fn feed_frame(&self, pixels: &[u8]) -> Result<()> {
        if !self.shared.async_mode {
            return Err(FramelinkError::Internal(
                "feed_frame is only valid in async mode".to_string(),
            ));
        }
        let frame = self.copy_frame(pixels, 0)?;
        *self.shared.pending.lock() = Arc::new(frame);
        Ok(())
    }

    /// Submit one frame for output (manual mode only) and return its
    /// sequence number for [`wait_completion`](Self::wait_completion).
    pub fn submit_frame(&self, pixels: &[u8]) -> Result<u64> {
        if self.shared.async_mode {
            return Err(FramelinkError::Internal(
                "submit_frame is only valid in manual mode".to_string(),
            ));
        }
        let sequence = self.shared.next_sequence.fetch_add(1, Ordering::Relaxed);
        let frame = self.copy_frame(pixels, sequence)?;
        let session = self.shared.session.lock();
        match &*session {
            Some(session) => session.schedule_frame(Arc::new(frame), sequence)?,
            None => return Err(FramelinkError::SessionStopped),
        }
        Ok(sequence)
    }

    /// Block until `sequence` has played out, or fail with
    /// [`FramelinkError::CompletionTimeout`] after `timeout`. Bounded even
    /// if the hardware session has stopped.
    pub fn wait_completion(&self, sequence: u64, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut done = self.shared.completed.lock();
        while *done < sequence {
            if self
                .shared
                .completed_cv
                .wait_until(&mut done, deadline)
                .timed_out()
            {
                return Err(FramelinkError::CompletionTimeout(timeout));
            }
        }
        Ok(())
    }

    /// Frame dimensions of the configured mode.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.shared.mode.width, self.shared.mode.height)
    }

    /// Frame rate as a floating value.
    pub fn frame_rate(&self) -> f64 {
        self.shared.mode.frame_rate.fps()
    }

    /// Progressive scan; false for interlaced modes.
    pub fn is_progressive(&self) -> bool {
        self.shared.mode.progressive
    }

    /// Whether the session was started in async mode.
    pub fn is_async_mode(&self) -> bool {
        self.shared.async_mode
    }

    /// Live external genlock status from the output hardware.
    pub fn is_reference_locked(&self) -> bool {
        self.shared
            .session
            .lock()
            .as_ref()
            .map(|session| session.reference_locked())
            .unwrap_or(false)
    }

    /// Highest sequence number reported complete so far.
    pub fn last_completed_sequence(&self) -> u64 {
        *self.shared.completed.lock()
    }

    /// The latest error message; empty when no error has occurred.
    pub fn last_error(&self) -> String {
        self.shared.last_error.lock().clone()
    }

    fn copy_frame(&self, pixels: &[u8], sequence: u64) -> Result<FrameBuffer> {
        let mode = &self.shared.mode;
        FrameBuffer::copy_from_slice(
            pixels,
            mode.width,
            mode.height,
            mode.pixel_format.bytes_per_pixel(),
            sequence,
        )
        .map_err(|err| {
            self.shared.set_error(err.to_string());
            err
        })
    }

    /// Stop playback: ends the hardware subscription and waits (bounded)
    /// for any in-flight completion callback. Idempotent.
    pub fn stop(&self) {
        let session = self.shared.session.lock().take();
        if let Some(mut session) = session {
            session.stop();
            // Wake any waiter so it can observe the stop and time out.
            self.shared.completed_cv.notify_all();
            info!(device = self.device, "sender stopped");
        }
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.stop();
    }
}
