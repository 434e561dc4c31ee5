//! Capability traits standing in for the vendor SDK's device objects.
//!
//! The real SDK exposes COM-style interfaces; the session layer only needs
//! the narrow contract below: enumerate devices, open a capture session that
//! delivers frames on its own callback thread, open a playback session that
//! accepts scheduled frames and signals per-frame completion.
//!
//! Callback contract: capture and completion callbacks run on driver-owned
//! threads inside real-time budgets. They must not block, and after a
//! session's `stop` returns the driver guarantees no further invocations.

use crate::mode::DisplayMode;
use framelink_core::{Result, SharedFrameBuffer};
use serde::{Deserialize, Serialize};

/// A capture/playback device as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable device index used to open sessions.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
}

/// A frame as delivered by the capture hardware.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw pixel data, owned by the event.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel of the delivered data.
    pub bytes_per_pixel: usize,
}

/// An event on the capture callback thread.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    /// A complete frame arrived.
    Video(CapturedFrame),
    /// The hardware reported an input frame it had to drop.
    Dropped,
    /// The input signal is absent or invalid.
    NoSignal,
}

/// Invoked on the driver's callback thread for every capture event.
pub type FrameCallback = Box<dyn Fn(FrameEvent) + Send + Sync>;

/// Invoked on the driver's callback thread when a scheduled frame finishes
/// playing out, carrying the frame's sequence number.
pub type CompletionCallback = Box<dyn Fn(u64) + Send + Sync>;

/// A live subscription to a capture device.
pub trait CaptureSession: Send {
    /// Request the subscription to cease and wait (bounded) for any
    /// in-flight callback to finish. No events are delivered after this
    /// returns. Safe to call more than once.
    fn stop(&mut self);
}

/// A live playback subscription on an output device.
pub trait PlaybackSession: Send + Sync {
    /// Schedule a frame for output under `sequence`. The same sequence is
    /// reported back through the completion callback once the frame has
    /// played out. Fails once the session has stopped.
    fn schedule_frame(&self, frame: SharedFrameBuffer, sequence: u64) -> Result<()>;

    /// Whether the output is genlocked to an external reference.
    fn reference_locked(&self) -> bool;

    /// Stop playback; same guarantees as [`CaptureSession::stop`].
    fn stop(&mut self);
}

/// The vendor SDK surface the session layer consumes.
pub trait Driver: Send + Sync {
    /// List the available devices. An empty list is not an error (no driver
    /// installed behaves like no hardware).
    fn enumerate(&self) -> Vec<DeviceInfo>;

    /// The display modes a device supports.
    fn display_modes(&self, device: usize) -> Result<Vec<DisplayMode>>;

    /// Open a capture session on `device` in the given mode. Frames arrive
    /// through `on_frame` on a driver-owned thread.
    fn open_capture(
        &self,
        device: usize,
        mode_index: usize,
        on_frame: FrameCallback,
    ) -> Result<(DisplayMode, Box<dyn CaptureSession>)>;

    /// Open a playback session on `device` in the given mode. Completions
    /// arrive through `on_completed` on a driver-owned thread.
    fn open_playback(
        &self,
        device: usize,
        mode_index: usize,
        on_completed: CompletionCallback,
    ) -> Result<(DisplayMode, Box<dyn PlaybackSession>)>;
}
