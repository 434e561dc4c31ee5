//! Framelink Driver - Hardware abstraction for SDI capture/playback
//!
//! This crate defines the capability traits the session layer consumes:
//! - Device and display-mode description
//! - Capture sessions delivering frames via callback
//! - Playback sessions accepting scheduled frames with per-frame completion
//!
//! A vendor SDK binding implements [`Driver`] against the real hardware;
//! [`MockDriver`] is the deterministic in-process implementation used by
//! tests and offline development.

pub mod device;
pub mod enumerate;
pub mod mock;
pub mod mode;

pub use device::{
    CaptureSession, CapturedFrame, CompletionCallback, DeviceInfo, Driver, FrameCallback,
    FrameEvent, PlaybackSession,
};
pub use mock::MockDriver;
pub use mode::{standard_modes, DisplayMode};
