//! Framelink Core - Foundation types for the frame-exchange pipeline
//!
//! This crate provides the types shared by every Framelink crate:
//! - Frame buffers and pixel formats
//! - Rational frame rates
//! - The bounded, thread-safe frame queue
//! - The generational handle registry used across the plugin boundary

pub mod error;
pub mod frame;
pub mod queue;
pub mod rate;
pub mod registry;

pub use error::{FramelinkError, Result};
pub use frame::{FrameBuffer, PixelFormat, SharedFrameBuffer};
pub use queue::FrameQueue;
pub use rate::FrameRate;
pub use registry::{Handle, ObjectRegistry};
