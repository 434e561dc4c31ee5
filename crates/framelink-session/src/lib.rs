//! Framelink Session - Capture and playback session objects
//!
//! A [`Receiver`] owns a capture subscription and a bounded frame queue; a
//! [`Sender`] owns a playback subscription with asynchronous or manual
//! feeding. Both are safe to query from any thread while the hardware
//! callback thread delivers or consumes frames.

pub mod receiver;
pub mod sender;

pub use receiver::Receiver;
pub use sender::Sender;
