//! Framelink Bridge - C calling surface for host engines
//!
//! Adapts the session layer to a fixed C ABI: sessions are referenced by
//! `u32` handles (never raw pointers), strings are copied into caller
//! buffers, and the host's texture-update protocol maps onto the frame
//! queue's lock/unlock pair. All entry points degrade gracefully when the
//! bridge is uninitialized or a handle is stale — a late callback gets a
//! null result, never a crash.
//!
//! The bridge state is an explicit singleton: the embedding application
//! installs a driver with [`init`] and tears everything down with
//! [`shutdown`]; nothing relies on process-exit cleanup.

// FFI surface: raw pointer reads/writes at the boundary.
#![allow(unsafe_code)]

pub mod capi;
pub mod texture;

use framelink_core::{ObjectRegistry, SharedFrameBuffer};
use framelink_driver::Driver;
use framelink_session::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::info;

/// A registered receiver plus the frame pinned between texture-update
/// begin and end, keeping the pixel pointer handed to the host valid.
pub(crate) struct ReceiverEntry {
    pub(crate) receiver: Arc<Receiver>,
    pub(crate) pinned: Mutex<Option<SharedFrameBuffer>>,
}

pub(crate) struct BridgeState {
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) receivers: ObjectRegistry<ReceiverEntry>,
    pub(crate) senders: ObjectRegistry<Sender>,
}

pub(crate) static STATE: RwLock<Option<BridgeState>> = RwLock::new(None);

/// Install the bridge singleton over `driver`. Replaces (and tears down)
/// any previous state.
pub fn init(driver: Arc<dyn Driver>) {
    let state = BridgeState {
        driver,
        receivers: ObjectRegistry::new(),
        senders: ObjectRegistry::new(),
    };
    let previous = STATE.write().replace(state);
    drop(previous); // session drops stop their hardware subscriptions
    info!("bridge initialized");
}

/// Tear the bridge down explicitly: every session is unregistered first
/// (stale handles resolve to null from here on) and then stopped.
pub fn shutdown() {
    if let Some(state) = STATE.write().take() {
        for entry in state.receivers.drain() {
            entry.pinned.lock().take();
            entry.receiver.stop();
        }
        for sender in state.senders.drain() {
            sender.stop();
        }
        info!("bridge shut down");
    }
}

pub(crate) fn with_state<R>(default: R, f: impl FnOnce(&BridgeState) -> R) -> R {
    match &*STATE.read() {
        Some(state) => f(state),
        None => default,
    }
}

pub(crate) fn with_receiver<R>(handle: u32, default: R, f: impl FnOnce(&ReceiverEntry) -> R) -> R {
    let entry = with_state(None, |state| {
        state
            .receivers
            .resolve(framelink_core::Handle::from_raw(handle))
    });
    match entry {
        Some(entry) => f(&entry),
        None => default,
    }
}

pub(crate) fn with_sender<R>(handle: u32, default: R, f: impl FnOnce(&Sender) -> R) -> R {
    let sender = with_state(None, |state| {
        state
            .senders
            .resolve(framelink_core::Handle::from_raw(handle))
    });
    match sender {
        Some(sender) => f(&sender),
        None => default,
    }
}
