//! The C ABI entry points.
//!
//! Conventions: handles are `u32` (0 = invalid), strings are copied into a
//! caller-supplied buffer and NUL-terminated (return value is the copied
//! length, -1 on a bad buffer), and every function returns its type's zero
//! value when the bridge is uninitialized or the handle is stale.

use crate::{with_receiver, with_sender, with_state, ReceiverEntry};
use framelink_core::Handle;
use framelink_driver::enumerate;
use framelink_session::{Receiver, Sender};
use parking_lot::Mutex;
use std::os::raw::{c_char, c_int};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Copy `s` into `buf` (capacity `cap`), NUL-terminating and truncating as
/// needed. Returns the number of bytes copied, excluding the NUL.
fn copy_string(s: &str, buf: *mut c_char, cap: usize) -> c_int {
    if buf.is_null() || cap == 0 {
        return -1;
    }
    let bytes = s.as_bytes();
    let len = bytes.len().min(cap - 1);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, len);
        *buf.add(len) = 0;
    }
    len as c_int
}

// ---- Enumeration ----------------------------------------------------------

#[no_mangle]
pub extern "C" fn framelink_device_count() -> c_int {
    with_state(0, |state| state.driver.enumerate().len() as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_device_name(index: c_int, buf: *mut c_char, cap: usize) -> c_int {
    if index < 0 {
        return -1;
    }
    with_state(-1, |state| {
        match enumerate::device_names(&*state.driver).get(index as usize) {
            Some(name) => copy_string(name, buf, cap),
            None => -1,
        }
    })
}

#[no_mangle]
pub extern "C" fn framelink_display_mode_count(device: c_int) -> c_int {
    if device < 0 {
        return 0;
    }
    with_state(0, |state| {
        enumerate::display_mode_names(&*state.driver, device as usize).len() as c_int
    })
}

#[no_mangle]
pub extern "C" fn framelink_display_mode_name(
    device: c_int,
    mode: c_int,
    buf: *mut c_char,
    cap: usize,
) -> c_int {
    if device < 0 || mode < 0 {
        return -1;
    }
    with_state(-1, |state| {
        match enumerate::display_mode_names(&*state.driver, device as usize).get(mode as usize) {
            Some(name) => copy_string(name, buf, cap),
            None => -1,
        }
    })
}

// ---- Receiver -------------------------------------------------------------

#[no_mangle]
pub extern "C" fn framelink_create_receiver(device: c_int, format: c_int) -> u32 {
    if device < 0 || format < 0 {
        return 0;
    }
    with_state(0, |state| {
        match Receiver::start(state.driver.clone(), device as usize, format as usize) {
            Ok(receiver) => {
                let entry = Arc::new(ReceiverEntry {
                    receiver,
                    pinned: Mutex::new(None),
                });
                state.receivers.register(entry).raw()
            }
            Err(err) => {
                warn!(error = %err, "create_receiver failed");
                0
            }
        }
    })
}

/// Unregisters first so concurrent texture callbacks resolve to null, then
/// stops the capture session.
#[no_mangle]
pub extern "C" fn framelink_destroy_receiver(handle: u32) {
    with_state((), |state| {
        if let Some(entry) = state.receivers.unregister(Handle::from_raw(handle)) {
            entry.pinned.lock().take();
            entry.receiver.stop();
        }
    })
}

#[no_mangle]
pub extern "C" fn framelink_receiver_width(handle: u32) -> c_int {
    with_receiver(handle, 0, |entry| entry.receiver.dimensions().0 as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_receiver_height(handle: u32) -> c_int {
    with_receiver(handle, 0, |entry| entry.receiver.dimensions().1 as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_receiver_frame_rate(handle: u32) -> f32 {
    with_receiver(handle, 0.0, |entry| entry.receiver.frame_rate() as f32)
}

#[no_mangle]
pub extern "C" fn framelink_receiver_is_progressive(handle: u32) -> c_int {
    with_receiver(handle, 0, |entry| entry.receiver.is_progressive() as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_receiver_format_name(
    handle: u32,
    buf: *mut c_char,
    cap: usize,
) -> c_int {
    with_receiver(handle, -1, |entry| {
        copy_string(&entry.receiver.format_name(), buf, cap)
    })
}

#[no_mangle]
pub extern "C" fn framelink_receiver_queued_count(handle: u32) -> c_int {
    with_receiver(handle, 0, |entry| entry.receiver.queued_frame_count() as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_receiver_dropped_count(handle: u32) -> u64 {
    with_receiver(handle, 0, |entry| entry.receiver.dropped_frame_count())
}

#[no_mangle]
pub extern "C" fn framelink_receiver_last_error(
    handle: u32,
    buf: *mut c_char,
    cap: usize,
) -> c_int {
    with_receiver(handle, -1, |entry| {
        copy_string(&entry.receiver.last_error(), buf, cap)
    })
}

/// Remove the oldest (unlocked) queued frame. Returns 1 when a frame was
/// removed, 0 otherwise.
#[no_mangle]
pub extern "C" fn framelink_receiver_dequeue(handle: u32) -> c_int {
    with_receiver(handle, 0, |entry| {
        entry.receiver.dequeue_frame().is_some() as c_int
    })
}

// ---- Sender ---------------------------------------------------------------

fn create_sender(device: c_int, format: c_int, preroll: Option<c_int>) -> u32 {
    if device < 0 || format < 0 {
        return 0;
    }
    with_state(0, |state| {
        let started = match preroll {
            Some(preroll) if preroll >= 0 => Sender::start_async(
                state.driver.clone(),
                device as usize,
                format as usize,
                preroll as usize,
            ),
            Some(_) => return 0,
            None => Sender::start_manual(state.driver.clone(), device as usize, format as usize),
        };
        match started {
            Ok(sender) => state.senders.register(sender).raw(),
            Err(err) => {
                warn!(error = %err, "create_sender failed");
                0
            }
        }
    })
}

#[no_mangle]
pub extern "C" fn framelink_create_async_sender(device: c_int, format: c_int, preroll: c_int) -> u32 {
    create_sender(device, format, Some(preroll))
}

#[no_mangle]
pub extern "C" fn framelink_create_manual_sender(device: c_int, format: c_int) -> u32 {
    create_sender(device, format, None)
}

#[no_mangle]
pub extern "C" fn framelink_destroy_sender(handle: u32) {
    with_state((), |state| {
        if let Some(sender) = state.senders.unregister(Handle::from_raw(handle)) {
            sender.stop();
        }
    })
}

#[no_mangle]
pub extern "C" fn framelink_sender_width(handle: u32) -> c_int {
    with_sender(handle, 0, |sender| sender.dimensions().0 as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_sender_height(handle: u32) -> c_int {
    with_sender(handle, 0, |sender| sender.dimensions().1 as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_sender_frame_rate(handle: u32) -> f32 {
    with_sender(handle, 0.0, |sender| sender.frame_rate() as f32)
}

#[no_mangle]
pub extern "C" fn framelink_sender_is_progressive(handle: u32) -> c_int {
    with_sender(handle, 0, |sender| sender.is_progressive() as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_sender_is_reference_locked(handle: u32) -> c_int {
    with_sender(handle, 0, |sender| sender.is_reference_locked() as c_int)
}

#[no_mangle]
pub extern "C" fn framelink_sender_last_error(handle: u32, buf: *mut c_char, cap: usize) -> c_int {
    with_sender(handle, -1, |sender| copy_string(&sender.last_error(), buf, cap))
}

/// Feed pixel data to a sender. The data is copied before this returns.
///
/// Manual mode returns the submitted frame's sequence number for use with
/// [`framelink_sender_wait_completion`]; async mode returns 0 on success.
/// Any failure returns -1 (details via `framelink_sender_last_error`).
#[no_mangle]
pub extern "C" fn framelink_sender_feed(handle: u32, data: *const u8, len: usize) -> i64 {
    if data.is_null() {
        return -1;
    }
    let pixels = unsafe { std::slice::from_raw_parts(data, len) };
    with_sender(handle, -1, |sender| {
        let result = if sender.is_async_mode() {
            sender.feed_frame(pixels).map(|()| 0)
        } else {
            sender.submit_frame(pixels).map(|seq| seq as i64)
        };
        result.unwrap_or(-1)
    })
}

/// Block until `sequence` completes. Returns 0 on success, 1 on timeout,
/// -1 for a stale handle.
#[no_mangle]
pub extern "C" fn framelink_sender_wait_completion(
    handle: u32,
    sequence: u64,
    timeout_ms: u32,
) -> c_int {
    with_sender(handle, -1, |sender| {
        match sender.wait_completion(sequence, Duration::from_millis(timeout_ms as u64)) {
            Ok(()) => 0,
            Err(_) => 1,
        }
    })
}
