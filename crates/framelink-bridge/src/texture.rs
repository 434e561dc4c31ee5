//! Host texture-update protocol adapter.
//!
//! The host engine drives texture uploads with two events: update-begin
//! asks for a stable pixel pointer matching the texture it allocated, and
//! update-end signals the pointer is no longer needed. They map 1:1 onto
//! the frame queue's lock/unlock pair. Both events arrive on the host's
//! render thread and carry only the receiver's integer handle, so a stale
//! handle (receiver destroyed meanwhile) is a silent no-op.

use crate::with_receiver;

/// Parameters of an update-begin event, mirroring the host's callback
/// structure. `tex_data` is filled in by the bridge on success.
#[repr(C)]
pub struct TextureUpdateParams {
    /// Receiver handle the host stored as user data.
    pub handle: u32,
    /// Width of the texture being updated.
    pub width: u32,
    /// Height of the texture being updated.
    pub height: u32,
    /// Bytes per pixel of the texture.
    pub bytes_per_pixel: u32,
    /// Out: pointer to the locked frame's pixels, valid until update-end.
    pub tex_data: *const u8,
}

/// Update-begin: lock the receiver's oldest frame and hand its pixels to
/// the host.
///
/// The pointer is only produced when the texture's byte size matches the
/// receiver's configured frame size; after a mode change the host may still
/// hold a texture of the old dimensions, and a mismatched copy would
/// corrupt memory. In every failure case `tex_data` is set to null.
#[no_mangle]
pub extern "C" fn framelink_texture_update_begin(params: *mut TextureUpdateParams) {
    if params.is_null() {
        return;
    }
    let params = unsafe { &mut *params };
    params.tex_data = std::ptr::null();

    let requested =
        params.width as usize * params.height as usize * params.bytes_per_pixel as usize;
    params.tex_data = with_receiver(params.handle, std::ptr::null(), |entry| {
        if entry.receiver.expected_frame_size() != requested {
            return std::ptr::null();
        }
        match entry.receiver.lock_oldest_frame() {
            Some(frame) => {
                let ptr = frame.as_ptr();
                // Pin the Arc so the pixels outlive the host's copy even if
                // the frame is dequeued before update-end.
                *entry.pinned.lock() = Some(frame);
                ptr
            }
            None => std::ptr::null(),
        }
    });
}

/// Update-end: release the pinned frame and clear the queue's lock flag.
#[no_mangle]
pub extern "C" fn framelink_texture_update_end(handle: u32) {
    with_receiver(handle, (), |entry| {
        entry.pinned.lock().take();
        entry.receiver.unlock_oldest_frame();
    });
}
