//! Plugin-boundary lifecycle: handles, texture protocol, teardown races.
//!
//! The bridge state is process-global, so these tests serialize on a mutex.

use framelink_bridge::capi::*;
use framelink_bridge::texture::{
    framelink_texture_update_begin, framelink_texture_update_end, TextureUpdateParams,
};
use framelink_driver::device::CapturedFrame;
use framelink_driver::{DisplayMode, Driver, FrameEvent, MockDriver};
use parking_lot::Mutex;
use std::os::raw::c_char;
use std::sync::Arc;
use std::time::{Duration, Instant};

static BRIDGE_LOCK: Mutex<()> = Mutex::new(());

fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn read_string<F: Fn(*mut c_char, usize) -> i32>(f: F) -> String {
    let mut buf = [0 as c_char; 256];
    let len = f(buf.as_mut_ptr(), buf.len());
    assert!(len >= 0);
    buf[..len as usize]
        .iter()
        .map(|&c| c as u8 as char)
        .collect()
}

fn deliver_frame(driver: &MockDriver, mode: &DisplayMode, fill: u8) {
    driver.deliver(FrameEvent::Video(CapturedFrame {
        data: vec![fill; mode.frame_size()],
        width: mode.width,
        height: mode.height,
        bytes_per_pixel: mode.pixel_format.bytes_per_pixel(),
    }));
}

#[test]
fn receiver_lifecycle_over_the_c_surface() {
    crate::init_logging();
    let _guard = BRIDGE_LOCK.lock();
    let driver = Arc::new(MockDriver::new());
    framelink_bridge::init(driver.clone());

    assert_eq!(framelink_device_count(), 2);
    assert_eq!(read_string(|b, c| framelink_device_name(0, b, c)), "Mock SDI 1");

    let handle = framelink_create_receiver(0, 3);
    assert_ne!(handle, 0);
    assert_eq!(framelink_receiver_width(handle), 1920);
    assert_eq!(framelink_receiver_height(handle), 1080);
    assert_eq!(framelink_receiver_is_progressive(handle), 0);
    assert!((framelink_receiver_frame_rate(handle) - 29.97).abs() < 0.01);
    assert_eq!(
        read_string(|b, c| framelink_receiver_format_name(handle, b, c)),
        "1080i59.94"
    );

    let mode = driver.display_modes(0).unwrap()[3].clone();
    deliver_frame(&driver, &mode, 0xC3);
    wait_for(|| framelink_receiver_queued_count(handle) == 1);

    // Host render thread: update-begin hands out the locked frame's pixels.
    let mut params = TextureUpdateParams {
        handle,
        width: mode.width,
        height: mode.height,
        bytes_per_pixel: mode.pixel_format.bytes_per_pixel() as u32,
        tex_data: std::ptr::null(),
    };
    framelink_texture_update_begin(&mut params);
    assert!(!params.tex_data.is_null());
    assert_eq!(unsafe { *params.tex_data }, 0xC3);
    framelink_texture_update_end(handle);

    assert_eq!(framelink_receiver_dequeue(handle), 1);
    assert_eq!(framelink_receiver_queued_count(handle), 0);

    framelink_destroy_receiver(handle);
    framelink_bridge::shutdown();
}

#[test]
fn texture_begin_refuses_mismatched_texture() {
    let _guard = BRIDGE_LOCK.lock();
    let driver = Arc::new(MockDriver::new());
    framelink_bridge::init(driver.clone());

    let handle = framelink_create_receiver(0, 3);
    let mode = driver.display_modes(0).unwrap()[3].clone();
    deliver_frame(&driver, &mode, 1);
    wait_for(|| framelink_receiver_queued_count(handle) == 1);

    // The host still holds a texture of the previous (smaller) mode.
    let mut params = TextureUpdateParams {
        handle,
        width: 720,
        height: 486,
        bytes_per_pixel: 2,
        tex_data: std::ptr::null(),
    };
    framelink_texture_update_begin(&mut params);
    assert!(params.tex_data.is_null());
    // The frame stays queued and unlocked for a later, matching update.
    assert_eq!(framelink_receiver_dequeue(handle), 1);

    framelink_bridge::shutdown();
}

#[test]
fn stale_handle_after_destroy_is_inert() {
    let _guard = BRIDGE_LOCK.lock();
    let driver = Arc::new(MockDriver::new());
    framelink_bridge::init(driver.clone());

    let handle = framelink_create_receiver(0, 0);
    framelink_destroy_receiver(handle);

    // A late render-thread callback resolves to nothing, silently.
    let mut params = TextureUpdateParams {
        handle,
        width: 720,
        height: 486,
        bytes_per_pixel: 2,
        tex_data: std::ptr::null(),
    };
    framelink_texture_update_begin(&mut params);
    assert!(params.tex_data.is_null());
    framelink_texture_update_end(handle);

    assert_eq!(framelink_receiver_width(handle), 0);
    assert_eq!(framelink_receiver_dequeue(handle), 0);
    framelink_destroy_receiver(handle);

    framelink_bridge::shutdown();
}

#[test]
fn sender_over_the_c_surface() {
    let _guard = BRIDGE_LOCK.lock();
    let driver = Arc::new(MockDriver::new());
    driver.set_auto_complete(true);
    framelink_bridge::init(driver.clone());

    let handle = framelink_create_manual_sender(0, 0);
    assert_ne!(handle, 0);
    assert_eq!(framelink_sender_is_reference_locked(handle), 0);
    driver.set_reference_locked(true);
    assert_eq!(framelink_sender_is_reference_locked(handle), 1);

    let mode = driver.display_modes(0).unwrap()[0].clone();
    let pixels = vec![0x22u8; mode.frame_size()];
    let sequence = framelink_sender_feed(handle, pixels.as_ptr(), pixels.len());
    assert!(sequence > 0);
    assert_eq!(
        framelink_sender_wait_completion(handle, sequence as u64, 1000),
        0
    );

    // Wrong-size feed fails and leaves a readable error.
    assert_eq!(framelink_sender_feed(handle, pixels.as_ptr(), 16), -1);
    assert!(read_string(|b, c| framelink_sender_last_error(handle, b, c)).contains("mismatch"));

    framelink_destroy_sender(handle);
    assert_eq!(framelink_sender_wait_completion(handle, 1, 10), -1);

    framelink_bridge::shutdown();
}

#[test]
fn uninitialized_bridge_degrades_to_zero() {
    let _guard = BRIDGE_LOCK.lock();
    framelink_bridge::shutdown();

    assert_eq!(framelink_device_count(), 0);
    assert_eq!(framelink_create_receiver(0, 0), 0);
    assert_eq!(framelink_create_async_sender(0, 0, 3), 0);
    assert_eq!(framelink_receiver_width(7), 0);

    let mut params = TextureUpdateParams {
        handle: 7,
        width: 2,
        height: 2,
        bytes_per_pixel: 2,
        tex_data: std::ptr::null(),
    };
    framelink_texture_update_begin(&mut params);
    assert!(params.tex_data.is_null());
}
