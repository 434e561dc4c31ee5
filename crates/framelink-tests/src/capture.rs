//! End-to-end capture path: mock hardware -> receiver -> consumer.

use framelink_driver::device::CapturedFrame;
use framelink_driver::{DisplayMode, Driver, FrameEvent, MockDriver};
use framelink_session::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn captured(mode: &DisplayMode, fill: u8) -> FrameEvent {
    FrameEvent::Video(CapturedFrame {
        data: vec![fill; mode.frame_size()],
        width: mode.width,
        height: mode.height,
        bytes_per_pixel: mode.pixel_format.bytes_per_pixel(),
    })
}

#[test]
fn capture_lock_copy_unlock_dequeue() {
    crate::init_logging();
    let driver = Arc::new(MockDriver::new());
    let receiver = Receiver::start(driver.clone(), 0, 0).unwrap();
    let mode = driver.display_modes(0).unwrap()[0].clone();

    driver.deliver(captured(&mode, 0xA0));
    driver.deliver(captured(&mode, 0xA1));
    wait_for(|| receiver.queued_frame_count() == 2);

    // Render thread: lock the oldest, copy, unlock, then consume it.
    let locked = receiver.lock_oldest_frame().unwrap();
    assert_eq!(locked.data()[0], 0xA0);
    let copied = locked.data().to_vec();
    receiver.unlock_oldest_frame();

    let dequeued = receiver.dequeue_frame().unwrap();
    assert_eq!(dequeued.data(), &copied[..]);
    assert_eq!(receiver.queued_frame_count(), 1);

    receiver.stop();
}

#[test]
fn producer_overrun_stays_bounded() {
    let driver = Arc::new(MockDriver::new());
    let receiver = Receiver::start(driver.clone(), 0, 0).unwrap();
    let mode = driver.display_modes(0).unwrap()[0].clone();

    // Deliver far more frames than the queue holds while nothing consumes.
    for i in 0..40u8 {
        driver.deliver(captured(&mode, i));
    }
    wait_for(|| receiver.dropped_frame_count() > 0);
    wait_for(|| receiver.dropped_frame_count() == 40 - receiver.queued_frame_count() as u64);

    assert!(receiver.queued_frame_count() <= 8);

    // The survivors are the newest frames, still in FIFO order.
    let first = receiver.dequeue_frame().unwrap();
    let second = receiver.dequeue_frame().unwrap();
    assert!(second.sequence() == first.sequence() + 1);

    receiver.stop();
}

#[test]
fn lock_outlives_dequeue_of_later_frames() {
    let driver = Arc::new(MockDriver::new());
    let receiver = Receiver::start(driver.clone(), 0, 0).unwrap();
    let mode = driver.display_modes(0).unwrap()[0].clone();

    driver.deliver(captured(&mode, 1));
    wait_for(|| receiver.queued_frame_count() == 1);

    // GPU holds the lock while the control thread stops the session; the
    // pinned Arc keeps the pixels alive regardless.
    let locked = receiver.lock_oldest_frame().unwrap();
    receiver.stop();
    assert_eq!(locked.data()[0], 1);
}
