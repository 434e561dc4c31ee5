//! End-to-end playback path: sender -> mock hardware completions.

use framelink_driver::{Driver, MockDriver};
use framelink_session::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn frame_pixels(driver: &MockDriver) -> Vec<u8> {
    let mode = &driver.display_modes(0).unwrap()[0];
    vec![0x55; mode.frame_size()]
}

#[test]
fn manual_mode_completion_from_hardware_thread() {
    crate::init_logging();
    let driver = Arc::new(MockDriver::new());
    let sender = Sender::start_manual(driver.clone(), 0, 0).unwrap();

    let sequence = sender.submit_frame(&frame_pixels(&driver)).unwrap();

    // The hardware signals completion a little later, from its own thread.
    let signal_driver = driver.clone();
    let signaller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        signal_driver.complete(sequence);
    });

    sender
        .wait_completion(sequence, Duration::from_secs(1))
        .unwrap();
    signaller.join().unwrap();
    sender.stop();
}

#[test]
fn async_mode_sustains_output_without_feeding() {
    let driver = Arc::new(MockDriver::new());
    let sender = Sender::start_async(driver.clone(), 0, 0, 2).unwrap();
    assert_eq!(driver.scheduled_sequences().len(), 2);

    // With no frame fed yet, completions keep the output running on the
    // preroll (black) frame.
    driver.complete(1);
    wait_for(|| driver.scheduled_sequences().len() == 3);
    driver.complete(2);
    wait_for(|| driver.scheduled_sequences().len() == 4);

    // Feeding swaps in fresh content for subsequent reschedules.
    sender.feed_frame(&frame_pixels(&driver)).unwrap();
    driver.complete(3);
    wait_for(|| driver.scheduled_sequences().len() == 5);

    sender.stop();
}

#[test]
fn stop_bounds_pending_waits() {
    let driver = Arc::new(MockDriver::new());
    let sender = Sender::start_manual(driver.clone(), 0, 0).unwrap();
    let sequence = sender.submit_frame(&frame_pixels(&driver)).unwrap();

    let waiter_sender = sender.clone();
    let waiter = thread::spawn(move || {
        waiter_sender.wait_completion(sequence, Duration::from_millis(200))
    });

    thread::sleep(Duration::from_millis(20));
    sender.stop();

    // The wait never hangs: it times out even though no completion arrives.
    assert!(waiter.join().unwrap().is_err());
}
