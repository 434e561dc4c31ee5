//! Integration test crate for Framelink.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the core, driver, session and bridge crates to verify
//! the full capture and playback paths work together.

#[cfg(test)]
mod bridge;

#[cfg(test)]
mod capture;

#[cfg(test)]
mod playback;

/// Install a test subscriber so `RUST_LOG` surfaces session tracing.
#[cfg(test)]
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
