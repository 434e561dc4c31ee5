//! Rational frame rates.
//!
//! Broadcast rates are fractional (e.g. 30000/1001 for 29.97 fps), so the
//! rate is stored as a numerator/denominator pair and only converted to
//! floating point at the query surface.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Frame rate as a rational number (e.g., 60000/1001 for 59.94 fps).
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 60000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate. A zero denominator is clamped to 1.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator: if denominator == 0 { 1 } else { denominator },
        }
    }

    /// Frames per second as f64, for the caller-facing query surface.
    #[inline]
    pub fn fps(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// The rate as a reduced rational.
    #[inline]
    pub fn as_rational(self) -> Rational64 {
        Rational64::new(self.numerator as i64, self.denominator as i64)
    }

    /// Duration of a single frame.
    pub fn frame_interval(self) -> Duration {
        let interval = Rational64::new(self.denominator as i64, self.numerator as i64);
        let nanos = interval * 1_000_000_000;
        Duration::from_nanos((*nanos.numer() / *nanos.denom()) as u64)
    }

    /// Common broadcast frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl PartialEq for FrameRate {
    fn eq(&self, other: &Self) -> bool {
        // Compare in reduced form so 30/1 == 60/2.
        self.as_rational() == other.as_rational()
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_59_94
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.fps();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.2} fps", fps)
        }
    }
}
