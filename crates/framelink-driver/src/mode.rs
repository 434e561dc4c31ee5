//! Display mode descriptions.

use framelink_core::{FrameRate, PixelFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A video mode a device can capture or play back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    /// Human-readable mode name (e.g. "1080i59.94").
    pub name: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Wire pixel format.
    pub pixel_format: PixelFormat,
    /// Frame rate (fields are paired into frames for interlaced modes).
    pub frame_rate: FrameRate,
    /// Progressive scan; false for interlaced modes.
    pub progressive: bool,
}

impl DisplayMode {
    /// Byte size of one full frame in this mode.
    pub fn frame_size(&self) -> usize {
        self.pixel_format.frame_size(self.width, self.height)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x{} @ {})", self.name, self.width, self.height, self.frame_rate)
    }
}

fn mode(
    name: &str,
    width: u32,
    height: u32,
    frame_rate: FrameRate,
    progressive: bool,
) -> DisplayMode {
    DisplayMode {
        name: name.to_string(),
        width,
        height,
        pixel_format: PixelFormat::Uyvy,
        frame_rate,
        progressive,
    }
}

/// The broadcast modes every supported device offers.
pub fn standard_modes() -> Vec<DisplayMode> {
    vec![
        mode("NTSC", 720, 486, FrameRate::FPS_29_97, false),
        mode("PAL", 720, 576, FrameRate::FPS_25, false),
        mode("720p59.94", 1280, 720, FrameRate::FPS_59_94, true),
        mode("1080i59.94", 1920, 1080, FrameRate::FPS_29_97, false),
        mode("1080p24", 1920, 1080, FrameRate::FPS_24, true),
        mode("1080p25", 1920, 1080, FrameRate::FPS_25, true),
        mode("1080p30", 1920, 1080, FrameRate::FPS_30, true),
        mode("2160p30", 3840, 2160, FrameRate::FPS_30, true),
    ]
}
