//! Frame buffer types for uncompressed video frames in CPU memory.
//!
//! A [`FrameBuffer`] is a fixed-size owned pixel block plus metadata. Once a
//! buffer is handed to the frame queue it is shared as an [`Arc`] and never
//! mutated again, so the pixel pointer stays stable for the life of the Arc.

use crate::error::{FramelinkError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel format enumeration. Packed formats only; the capture hardware
/// delivers single-plane frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit 4:2:2 YUV, UYVY byte order (SDI wire format, 16 bits per pixel)
    #[default]
    Uyvy,
    /// 8-bit BGRA (32 bits per pixel)
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Uyvy => 2,
            Self::Bgra8 => 4,
        }
    }

    /// Total bytes needed for a frame of this format.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

/// An uncompressed video frame in CPU memory.
///
/// Invariant: `data.len() == width * height * bytes_per_pixel`, enforced by
/// every constructor and never violated afterwards (the pixel data is not
/// publicly mutable).
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    sequence: u64,
}

impl FrameBuffer {
    /// Create a zero-filled frame buffer with the given dimensions.
    pub fn new(width: u32, height: u32, format: PixelFormat, sequence: u64) -> Self {
        let bytes_per_pixel = format.bytes_per_pixel();
        Self {
            data: vec![0u8; format.frame_size(width, height)],
            width,
            height,
            bytes_per_pixel,
            sequence,
        }
    }

    /// Take ownership of an existing pixel block.
    ///
    /// Fails with [`FramelinkError::FrameSizeMismatch`] when the block does
    /// not match the stated dimensions.
    pub fn from_pixels(
        data: Vec<u8>,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
        sequence: u64,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * bytes_per_pixel;
        if data.len() != expected {
            return Err(FramelinkError::FrameSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            bytes_per_pixel,
            sequence,
        })
    }

    /// Copy caller-owned pixels into a new frame buffer.
    ///
    /// The caller's slice is not retained beyond this call.
    pub fn copy_from_slice(
        pixels: &[u8],
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
        sequence: u64,
    ) -> Result<Self> {
        Self::from_pixels(pixels.to_vec(), width, height, bytes_per_pixel, sequence)
    }

    /// Pixel data, read-only.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Stable pointer to the first pixel byte.
    ///
    /// Valid for as long as this buffer (or any `Arc` clone of it) is alive.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Total size of the pixel block in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Monotonic sequence number assigned by the producer.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Create a test pattern frame (eight vertical color bars).
    pub fn test_pattern(width: u32, height: u32, format: PixelFormat, sequence: u64) -> Self {
        let mut frame = Self::new(width, height, format, sequence);
        let bpp = frame.bytes_per_pixel;
        for y in 0..height as usize {
            let row_start = y * width as usize * bpp;
            for x in 0..width as usize {
                let bar = (x * 8 / width as usize) as u8;
                let i = row_start + x * bpp;
                match format {
                    PixelFormat::Bgra8 => {
                        let colors: [[u8; 4]; 8] = [
                            [255, 255, 255, 255], // White
                            [0, 255, 255, 255],   // Yellow
                            [255, 255, 0, 255],   // Cyan
                            [0, 255, 0, 255],     // Green
                            [255, 0, 255, 255],   // Magenta
                            [0, 0, 255, 255],     // Red
                            [255, 0, 0, 255],     // Blue
                            [0, 0, 0, 255],       // Black
                        ];
                        frame.data[i..i + 4].copy_from_slice(&colors[bar as usize]);
                    }
                    PixelFormat::Uyvy => {
                        // Luma steps down across the bars, chroma neutral.
                        let luma = 235 - bar * 27;
                        frame.data[i] = 128;
                        frame.data[i + 1] = luma;
                    }
                }
            }
        }
        frame
    }
}

/// Arc-wrapped frame buffer for shared ownership across threads.
pub type SharedFrameBuffer = Arc<FrameBuffer>;
