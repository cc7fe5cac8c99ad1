//! Borrowed view over a captured RGBA8 frame.

use crate::{CoreError, Result};

/// Bytes per pixel of the fixed RGBA8 layout
pub const BYTES_PER_PIXEL: usize = 4;

/// A read-only captured frame.
///
/// The pixel data is owned by the frame source and only valid for the
/// duration of the callback that hands it out, hence the borrow.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    row_stride: usize,
    pixel_stride: usize,
}

impl<'a> FrameBuffer<'a> {
    /// Wrap raw pixel data.
    ///
    /// Fails if the strides cannot hold an RGBA8 pixel or the buffer is too
    /// short for the declared geometry.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        row_stride: usize,
        pixel_stride: usize,
    ) -> Result<Self> {
        if pixel_stride < BYTES_PER_PIXEL {
            return Err(CoreError::InvalidFrame(format!(
                "pixel stride {} is smaller than {} bytes",
                pixel_stride, BYTES_PER_PIXEL
            )));
        }
        if width > 0 && row_stride < width as usize * pixel_stride {
            return Err(CoreError::InvalidFrame(format!(
                "row stride {} cannot hold {} pixels of {} bytes",
                row_stride, width, pixel_stride
            )));
        }
        if width > 0 && height > 0 {
            let required = (height as usize - 1) * row_stride
                + (width as usize - 1) * pixel_stride
                + BYTES_PER_PIXEL;
            if data.len() < required {
                return Err(CoreError::InvalidFrame(format!(
                    "buffer holds {} bytes, geometry {}x{} needs {}",
                    data.len(),
                    width,
                    height,
                    required
                )));
            }
        }
        Ok(Self {
            data,
            width,
            height,
            row_stride,
            pixel_stride,
        })
    }

    /// Wrap tightly packed RGBA8 data
    pub fn packed(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        Self::new(
            data,
            width,
            height,
            width as usize * BYTES_PER_PIXEL,
            BYTES_PER_PIXEL,
        )
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the start of two rows
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Bytes between the start of two pixels
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// True when the frame has no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB channels of the pixel at `(x, y)`, alpha is ignored
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.row_stride + x as usize * self.pixel_stride;
        let px = self.data.get(offset..offset + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// An owned, tightly packed RGBA8 image.
///
/// Used for resampled capture grids and by synthetic frame sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA8 pixel data, row-major
    pub data: Vec<u8>,
}

impl OwnedFrame {
    /// A frame filled with one color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Set one pixel, out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[offset..offset + 3].copy_from_slice(&rgb);
        self.data[offset + 3] = 255;
    }

    /// Borrow as a [`FrameBuffer`]
    pub fn as_buffer(&self) -> FrameBuffer<'_> {
        FrameBuffer {
            data: &self.data,
            width: self.width,
            height: self.height,
            row_stride: self.width as usize * BYTES_PER_PIXEL,
            pixel_stride: BYTES_PER_PIXEL,
        }
    }

    /// Nearest-neighbour resample of `frame` onto a `width`x`height` grid
    pub fn resampled(frame: &FrameBuffer<'_>, width: u32, height: u32) -> Self {
        let mut out = Self::filled(width, height, [0, 0, 0]);
        if frame.is_empty() {
            return out;
        }
        for y in 0..height {
            let src_y = ((y as u64 * frame.height() as u64) / height as u64) as u32;
            for x in 0..width {
                let src_x = ((x as u64 * frame.width() as u64) / width as u64) as u32;
                if let Some(rgb) = frame.pixel(src_x, src_y) {
                    out.set_pixel(x, y, rgb);
                }
            }
        }
        out
    }
}
