//! Shared framebuffer written by both pipelines.
//!
//! Holds a row-major color buffer and a parallel depth buffer initialized
//! to +infinity. Row 0 is the bottom row; the viewport mapping applies no
//! vertical flip, so callers that need a top-down image flip on read-out
//! (the PNG encoder does).

use crate::color::Color;
use crate::error::{Error, Result};

/// Framebuffer: width x height colors plus a depth plane.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    colors: Vec<Color>,
    depth: Vec<f32>,
}

impl Framebuffer {
    /// Create a framebuffer with every pixel black and every depth cell at
    /// +infinity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either dimension is zero and
    /// [`Error::OutOfMemory`] if the buffers cannot be allocated.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!(
                "framebuffer dimensions {width}x{height}"
            )));
        }

        let len = (width as usize) * (height as usize);

        let mut colors = Vec::new();
        colors
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory(format!("color buffer of {len} pixels")))?;
        colors.resize(len, Color::BLACK);

        let mut depth = Vec::new();
        depth
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory(format!("depth buffer of {len} cells")))?;
        depth.resize(len, f32::INFINITY);

        Ok(Self { width, height, colors, depth })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// The flat row-major color data.
    #[must_use]
    pub fn data(&self) -> &[Color] {
        &self.colors
    }

    /// Fill the color buffer with a solid color.
    pub fn clear_color(&mut self, color: Color) {
        self.colors.fill(color);
    }

    /// Reset every depth cell to +infinity.
    pub fn clear_depth(&mut self) {
        self.depth.fill(f32::INFINITY);
    }

    /// Write a pixel. Out-of-bounds coordinates are ignored; clipping
    /// against the viewport happens here and nowhere else.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.colors[idx] = color;
    }

    /// Depth-tested write: the pixel is kept only when `z` is not behind
    /// the stored depth, which then updates.
    pub fn set_pixel_depth(&mut self, x: u32, y: u32, z: f32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        if z <= self.depth[idx] {
            self.depth[idx] = z;
            self.colors[idx] = color;
        }
    }

    /// Color at a pixel, or `None` out of bounds.
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.colors[self.index(x, y)])
    }

    /// Stored depth at a pixel, or `None` out of bounds.
    #[must_use]
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[self.index(x, y)])
    }

    /// Pack the color buffer into tightly-packed 8-bit RGB rows, flipped
    /// to the top-down order image formats expect.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixel_count() * 3);
        for y in (0..self.height).rev() {
            let start = self.index(0, y);
            for color in &self.colors[start..start + self.width as usize] {
                out.extend_from_slice(&color.to_rgb8());
            }
        }
        out
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}
