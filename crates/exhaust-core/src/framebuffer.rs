//! RAM-backed 1-bit framebuffer with per-pixel change detection.
//!
//! States draw into this buffer instead of the panel. After drawing
//! completes, only the rectangular region containing changed pixels is
//! flushed to the hardware display in a single transfer.

use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};
use log::debug;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, Surface};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Bytes per row, one bit per pixel.
const STRIDE: usize = WIDTH.div_ceil(8);

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// 128x64 monochrome framebuffer implementing `DrawTarget<Color = BinaryColor>`.
///
/// 1 KiB of packed pixels plus a dirty bounding box, so it fits in static RAM
/// on the target. Also serves as the [`Surface`] for host tests.
pub struct FrameBuffer {
    pixels: [u8; STRIDE * HEIGHT],
    dirty: Option<DirtyRect>,
    frames_presented: u32,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Create a framebuffer with every pixel off.
    pub const fn new() -> Self {
        Self {
            pixels: [0; STRIDE * HEIGHT],
            dirty: None,
            frames_presented: 0,
        }
    }

    #[inline]
    fn index(x: usize, y: usize) -> (usize, u8) {
        (y * STRIDE + x / 8, 0x80 >> (x % 8))
    }

    /// Write a single pixel, expanding the dirty rect only if it changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (idx, mask) = Self::index(x, y);
        let was_on = self.pixels[idx] & mask != 0;
        if was_on == color.is_on() {
            return;
        }
        if color.is_on() {
            self.pixels[idx] |= mask;
        } else {
            self.pixels[idx] &= !mask;
        }
        match &mut self.dirty {
            Some(rect) => rect.expand(x, y),
            None => self.dirty = Some(DirtyRect::from_point(x, y)),
        }
    }

    /// Whether the pixel at (`x`, `y`) is lit. Out-of-range reads as off.
    pub fn is_lit(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return false;
        }
        let (idx, mask) = Self::index(x as usize, y as usize);
        self.pixels[idx] & mask != 0
    }

    /// Number of lit pixels inside `area`.
    pub fn count_lit(&self, area: Rectangle) -> usize {
        area.points().filter(|p| self.is_lit(p.x, p.y)).count()
    }

    /// Region changed since the last flush, if any.
    pub fn dirty_region(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    /// Number of frames handed to [`Surface::present`].
    pub fn frames_presented(&self) -> u32 {
        self.frames_presented
    }

    /// Flush the dirty region to a hardware display, then reset the dirty state.
    ///
    /// Only the bounding rectangle of changed pixels is transferred via
    /// `fill_contiguous`. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let area = rect.to_rectangle();
        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, rect.min_x, rect.min_y
        );

        let pixels = &self.pixels;
        let colors = (rect.min_y..=rect.max_y).flat_map(move |y| {
            (rect.min_x..=rect.max_x).map(move |x| {
                let (idx, mask) = Self::index(x, y);
                BinaryColor::from(pixels[idx] & mask != 0)
            })
        });

        display.fill_contiguous(&area, colors)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

impl Surface for FrameBuffer {
    fn present(&mut self) -> Result<(), Self::Error> {
        self.frames_presented = self.frames_presented.wrapping_add(1);
        Ok(())
    }
}
