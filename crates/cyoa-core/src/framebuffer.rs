//! RAM framebuffer with per-pixel change detection.
//!
//! The compositor draws every layer into this buffer. A refresh then flushes
//! only the rectangle that bounds changed pixels, so a card that keeps its
//! background costs a small transfer.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
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

/// Heap framebuffer implementing `DrawTarget<Color = Rgb565>`.
///
/// A fresh buffer is black and marked fully dirty, so the first flush paints
/// the whole panel.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb565>,
    dirty: Option<DirtyRect>,
}

impl FrameBuffer {
    pub fn new(size: Size) -> Self {
        let width = size.width as usize;
        let height = size.height as usize;
        let dirty = (width > 0 && height > 0).then(|| {
            let mut rect = DirtyRect::from_point(0, 0);
            rect.expand(width - 1, height - 1);
            rect
        });

        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width * height],
            dirty,
        }
    }

    /// Region a flush would send, if any pixel changed.
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.index(point.x, point.y).map(|idx| self.pixels[idx])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * self.width + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Send the dirty region to `display` and reset the dirty state.
    ///
    /// A no-op when nothing changed since the last flush.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
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
        let stride = self.width;
        let row_len = area.size.width as usize;
        let colors = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + row_len].iter().copied()
        });

        display.fill_contiguous(&area, colors)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if self.index(coord.x, coord.y).is_some() {
                self.set_pixel(coord.x as usize, coord.y as usize, color);
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
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Primitive, PrimitiveStyle};

    #[test]
    fn test_new_buffer_is_fully_dirty() {
        let fb = FrameBuffer::new(Size::new(320, 240));
        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::new(Point::zero(), Size::new(320, 240)))
        );
    }

    #[test]
    fn test_dirty_area_tracks_changed_pixels_only() {
        let mut fb = FrameBuffer::new(Size::new(32, 16));
        let mut sink = FrameBuffer::new(Size::new(32, 16));
        fb.flush(&mut sink).unwrap();
        assert_eq!(fb.dirty_area(), None);

        // Redrawing the same colour changes nothing
        fb.clear(Rgb565::BLACK).unwrap();
        assert_eq!(fb.dirty_area(), None);

        Rectangle::new(Point::new(4, 2), Size::new(3, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::new(Point::new(4, 2), Size::new(3, 5)))
        );

        fb.flush(&mut sink).unwrap();
        assert_eq!(sink.pixel(Point::new(5, 3)), Some(Rgb565::RED));
        assert_eq!(sink.pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_out_of_bounds_drawing_is_clipped() {
        let mut fb = FrameBuffer::new(Size::new(8, 8));
        fb.fill_solid(
            &Rectangle::new(Point::new(-4, 6), Size::new(20, 20)),
            Rgb565::GREEN,
        )
        .unwrap();
        assert_eq!(fb.pixel(Point::new(0, 7)), Some(Rgb565::GREEN));
        assert_eq!(fb.pixel(Point::new(0, 5)), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(Point::new(8, 7)), None);
    }
}
