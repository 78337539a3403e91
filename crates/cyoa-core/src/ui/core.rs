//! Core UI traits and types shared by the card widgets

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A touch sample in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}

/// Anything the compositor can paint into a frame
pub trait Drawable {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error>;

    /// Area this element covers
    fn bounds(&self) -> Rectangle;
}

/// Elements with a touch hit region
pub trait Touchable {
    fn contains_point(&self, point: TouchPoint) -> bool;
}
