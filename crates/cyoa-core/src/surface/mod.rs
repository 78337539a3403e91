//! What the engine draws on
//!
//! The engine never touches pixels. It hands a [`PresentationSurface`] whole
//! layers (background, text, buttons), a brightness level, and asks it to
//! present a frame. [`Compositor`] is the embedded-graphics implementation;
//! tests use a recording fake.

mod compositor;

pub use compositor::Compositor;

extern crate alloc;

use alloc::string::String;
use core::fmt::Debug;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;

use crate::assets::Asset;
use crate::error::StoryError;
use crate::ui::{TextBlock, TouchPoint, Touchable};

/// A visible button: label and the screen region that answers touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub label: String,
    pub region: Rectangle,
}

impl ButtonSpec {
    pub fn new(label: &str, region: Rectangle) -> Self {
        Self {
            label: label.into(),
            region,
        }
    }
}

impl Touchable for ButtonSpec {
    fn contains_point(&self, point: TouchPoint) -> bool {
        self.region.contains(point.to_point())
    }
}

/// Layered display with a dimmable backlight.
///
/// Layer setters only stage content; nothing is visible until
/// [`refresh_and_wait_for_frame`](Self::refresh_and_wait_for_frame).
/// Brightness changes take effect immediately.
pub trait PresentationSurface {
    /// Replace the background image. `None` clears it to black.
    fn set_background(&mut self, image: Option<&Asset>) -> Result<(), StoryError>;

    fn set_text(&mut self, text: Option<&TextBlock>) -> Result<(), StoryError>;

    /// Replace the whole button set. An empty slice removes every button.
    fn set_buttons(&mut self, buttons: &[ButtonSpec]) -> Result<(), StoryError>;

    /// Set the backlight, `0.0..=1.0`.
    fn set_brightness(&mut self, level: f32) -> Result<(), StoryError>;

    fn brightness(&self) -> f32;

    /// Compose the staged layers and block until the frame is on the glass.
    fn refresh_and_wait_for_frame(&mut self) -> Result<(), StoryError>;

    /// Replace everything with a fault report at full brightness.
    fn show_fault(&mut self, title: &str, message: &str) -> Result<(), StoryError>;
}

/// A display panel the compositor flushes frames to.
pub trait Panel: DrawTarget<Color = Rgb565, Error: Debug> {
    /// Block until the last flushed frame is presented.
    fn wait_for_frame(&mut self) -> Result<(), StoryError>;
}

/// PWM backlight or equivalent.
pub trait Backlight {
    fn set_level(&mut self, level: f32) -> Result<(), StoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_hit_region_excludes_the_shadow() {
        let button = ButtonSpec::new(
            "Next",
            Rectangle::new(Point::new(100, 195), Size::new(120, 40)),
        );
        assert!(button.contains_point(TouchPoint::new(100, 195)));
        assert!(button.contains_point(TouchPoint::new(219, 234)));
        assert!(!button.contains_point(TouchPoint::new(220, 200)));
        assert!(!button.contains_point(TouchPoint::new(150, 236)));
    }
}
