//! Fault report screen
//!
//! Shown when the story cannot continue: a heading naming the kind of fault
//! and the wrapped error message underneath, centered on a black screen.

use embedded_graphics::{
    Drawable as EgDrawable,
    mono_font::MonoTextStyle,
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
    text::{Alignment, Text},
};

use crate::ui::core::Drawable;
use crate::ui::styling::{BODY_FONT, FAULT_TITLE, TITLE_FONT, WHITE};
use crate::wrap::wrap_text;

pub struct FaultScreen<'a> {
    bounds: Rectangle,
    title: &'a str,
    message: &'a str,
}

impl<'a> FaultScreen<'a> {
    pub fn new(bounds: Rectangle, title: &'a str, message: &'a str) -> Self {
        Self {
            bounds,
            title,
            message,
        }
    }
}

impl Drawable for FaultScreen<'_> {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(Rgb565::BLACK)?;

        let center = self.bounds.center();
        let title_height = TITLE_FONT.character_size.height as i32;
        let line_height = BODY_FONT.character_size.height as i32 + 2;

        // Heading one line-height above center
        Text::with_alignment(
            self.title,
            Point::new(center.x, center.y - title_height),
            MonoTextStyle::new(TITLE_FONT, FAULT_TITLE),
            Alignment::Center,
        )
        .draw(display)?;

        let max_chars = (self.bounds.size.width / BODY_FONT.character_size.width) as usize;
        let body_style = MonoTextStyle::new(BODY_FONT, WHITE);
        let mut y = center.y + line_height;
        for line in wrap_text(self.message, max_chars.saturating_sub(2)) {
            Text::with_alignment(&line, Point::new(center.x, y), body_style, Alignment::Center)
                .draw(display)?;
            y += line_height;
        }

        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }
}
