//! Multi-line card text

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use crate::ui::core::Drawable;
use crate::ui::styling::BODY_FONT;

/// Pre-wrapped lines of text drawn top-down from an origin
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub color: Rgb565,
    /// Top-left of the first line
    pub origin: Point,
}

/// Renders a [`TextBlock`] with a fixed font and line spacing
pub struct MultiLineText<'a> {
    block: &'a TextBlock,
    font: &'static MonoFont<'static>,
    line_spacing: u32,
}

impl<'a> MultiLineText<'a> {
    pub fn new(block: &'a TextBlock) -> Self {
        Self {
            block,
            font: BODY_FONT,
            line_spacing: 2,
        }
    }

    fn line_height(&self) -> u32 {
        self.font.character_size.height + self.line_spacing
    }
}

impl Drawable for MultiLineText<'_> {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(self.font, self.block.color);
        let clip = display.bounding_box();
        let mut position = self.block.origin;

        for line in &self.block.lines {
            // Lines below the bottom edge are dropped
            if position.y >= clip.top_left.y + clip.size.height as i32 {
                break;
            }
            Text::with_baseline(line, position, style, Baseline::Top).draw(display)?;
            position.y += self.line_height() as i32;
        }

        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        let widest = self
            .block
            .lines
            .iter()
            .map(|l| l.chars().count() as u32)
            .max()
            .unwrap_or(0);
        Rectangle::new(
            self.block.origin,
            Size::new(
                widest * self.font.character_size.width,
                self.block.lines.len() as u32 * self.line_height(),
            ),
        )
    }
}
