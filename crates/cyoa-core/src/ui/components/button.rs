//! Choice button widget
//!
//! A rounded, drop-shadowed button with a centered label. The shadow is
//! drawn outside `bounds`, so hit testing on the same region ignores it.

extern crate alloc;

use alloc::string::String;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::ui::core::Drawable;
use crate::ui::styling::{
    BODY_FONT, BUTTON_FILL, BUTTON_LABEL, BUTTON_OUTLINE, BUTTON_RADIUS_PX, BUTTON_SHADOW,
    SHADOW_OFFSET_PX,
};

/// A labelled button occupying a fixed region of the screen
///
/// # Examples
/// ```ignore
/// let button = ChoiceButton::new(
///     Rectangle::new(Point::new(100, 195), Size::new(120, 40)),
///     "Open the door",
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceButton {
    bounds: Rectangle,
    label: String,
    border_radius: u32,
}

impl ChoiceButton {
    pub fn new(bounds: Rectangle, label: &str) -> Self {
        Self {
            bounds,
            label: label.into(),
            border_radius: BUTTON_RADIUS_PX,
        }
    }
}

impl Drawable for ChoiceButton {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let corners = Size::new(self.border_radius, self.border_radius);

        let shadow = self
            .bounds
            .translate(Point::new(SHADOW_OFFSET_PX, SHADOW_OFFSET_PX));
        RoundedRectangle::with_equal_corners(shadow, corners)
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(BUTTON_SHADOW)
                    .build(),
            )
            .draw(display)?;

        RoundedRectangle::with_equal_corners(self.bounds, corners)
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(BUTTON_FILL)
                    .stroke_color(BUTTON_OUTLINE)
                    .stroke_width(1)
                    .build(),
            )
            .draw(display)?;

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            &self.label,
            self.bounds.center(),
            MonoTextStyle::new(BODY_FONT, BUTTON_LABEL),
            text_style,
        )
        .draw(display)?;

        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }
}
