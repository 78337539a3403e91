//! Colours and fonts used by the card widgets
//!
//! RGB565: red 5 bits, green 6 bits, blue 5 bits. To convert from 8-bit RGB
//! use R>>3, G>>2, B>>3.

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_7X13_BOLD, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;

/// Pure white - maximum brightness in RGB565
pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

/// Button face - light gray
pub const BUTTON_FILL: Rgb565 = Rgb565::new(214 >> 3, 214 >> 2, 214 >> 3);

/// Button outline - near black
pub const BUTTON_OUTLINE: Rgb565 = Rgb565::new(24 >> 3, 24 >> 2, 24 >> 3);

/// Drop shadow under buttons
pub const BUTTON_SHADOW: Rgb565 = Rgb565::new(64 >> 3, 64 >> 2, 64 >> 3);

/// Button label colour
pub const BUTTON_LABEL: Rgb565 = Rgb565::new(0, 0, 0);

/// Fault screen heading - muted red
pub const FAULT_TITLE: Rgb565 = Rgb565::new(220 >> 3, 80 >> 2, 80 >> 3);

/// Body font for card text and button labels
pub const BODY_FONT: &MonoFont<'static> = &FONT_7X13_BOLD;

/// Heading font for the fault screen
pub const TITLE_FONT: &MonoFont<'static> = &FONT_10X20;

/// Offset of the button drop shadow, in pixels
pub const SHADOW_OFFSET_PX: i32 = 2;

/// Corner radius of choice buttons
pub const BUTTON_RADIUS_PX: u32 = 8;
