//! embedded-graphics implementation of [`PresentationSurface`]
//!
//! Layers are kept as data and composed into a [`FrameBuffer`] on refresh:
//! black fill, background bitmap at the origin, text, then buttons on top.
//! Backgrounds are BMP files decoded with `tinybmp`.

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;
use embedded_graphics::Drawable as _;
use embedded_graphics::image::Image;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};
use tinybmp::Bmp;

use super::{Backlight, ButtonSpec, Panel, PresentationSurface};
use crate::assets::Asset;
use crate::error::StoryError;
use crate::framebuffer::FrameBuffer;
use crate::ui::{ChoiceButton, Drawable, FaultScreen, MultiLineText, TextBlock};

pub struct Compositor<P, B> {
    panel: P,
    backlight: B,
    frame: FrameBuffer,
    bounds: Rectangle,
    background: Option<Vec<u8>>,
    text: Option<TextBlock>,
    buttons: Vec<ChoiceButton>,
    brightness: f32,
}

impl<P: Panel, B: Backlight> Compositor<P, B> {
    /// Wrap a panel and its backlight.
    ///
    /// Brightness is assumed to be 0 until the first [`set_brightness`]
    /// call; the engine fades in from there.
    ///
    /// [`set_brightness`]: PresentationSurface::set_brightness
    pub fn new(panel: P, backlight: B) -> Self {
        let bounds = panel.bounding_box();
        Self {
            panel,
            backlight,
            frame: FrameBuffer::new(bounds.size),
            bounds,
            background: None,
            text: None,
            buttons: Vec::new(),
            brightness: 0.0,
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn backlight(&self) -> &B {
        &self.backlight
    }

    fn compose(&mut self) -> Result<(), StoryError> {
        self.frame
            .clear(Rgb565::BLACK)
            .map_err(StoryError::hardware)?;

        if let Some(data) = &self.background {
            let bmp = Bmp::<Rgb565>::from_slice(data).map_err(StoryError::hardware)?;
            Image::new(&bmp, Point::zero())
                .draw(&mut self.frame)
                .map_err(StoryError::hardware)?;
        }

        if let Some(block) = &self.text {
            MultiLineText::new(block)
                .draw(&mut self.frame)
                .map_err(StoryError::hardware)?;
        }

        for button in &self.buttons {
            button.draw(&mut self.frame).map_err(StoryError::hardware)?;
        }

        Ok(())
    }

    fn present(&mut self) -> Result<(), StoryError> {
        self.frame
            .flush(&mut self.panel)
            .map_err(StoryError::hardware)?;
        self.panel.wait_for_frame()
    }
}

impl<P: Panel, B: Backlight> PresentationSurface for Compositor<P, B> {
    fn set_background(&mut self, image: Option<&Asset>) -> Result<(), StoryError> {
        self.background = match image {
            Some(asset) => {
                let bmp = Bmp::<Rgb565>::from_slice(asset.data())
                    .map_err(|e| StoryError::asset(asset.name(), format!("{:?}", e)))?;
                let size = bmp.bounding_box().size;
                if size.width > self.bounds.size.width || size.height > self.bounds.size.height {
                    warn!(
                        "Background {} is {}x{}, larger than the display; it will be cropped",
                        asset.name(),
                        size.width,
                        size.height
                    );
                }
                Some(asset.data().to_vec())
            }
            None => None,
        };
        Ok(())
    }

    fn set_text(&mut self, text: Option<&TextBlock>) -> Result<(), StoryError> {
        self.text = text.cloned();
        Ok(())
    }

    fn set_buttons(&mut self, buttons: &[ButtonSpec]) -> Result<(), StoryError> {
        self.buttons = buttons
            .iter()
            .map(|spec| ChoiceButton::new(spec.region, &spec.label))
            .collect();
        Ok(())
    }

    fn set_brightness(&mut self, level: f32) -> Result<(), StoryError> {
        let level = level.clamp(0.0, 1.0);
        self.backlight.set_level(level)?;
        self.brightness = level;
        Ok(())
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }

    fn refresh_and_wait_for_frame(&mut self) -> Result<(), StoryError> {
        self.compose()?;
        debug!(
            "Composed frame: background={} text={} buttons={}",
            self.background.is_some(),
            self.text.is_some(),
            self.buttons.len()
        );
        self.present()
    }

    fn show_fault(&mut self, title: &str, message: &str) -> Result<(), StoryError> {
        self.background = None;
        self.text = None;
        self.buttons.clear();

        FaultScreen::new(self.bounds, title, message)
            .draw(&mut self.frame)
            .map_err(StoryError::hardware)?;
        self.present()?;
        self.set_brightness(1.0)
    }
}
