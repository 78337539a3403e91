//! Test doubles for running the engine without hardware.
//!
//! - [`RecordingSurface`], [`RecordingAudio`], [`ScriptedTouch`] and
//!   [`FakeDelay`] stand in for the engine's collaborators. They can share a
//!   [`Journal`] so a test can assert on the order of everything the engine
//!   did.
//! - [`RecordingPanel`], [`RecordingBacklight`], [`FakeOutput`], [`FakePin`]
//!   and [`FakeI2c`] sit one layer lower, under the compositor, the gated
//!   audio channel and the touch reader.
//! - [`solid_bmp`] and [`pcm_wav`] build minimal asset files.
//!
//! Every fake is cheap to clone and clones share state, so a test can hand
//! one copy to the engine and keep another to inspect.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, Operation};

use crate::assets::Asset;
use crate::audio::{AudioChannel, AudioOutput, WavInfo};
use crate::error::StoryError;
use crate::surface::{Backlight, ButtonSpec, Panel, PresentationSurface};
use crate::touch::TouchInput;
use crate::ui::{TextBlock, TouchPoint};

/// Something a collaborator was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Background(Option<String>),
    Text(Option<Vec<String>>),
    Buttons(Vec<ButtonSpec>),
    Brightness(f32),
    Refresh,
    Fault(String),
    Play {
        name: String,
        looping: bool,
        blocking: bool,
    },
    Stop,
    Touch(TouchPoint),
    Sleep(u32),
}

/// Shared, ordered log of [`Event`]s.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Events without the individual fade steps and sleeps.
    pub fn milestones(&self) -> Vec<Event> {
        self.0
            .borrow()
            .iter()
            .filter(|e| !matches!(e, Event::Brightness(_) | Event::Sleep(_)))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// =============================================================================
// Engine-level fakes
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    journal: Journal,
    brightness: Rc<Cell<f32>>,
}

impl RecordingSurface {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            brightness: Rc::default(),
        }
    }

    pub fn with_brightness(level: f32) -> Self {
        let surface = Self::default();
        surface.brightness.set(level);
        surface
    }

    /// Every level passed to `set_brightness`, in order.
    pub fn brightness_history(&self) -> Vec<f32> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Brightness(level) => Some(level),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSurface for RecordingSurface {
    fn set_background(&mut self, image: Option<&Asset>) -> Result<(), StoryError> {
        self.journal
            .push(Event::Background(image.map(|a| a.name().to_string())));
        Ok(())
    }

    fn set_text(&mut self, text: Option<&TextBlock>) -> Result<(), StoryError> {
        self.journal
            .push(Event::Text(text.map(|block| block.lines.clone())));
        Ok(())
    }

    fn set_buttons(&mut self, buttons: &[ButtonSpec]) -> Result<(), StoryError> {
        self.journal.push(Event::Buttons(buttons.to_vec()));
        Ok(())
    }

    fn set_brightness(&mut self, level: f32) -> Result<(), StoryError> {
        self.brightness.set(level);
        self.journal.push(Event::Brightness(level));
        Ok(())
    }

    fn brightness(&self) -> f32 {
        self.brightness.get()
    }

    fn refresh_and_wait_for_frame(&mut self) -> Result<(), StoryError> {
        self.journal.push(Event::Refresh);
        Ok(())
    }

    fn show_fault(&mut self, title: &str, _message: &str) -> Result<(), StoryError> {
        self.brightness.set(1.0);
        self.journal.push(Event::Fault(title.to_string()));
        Ok(())
    }
}

/// Audio channel that records commands. Non-looping sounds are considered
/// finished as soon as a blocking `play` returns.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    journal: Journal,
    playing: Rc<Cell<bool>>,
}

impl RecordingAudio {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            playing: Rc::default(),
        }
    }
}

impl AudioChannel for RecordingAudio {
    fn play(&mut self, sound: &Asset, looping: bool, blocking: bool) -> Result<(), StoryError> {
        self.journal.push(Event::Play {
            name: sound.name().to_string(),
            looping,
            blocking,
        });
        self.playing.set(looping || !blocking);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StoryError> {
        self.journal.push(Event::Stop);
        self.playing.set(false);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.get()
    }
}

/// Touch input that replays a fixed script of samples.
///
/// Once the script runs out every poll fails, which ends an engine loop that
/// would otherwise wait for a touch forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTouch {
    journal: Journal,
    script: Rc<RefCell<VecDeque<Option<TouchPoint>>>>,
    polls: Rc<Cell<usize>>,
}

impl ScriptedTouch {
    pub fn new(journal: Journal, script: impl IntoIterator<Item = Option<TouchPoint>>) -> Self {
        Self {
            journal,
            script: Rc::new(RefCell::new(script.into_iter().collect())),
            polls: Rc::default(),
        }
    }

    /// Script of presses, one sample each.
    pub fn taps(journal: Journal, taps: &[(u16, u16)]) -> Self {
        Self::new(
            journal,
            taps.iter().map(|&(x, y)| Some(TouchPoint::new(x, y))),
        )
    }

    pub fn polls(&self) -> usize {
        self.polls.get()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl TouchInput for ScriptedTouch {
    fn poll_point(&mut self) -> Result<Option<TouchPoint>, StoryError> {
        self.polls.set(self.polls.get() + 1);
        let sample = self
            .script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| StoryError::Hardware("touch script exhausted".to_string()))?;
        if let Some(point) = sample {
            self.journal.push(Event::Touch(point));
        }
        Ok(sample)
    }
}

/// Delay that only advances a virtual clock.
///
/// Millisecond sleeps are journaled as [`Event::Sleep`] when a journal is
/// attached.
#[derive(Debug, Clone, Default)]
pub struct FakeDelay {
    elapsed_ns: Rc<Cell<u64>>,
    journal: Option<Journal>,
}

impl FakeDelay {
    pub fn new(journal: Journal) -> Self {
        Self {
            elapsed_ns: Rc::default(),
            journal: Some(journal),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns.get() / 1_000_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns
            .set(self.elapsed_ns.get() + ms as u64 * 1_000_000);
        if let Some(journal) = &self.journal {
            journal.push(Event::Sleep(ms));
        }
    }
}

// =============================================================================
// Hardware-level fakes
// =============================================================================

/// In-memory panel that keeps the last flushed pixels.
pub struct RecordingPanel {
    size: Size,
    pixels: Vec<Rgb565>,
    frames: usize,
}

impl RecordingPanel {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![Rgb565::BLACK; (size.width * size.height) as usize],
            frames: 0,
        }
    }

    /// Pixel at `point`; black outside the panel.
    pub fn pixel(&self, point: Point) -> Rgb565 {
        if self.bounding_box().contains(point) {
            self.pixels[point.y as usize * self.size.width as usize + point.x as usize]
        } else {
            Rgb565::BLACK
        }
    }

    pub fn frames_presented(&self) -> usize {
        self.frames
    }
}

impl OriginDimensions for RecordingPanel {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for RecordingPanel {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.pixels[point.y as usize * self.size.width as usize + point.x as usize] =
                    color;
            }
        }
        Ok(())
    }
}

impl Panel for RecordingPanel {
    fn wait_for_frame(&mut self) -> Result<(), StoryError> {
        self.frames += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBacklight {
    levels: Rc<RefCell<Vec<f32>>>,
}

impl RecordingBacklight {
    pub fn levels(&self) -> Vec<f32> {
        self.levels.borrow().clone()
    }
}

impl Backlight for RecordingBacklight {
    fn set_level(&mut self, level: f32) -> Result<(), StoryError> {
        self.levels.borrow_mut().push(level);
        Ok(())
    }
}

/// Audio sink that reports "playing" for a fixed number of polls.
#[derive(Debug, Default)]
pub struct FakeOutput {
    polls_left: Cell<u32>,
    finish_after: u32,
    started: usize,
    last_len: usize,
    looping: bool,
}

impl FakeOutput {
    pub fn finishing_after(polls: u32) -> Self {
        Self {
            finish_after: polls,
            ..Default::default()
        }
    }

    pub fn started(&self) -> usize {
        self.started
    }

    pub fn last_len(&self) -> usize {
        self.last_len
    }

    pub fn looping(&self) -> bool {
        self.looping
    }
}

impl AudioOutput for FakeOutput {
    type Error = Infallible;

    fn start(&mut self, samples: &[u8], _info: &WavInfo, looping: bool) -> Result<(), Infallible> {
        self.started += 1;
        self.last_len = samples.len();
        self.looping = looping;
        self.polls_left.set(self.finish_after);
        Ok(())
    }

    fn halt(&mut self) -> Result<(), Infallible> {
        self.polls_left.set(0);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.polls_left.get() {
            0 => false,
            u32::MAX => true,
            n => {
                self.polls_left.set(n - 1);
                true
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FakePin {
    high: bool,
}

impl FakePin {
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl PinErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

/// Register-file I2C device with an auto-incrementing register pointer.
pub struct FakeI2c {
    registers: [u8; 256],
    pointer: u8,
    fail: bool,
}

impl FakeI2c {
    pub fn with_registers(values: &[(u8, u8)]) -> Self {
        let mut registers = [0; 256];
        for &(reg, value) in values {
            registers[reg as usize] = value;
        }
        Self {
            registers,
            pointer: 0,
            fail: false,
        }
    }

    /// A bus where every transfer is NACKed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_registers(&[])
        }
    }
}

impl i2c::ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some(&reg) = bytes.first() {
                        self.pointer = reg;
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.registers[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Asset builders
// =============================================================================

/// An uncompressed 24-bit BMP filled with one `[r, g, b]` colour.
pub fn solid_bmp(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let row_len = (width * 3).div_ceil(4) * 4;
    let image_len = row_len * height;
    let pixel_offset = 14 + 40;

    let mut bmp = Vec::with_capacity((pixel_offset + image_len) as usize);
    bmp.extend_from_slice(b"BM");
    bmp.extend_from_slice(&(pixel_offset + image_len).to_le_bytes());
    bmp.extend_from_slice(&[0; 4]);
    bmp.extend_from_slice(&pixel_offset.to_le_bytes());

    bmp.extend_from_slice(&40u32.to_le_bytes());
    bmp.extend_from_slice(&(width as i32).to_le_bytes());
    bmp.extend_from_slice(&(height as i32).to_le_bytes());
    bmp.extend_from_slice(&1u16.to_le_bytes());
    bmp.extend_from_slice(&24u16.to_le_bytes());
    bmp.extend_from_slice(&0u32.to_le_bytes());
    bmp.extend_from_slice(&image_len.to_le_bytes());
    bmp.extend_from_slice(&2835u32.to_le_bytes());
    bmp.extend_from_slice(&2835u32.to_le_bytes());
    bmp.extend_from_slice(&0u32.to_le_bytes());
    bmp.extend_from_slice(&0u32.to_le_bytes());

    let [r, g, b] = rgb;
    for _ in 0..height {
        for _ in 0..width {
            bmp.extend_from_slice(&[b, g, r]);
        }
        bmp.resize(bmp.len() + (row_len - width * 3) as usize, 0);
    }
    bmp
}

/// A canonical 44-byte-header PCM WAV with `data_len` bytes of silence.
pub fn pcm_wav(sample_rate: u32, channels: u16, bits: u16, data_len: u32) -> Vec<u8> {
    // Wrapping, so deliberately broken headers can be built too
    let block_align = channels.wrapping_mul(bits.div_ceil(8));
    let byte_rate = sample_rate.wrapping_mul(block_align as u32);

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}
