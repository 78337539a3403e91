//! Layout and timing configuration for the card engine
//!
//! Defaults reproduce the 320x240 landscape layout the stories are authored
//! against. A story directory may ship a JSON override; any field it leaves out
//! keeps its default.

extern crate alloc;

use alloc::string::{String, ToString};
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use serde::{Deserialize, Serialize};

use crate::error::StoryError;

pub const DISPLAY_WIDTH_PX: u16 = 320;
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Name of the story file inside a story directory.
pub const STORY_FILE: &str = "cyoa.json";

/// What to do when an auto-advancing card is the last card of the story.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfStory {
    /// Stop with [`StoryError::EndOfStory`]
    #[default]
    Halt,
    /// Wrap around to the first card
    Restart,
}

/// Serializable rectangle, `x`/`y` top-left plus size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_rectangle(self) -> Rectangle {
        Rectangle::new(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub display_width: u16,
    pub display_height: u16,
    pub story_file: String,
    /// Top-left of the first text line
    pub text_origin: (i32, i32),
    /// Maximum characters per wrapped text line
    pub wrap_chars: usize,
    pub left_button: Region,
    pub right_button: Region,
    pub center_button: Region,
    /// Delay between 1% brightness steps
    pub fade_step_ms: u32,
    /// Sleep between touch samples while waiting for a choice
    pub touch_poll_ms: u32,
    /// Sleep between playback checks while a blocking sound plays
    pub sound_poll_ms: u32,
    pub end_of_story: EndOfStory,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_width: DISPLAY_WIDTH_PX,
            display_height: DISPLAY_HEIGHT_PX,
            story_file: STORY_FILE.to_string(),
            text_origin: (10, 100),
            wrap_chars: 37,
            left_button: Region::new(10, 195, 120, 40),
            right_button: Region::new(190, 195, 120, 40),
            center_button: Region::new(100, 195, 120, 40),
            fade_step_ms: 3,
            touch_poll_ms: 10,
            sound_poll_ms: 10,
            end_of_story: EndOfStory::Halt,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON override. `source` names the file for error reports.
    pub fn from_json(source: &str, bytes: &[u8]) -> Result<Self, StoryError> {
        serde_json::from_slice(bytes).map_err(|e| StoryError::Load {
            path: source.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn text_origin(&self) -> Point {
        Point::new(self.text_origin.0, self.text_origin.1)
    }
}
