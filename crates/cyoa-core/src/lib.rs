//! Hardware-independent core of the cyoa story player
//!
//! A story is a JSON list of cards; each card shows a background, some text,
//! up to two choice buttons and optionally plays a sound. This crate holds the
//! card engine and everything it drives: story loading, the layered display
//! compositor, speaker-gated audio, touch sampling and SD-card asset access.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod assets;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod fade;
pub mod framebuffer;
pub mod storage;
pub mod story;
pub mod surface;
pub mod testing;
pub mod touch;
pub mod ui;
pub mod wrap;

pub use assets::{Asset, AssetSource, MemorySource};
pub use config::EngineConfig;
pub use engine::StoryEngine;
pub use error::StoryError;
pub use story::{Card, Story};
