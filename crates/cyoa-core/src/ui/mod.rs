//! Widgets the compositor draws a card with
//!
//! - [`ChoiceButton`]: shadowed rounded button with a touch hit region
//! - [`MultiLineText`]: pre-wrapped card text
//! - [`FaultScreen`]: full-screen fault report

pub mod components;
pub mod core;
pub mod fault;
pub mod styling;

pub use components::{ChoiceButton, MultiLineText, TextBlock};
pub use core::{Drawable, TouchPoint, Touchable};
pub use fault::FaultScreen;
