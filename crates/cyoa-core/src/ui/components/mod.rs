//! UI components library

pub mod button;
pub mod text;

pub use button::ChoiceButton;
pub use text::{MultiLineText, TextBlock};
