//! Error taxonomy for the story player
//!
//! Every variant is fatal for the current story session. The engine never
//! retries; content integrity is expected to be checked by authoring tools,
//! so the device halts and reports instead of guessing a recovery path.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use core::fmt::Debug;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoryError {
    /// Story file missing, unreadable, malformed or empty
    #[error("could not load story file '{path}': {reason}")]
    Load { path: String, reason: String },

    /// Background image or sound referenced by a card is missing or undecodable
    #[error("could not load asset '{name}': {reason}")]
    AssetLoad { name: String, reason: String },

    /// A `goto` names a card id that does not exist in the story
    #[error("no card with card_id '{0}'")]
    UnresolvedReference(String),

    /// A typed card setting was given a value of the wrong kind
    #[error("setting '{key}' expects {expected}, got '{value}'")]
    InvalidConfiguration {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    /// Auto-advance walked past the last card
    #[error("card {index} is the last card, nothing to advance to")]
    EndOfStory { index: usize },

    /// A display, backlight, bus or pin collaborator failed
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl StoryError {
    /// Wrap a collaborator error that only offers `Debug`.
    pub fn hardware<E: Debug>(err: E) -> Self {
        Self::Hardware(format!("{:?}", err))
    }

    pub(crate) fn asset(name: &str, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Short title for the fault screen.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Load { .. } => "Story Load Failed",
            Self::AssetLoad { .. } => "Missing Asset",
            Self::UnresolvedReference(_) => "Broken Story Link",
            Self::InvalidConfiguration { .. } => "Invalid Card Setting",
            Self::EndOfStory { .. } => "End Of Story",
            Self::Hardware(_) => "Hardware Fault",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_unresolved_reference_names_the_id() {
        let err = StoryError::UnresolvedReference("cellar".into());
        assert_eq!(err.to_string(), "no card with card_id 'cellar'");
        assert_eq!(err.title(), "Broken Story Link");
    }

    #[test]
    fn test_hardware_wraps_debug_output() {
        #[derive(Debug)]
        struct BusFault;
        assert_eq!(
            StoryError::hardware(BusFault),
            StoryError::Hardware("BusFault".into())
        );
    }
}
