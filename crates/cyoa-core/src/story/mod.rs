//! Story loading and card lookup
//!
//! A story is an ordered list of cards. Order only matters for auto-advance
//! (which moves to the next card in the file); choices jump by `card_id`.
//! The list is immutable once loaded.

mod card;

pub use card::*;

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{info, warn};

use crate::assets::AssetSource;
use crate::error::StoryError;

/// A loaded story with a precomputed `card_id` → position map.
#[derive(Debug, Clone)]
pub struct Story {
    cards: Vec<Card>,
    index: BTreeMap<String, usize>,
}

impl Story {
    /// Build a story from cards already in memory.
    ///
    /// When two cards share an id the first one wins, matching what a linear
    /// scan would find.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let mut index = BTreeMap::new();
        for (position, card) in cards.iter().enumerate() {
            if index.contains_key(&card.card_id) {
                warn!(
                    "Duplicate card_id '{}' at position {}, keeping the first",
                    card.card_id, position
                );
            } else {
                index.insert(card.card_id.clone(), position);
            }
        }

        Self { cards, index }
    }

    /// Parse a story document: a JSON array of card objects.
    pub fn from_json(path: &str, bytes: &[u8]) -> Result<Self, StoryError> {
        let cards: Vec<Card> = serde_json::from_slice(bytes).map_err(|e| StoryError::Load {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        if cards.is_empty() {
            return Err(StoryError::Load {
                path: path.to_string(),
                reason: "story has no cards".to_string(),
            });
        }

        info!("Loaded story {} with {} cards", path, cards.len());
        Ok(Self::from_cards(cards))
    }

    /// Read and parse the story file from a story directory.
    pub fn load<S: AssetSource + ?Sized>(source: &mut S, path: &str) -> Result<Self, StoryError> {
        let bytes = source.read(path).map_err(|e| match e {
            StoryError::AssetLoad { reason, .. } => StoryError::Load {
                path: path.to_string(),
                reason,
            },
            other => other,
        })?;

        Self::from_json(path, &bytes)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Position of the card with the given id.
    pub fn find_index_by_id(&self, id: &str) -> Result<usize, StoryError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StoryError::UnresolvedReference(id.to_string()))
    }
}

/// Linear scan for the first card with the given id.
pub fn find_index_by_id(cards: &[Card], id: &str) -> Result<usize, StoryError> {
    cards
        .iter()
        .position(|card| card.card_id == id)
        .ok_or_else(|| StoryError::UnresolvedReference(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemorySource;

    const TWO_CARDS: &str = r#"[
        {"card_id": "home", "text": "Hi", "text_color": "0xFFFFFF",
         "button01_text": "Go", "button01_goto_card_id": "end"},
        {"card_id": "end", "auto_advance": "0"}
    ]"#;

    #[test]
    fn test_load_preserves_file_order() {
        let mut source = MemorySource::new().with_file("cyoa.json", TWO_CARDS);
        let story = Story::load(&mut source, "cyoa.json").unwrap();

        assert_eq!(story.len(), 2);
        assert_eq!(story.cards()[0].card_id, "home");
        assert_eq!(story.cards()[1].card_id, "end");
    }

    #[test]
    fn test_missing_story_file_is_load_error() {
        let mut source = MemorySource::new();
        let err = Story::load(&mut source, "cyoa.json").unwrap_err();
        assert!(matches!(err, StoryError::Load { ref path, .. } if path == "cyoa.json"));
    }

    #[test]
    fn test_malformed_story_is_load_error() {
        assert!(matches!(
            Story::from_json("cyoa.json", b"[{\"text\": \"no id\"}]"),
            Err(StoryError::Load { .. })
        ));
        assert!(matches!(
            Story::from_json("cyoa.json", b"[]"),
            Err(StoryError::Load { .. })
        ));
    }

    #[test]
    fn test_index_agrees_with_linear_scan() {
        let story = Story::from_json("cyoa.json", TWO_CARDS.as_bytes()).unwrap();
        for id in ["home", "end"] {
            assert_eq!(
                story.find_index_by_id(id).unwrap(),
                find_index_by_id(story.cards(), id).unwrap()
            );
        }
    }

    #[test]
    fn test_unknown_id_is_unresolved() {
        let story = Story::from_json("cyoa.json", TWO_CARDS.as_bytes()).unwrap();
        assert_eq!(
            story.find_index_by_id("attic"),
            Err(StoryError::UnresolvedReference("attic".into()))
        );
        assert_eq!(
            find_index_by_id(story.cards(), "attic"),
            Err(StoryError::UnresolvedReference("attic".into()))
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let story = Story::from_cards(alloc::vec![Card::new("a"), Card::new("b"), Card::new("a")]);
        assert_eq!(story.find_index_by_id("a").unwrap(), 0);
    }
}
