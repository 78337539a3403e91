//! Engine state: where in the story we are and what is on screen

extern crate alloc;

use alloc::string::String;
use heapless::Vec;

use crate::assets::Asset;
use crate::config::{EngineConfig, Region};
use crate::story::{Card, Choice, Choices};
use crate::surface::ButtonSpec;
use crate::ui::{TouchPoint, Touchable};

/// Where the engine is within the per-card cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePhase {
    /// Tearing down the previous card and composing this one
    Rendering(usize),
    /// Card is up, deciding how to leave it
    AwaitingAdvance(usize),
    /// Sleeping before moving to the next card in file order
    AutoAdvancing(usize),
    /// Polling touch until a button is hit
    AwaitingInput(usize),
    /// Looking up the chosen destination
    Resolving(String),
    /// Stopped on an error, fault screen shown
    Halted,
}

/// A button on screen and where it leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveButton {
    pub spec: ButtonSpec,
    pub goto: Option<String>,
}

impl ActiveButton {
    fn new(choice: Choice<'_>, region: Region) -> Self {
        Self {
            spec: ButtonSpec::new(choice.label, region.to_rectangle()),
            goto: choice.goto.map(String::from),
        }
    }
}

impl Touchable for ActiveButton {
    fn contains_point(&self, point: TouchPoint) -> bool {
        self.spec.contains_point(point)
    }
}

/// Buttons for `card` laid out per `config`: one centered, or button 1 on
/// the left and button 2 on the right.
pub fn layout_buttons(card: &Card, config: &EngineConfig) -> Vec<ActiveButton, 2> {
    match card.choices() {
        Choices::None => Vec::new(),
        Choices::Single(only) => [ActiveButton::new(only, config.center_button)]
            .into_iter()
            .collect(),
        Choices::Pair { left, right } => [
            ActiveButton::new(left, config.left_button),
            ActiveButton::new(right, config.right_button),
        ]
        .into_iter()
        .collect(),
    }
}

/// Everything the engine owns between cards.
///
/// At most one background and one sound handle are open at a time; the
/// engine drops the old one before opening the next.
#[derive(Debug)]
pub struct EngineState {
    pub card_index: usize,
    pub phase: EnginePhase,
    pub(crate) background: Option<Asset>,
    pub(crate) sound: Option<Asset>,
    pub(crate) buttons: Vec<ActiveButton, 2>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            card_index: 0,
            phase: EnginePhase::Rendering(0),
            background: None,
            sound: None,
            buttons: Vec::new(),
        }
    }
}

impl EngineState {
    pub fn background(&self) -> Option<&str> {
        self.background.as_ref().map(Asset::name)
    }

    pub fn sound(&self) -> Option<&str> {
        self.sound.as_ref().map(Asset::name)
    }

    pub fn buttons(&self) -> &[ActiveButton] {
        &self.buttons
    }

    /// The single button under `point`, if exactly one is.
    pub fn button_at(&self, point: TouchPoint) -> Option<&ActiveButton> {
        let mut hits = self.buttons.iter().filter(|b| b.contains_point(point));
        match (hits.next(), hits.next()) {
            (Some(button), None) => Some(button),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;

    fn card(json: &str) -> Card {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_single_button_is_centered() {
        let c = card(r#"{"card_id": "a", "button1_text": "Next", "button1_goto": "b"}"#);
        let buttons = layout_buttons(&c, &EngineConfig::default());

        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].spec.label, "Next");
        assert_eq!(
            buttons[0].spec.region,
            Rectangle::new(Point::new(100, 195), Size::new(120, 40))
        );
        assert_eq!(buttons[0].goto.as_deref(), Some("b"));
    }

    #[test]
    fn test_pair_is_left_then_right() {
        let c = card(
            r#"{"card_id": "a", "button1_text": "Left", "button1_goto": "l",
                "button2_text": "Right", "button2_goto": "r"}"#,
        );
        let buttons = layout_buttons(&c, &EngineConfig::default());

        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].spec.region.top_left, Point::new(10, 195));
        assert_eq!(buttons[0].goto.as_deref(), Some("l"));
        assert_eq!(buttons[1].spec.region.top_left, Point::new(190, 195));
        assert_eq!(buttons[1].goto.as_deref(), Some("r"));
    }

    #[test]
    fn test_button_at_requires_a_single_hit() {
        let c = card(
            r#"{"card_id": "a", "button1_text": "L", "button1_goto": "l",
                "button2_text": "R", "button2_goto": "r"}"#,
        );
        let mut state = EngineState {
            buttons: layout_buttons(&c, &EngineConfig::default()),
            ..Default::default()
        };

        assert_eq!(
            state.button_at(TouchPoint::new(20, 200)).and_then(|b| b.goto.as_deref()),
            Some("l")
        );
        assert_eq!(
            state.button_at(TouchPoint::new(300, 230)).and_then(|b| b.goto.as_deref()),
            Some("r")
        );
        // Gap between the two buttons
        assert!(state.button_at(TouchPoint::new(160, 210)).is_none());
        // Text area
        assert!(state.button_at(TouchPoint::new(20, 100)).is_none());

        // Overlapping regions are ambiguous
        let overlapping = EngineConfig {
            right_button: EngineConfig::default().left_button,
            ..Default::default()
        };
        state.buttons = layout_buttons(&c, &overlapping);
        assert!(state.button_at(TouchPoint::new(20, 200)).is_none());
    }
}
