//! A single card of a story and the typed views the engine reads from it
//!
//! Story files are exported from spreadsheets, so field presence matters more
//! than field type: empty strings count as absent, ids may arrive as numbers,
//! and flags may arrive as `"True"`. Loosely typed values are kept as
//! [`FieldValue`] until the engine asks for them, which is where a wrong kind
//! is rejected.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use core::time::Duration;
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use serde::{Deserialize, Deserializer};

use crate::error::StoryError;

/// A JSON scalar as it appeared in the story file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Render the value the way an author would have typed it.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) if (*n as i64) as f64 == *n => format!("{}", *n as i64),
            FieldValue::Number(n) => format!("{}", n),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Interpret the value as a boolean flag.
    pub fn as_flag(&self, key: &'static str) -> Result<bool, StoryError> {
        match self {
            FieldValue::Bool(b) => Ok(*b),
            FieldValue::Text(s) if s == "True" || s == "true" => Ok(true),
            FieldValue::Text(s) if s == "False" || s == "false" => Ok(false),
            other => Err(StoryError::InvalidConfiguration {
                key,
                expected: "a boolean",
                value: other.to_text(),
            }),
        }
    }

    /// Interpret the value as a non-negative number of seconds.
    pub fn as_seconds(&self, key: &'static str) -> Result<Duration, StoryError> {
        let secs = match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Bool(_) => None,
        };

        secs.and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| StoryError::InvalidConfiguration {
                key,
                expected: "a number of seconds",
                value: self.to_text(),
            })
    }
}

/// One node of the story graph.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Card {
    #[serde(deserialize_with = "required_text")]
    pub card_id: String,

    #[serde(default, deserialize_with = "optional_text")]
    pub text: Option<String>,

    /// Parsed colour; unparseable values become black, absence stays `None`
    #[serde(default, deserialize_with = "optional_color")]
    pub text_color: Option<Rgb565>,

    #[serde(default, deserialize_with = "optional_text")]
    pub background_image: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub sound: Option<String>,

    #[serde(default)]
    pub sound_repeat: Option<FieldValue>,

    #[serde(default, alias = "button01_text", deserialize_with = "optional_text")]
    pub button1_text: Option<String>,

    #[serde(
        default,
        alias = "button01_goto_card_id",
        deserialize_with = "optional_text"
    )]
    pub button1_goto: Option<String>,

    #[serde(default, alias = "button02_text", deserialize_with = "optional_text")]
    pub button2_text: Option<String>,

    #[serde(
        default,
        alias = "button02_goto_card_id",
        deserialize_with = "optional_text"
    )]
    pub button2_goto: Option<String>,

    #[serde(default)]
    pub auto_advance: Option<FieldValue>,
}

/// A visible choice: its label and the card id it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<'a> {
    pub label: &'a str,
    pub goto: Option<&'a str>,
}

/// The button arrangement a card asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choices<'a> {
    None,
    /// One centered button
    Single(Choice<'a>),
    /// Two buttons, `left` is button 1 and `right` is button 2
    Pair { left: Choice<'a>, right: Choice<'a> },
}

impl Card {
    pub fn new(card_id: &str) -> Self {
        Self {
            card_id: card_id.to_string(),
            ..Default::default()
        }
    }

    /// Which buttons to show. A card that only fills in button 2 gets it as
    /// a single centered button.
    pub fn choices(&self) -> Choices<'_> {
        let first = self.button1_text.as_deref().map(|label| Choice {
            label,
            goto: self.button1_goto.as_deref(),
        });
        let second = self.button2_text.as_deref().map(|label| Choice {
            label,
            goto: self.button2_goto.as_deref(),
        });

        match (first, second) {
            (None, None) => Choices::None,
            (Some(only), None) | (None, Some(only)) => Choices::Single(only),
            (Some(left), Some(right)) => Choices::Pair { left, right },
        }
    }

    /// Text and colour, only when both are present.
    pub fn styled_text(&self) -> Option<(&str, Rgb565)> {
        match (self.text.as_deref(), self.text_color) {
            (Some(text), Some(color)) => Some((text, color)),
            _ => None,
        }
    }

    pub fn sound_repeat(&self) -> Result<bool, StoryError> {
        self.sound_repeat
            .as_ref()
            .map_or(Ok(false), |v| v.as_flag("sound_repeat"))
    }

    pub fn auto_advance(&self) -> Result<Option<Duration>, StoryError> {
        self.auto_advance
            .as_ref()
            .map(|v| v.as_seconds("auto_advance"))
            .transpose()
    }
}

/// Parse `0xRRGGBB`, `#RRGGBB`, a decimal string or a JSON number.
/// Anything else is black.
pub fn parse_text_color(value: &FieldValue) -> Rgb565 {
    let rgb = match value {
        FieldValue::Number(n) if *n >= 0.0 && (*n as u32) as f64 == *n => Some(*n as u32),
        FieldValue::Text(s) => {
            let s = s.trim();
            match s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .or_else(|| s.strip_prefix('#'))
            {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => s.parse::<u32>().ok(),
            }
        }
        _ => None,
    };

    match rgb {
        Some(rgb) if rgb <= 0xFF_FFFF => {
            Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8).into()
        }
        _ => Rgb565::BLACK,
    }
}

fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(FieldValue::deserialize(deserializer)?.to_text())
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_text()).filter(|s| !s.is_empty()))
}

fn optional_color<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Rgb565>, D::Error> {
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !matches!(v, FieldValue::Text(s) if s.is_empty()))
        .map(|v| parse_text_color(&v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(json: &str) -> Card {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_zero_padded_field_names_are_accepted() {
        let c = card(
            r#"{"card_id": "start", "button01_text": "Go", "button01_goto_card_id": "hall",
                "button02_text": "Stay", "button02_goto_card_id": "start"}"#,
        );
        assert_eq!(c.button1_text.as_deref(), Some("Go"));
        assert_eq!(c.button1_goto.as_deref(), Some("hall"));
        assert_eq!(c.button2_goto.as_deref(), Some("start"));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let c = card(r#"{"card_id": "a", "text": "", "sound": "", "button01_text": ""}"#);
        assert_eq!(c.text, None);
        assert_eq!(c.sound, None);
        assert_eq!(c.choices(), Choices::None);
    }

    #[test]
    fn test_numeric_card_id() {
        assert_eq!(card(r#"{"card_id": 7}"#).card_id, "7");
    }

    #[test]
    fn test_single_button_maps_to_button1_goto() {
        let c = card(r#"{"card_id": "a", "button1_text": "Next", "button1_goto": "b"}"#);
        assert_eq!(
            c.choices(),
            Choices::Single(Choice {
                label: "Next",
                goto: Some("b")
            })
        );
    }

    #[test]
    fn test_two_buttons_map_left_and_right() {
        let c = card(
            r#"{"card_id": "a", "button1_text": "L", "button1_goto": "x",
                "button2_text": "R", "button2_goto": "y"}"#,
        );
        match c.choices() {
            Choices::Pair { left, right } => {
                assert_eq!((left.label, left.goto), ("L", Some("x")));
                assert_eq!((right.label, right.goto), ("R", Some("y")));
            }
            other => panic!("expected two buttons, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_second_button_is_centered() {
        let c = card(r#"{"card_id": "a", "button2_text": "On", "button2_goto": "z"}"#);
        assert_eq!(
            c.choices(),
            Choices::Single(Choice {
                label: "On",
                goto: Some("z")
            })
        );
    }

    #[test]
    fn test_text_color_formats() {
        let red: Rgb565 = Rgb888::new(0xFF, 0, 0).into();
        assert_eq!(parse_text_color(&FieldValue::Text("0xFF0000".into())), red);
        assert_eq!(parse_text_color(&FieldValue::Text("#ff0000".into())), red);
        assert_eq!(parse_text_color(&FieldValue::Text("16711680".into())), red);
        assert_eq!(parse_text_color(&FieldValue::Number(16711680.0)), red);
        assert_eq!(
            parse_text_color(&FieldValue::Text("crimson".into())),
            Rgb565::BLACK
        );
    }

    #[test]
    fn test_text_needs_color_to_show() {
        let c = card(r#"{"card_id": "a", "text": "Hello"}"#);
        assert_eq!(c.styled_text(), None);

        let c = card(r#"{"card_id": "a", "text": "Hello", "text_color": "bogus"}"#);
        assert_eq!(c.styled_text(), Some(("Hello", Rgb565::BLACK)));
    }

    #[test]
    fn test_sound_repeat_flag() {
        assert!(card(r#"{"card_id": "a", "sound_repeat": "True"}"#).sound_repeat().unwrap());
        assert!(!card(r#"{"card_id": "a", "sound_repeat": false}"#).sound_repeat().unwrap());
        assert!(!card(r#"{"card_id": "a"}"#).sound_repeat().unwrap());

        let err = card(r#"{"card_id": "a", "sound_repeat": "yes"}"#)
            .sound_repeat()
            .unwrap_err();
        assert!(matches!(
            err,
            StoryError::InvalidConfiguration { key: "sound_repeat", ref value, .. } if value == "yes"
        ));
    }

    #[test]
    fn test_auto_advance_seconds() {
        let c = card(r#"{"card_id": "a", "auto_advance": "2.5"}"#);
        assert_eq!(c.auto_advance().unwrap(), Some(Duration::from_millis(2500)));

        let c = card(r#"{"card_id": "a", "auto_advance": 0}"#);
        assert_eq!(c.auto_advance().unwrap(), Some(Duration::ZERO));

        let c = card(r#"{"card_id": "a", "auto_advance": "soon"}"#);
        assert!(c.auto_advance().is_err());
    }

    #[test]
    fn test_auto_advance_out_of_range_is_invalid() {
        for json in [
            r#"{"card_id": "a", "auto_advance": 1e20}"#,
            r#"{"card_id": "a", "auto_advance": "1e300"}"#,
            r#"{"card_id": "a", "auto_advance": -1}"#,
            r#"{"card_id": "a", "auto_advance": "NaN"}"#,
        ] {
            assert!(
                matches!(
                    card(json).auto_advance(),
                    Err(StoryError::InvalidConfiguration { key: "auto_advance", .. })
                ),
                "{}",
                json
            );
        }
    }
}
