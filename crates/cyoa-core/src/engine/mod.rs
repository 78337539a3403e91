//! The card engine
//!
//! [`StoryEngine`] shows one card per [`step`](StoryEngine::step):
//!
//! 1. fade to black and clear background, text and buttons
//! 2. lay out the card's buttons
//! 3. open and composite the background while the screen is dark
//! 4. fade up
//! 5. draw the word-wrapped text
//! 6. refresh and wait for the frame
//! 7. start the card's sound without blocking
//! 8. sleep for `auto_advance`, or poll touch until a button is hit
//! 9. stop the sound
//! 10. resolve the destination card
//!
//! Auto-advance moves to the next card in file order and ignores the
//! buttons. A choice jumps to its `goto` id, looked up at the moment of the
//! jump; an id with no card is fatal. [`run`](StoryEngine::run) repeats
//! steps until something fails, then stops the sound and puts the error on
//! screen.

mod state;

pub use state::{ActiveButton, EnginePhase, EngineState, layout_buttons};

extern crate alloc;

use alloc::string::{String, ToString};
use core::convert::Infallible;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::assets::AssetSource;
use crate::audio::AudioChannel;
use crate::config::{EndOfStory, EngineConfig};
use crate::error::StoryError;
use crate::fade::fade;
use crate::story::{Card, Story};
use crate::surface::{ButtonSpec, PresentationSurface};
use crate::touch::TouchInput;
use crate::ui::TextBlock;
use crate::wrap::wrap_text;

pub struct StoryEngine<'s, S, A, T, F, D> {
    story: &'s Story,
    surface: S,
    audio: A,
    touch: T,
    assets: F,
    delay: D,
    config: EngineConfig,
    state: EngineState,
}

impl<'s, S, A, T, F, D> StoryEngine<'s, S, A, T, F, D>
where
    S: PresentationSurface,
    A: AudioChannel,
    T: TouchInput,
    F: AssetSource,
    D: DelayNs,
{
    /// The engine starts on the first card in file order.
    pub fn new(
        story: &'s Story,
        surface: S,
        audio: A,
        touch: T,
        assets: F,
        delay: D,
        config: EngineConfig,
    ) -> Self {
        Self {
            story,
            surface,
            audio,
            touch,
            assets,
            delay,
            config,
            state: EngineState::default(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Play the story until it fails.
    ///
    /// Never returns `Ok`. On error the sound is stopped, the fault is shown
    /// on screen and the error is returned.
    pub fn run(&mut self) -> Result<Infallible, StoryError> {
        let err = match self.run_cards() {
            Ok(never) => match never {},
            Err(err) => err,
        };
        self.halt(&err);
        Err(err)
    }

    fn run_cards(&mut self) -> Result<Infallible, StoryError> {
        info!("Starting story with {} cards", self.story.len());
        // Dark until the first card has been composed
        self.surface.set_brightness(0.0)?;
        loop {
            self.step()?;
        }
    }

    /// Show the current card and wait for it to be left.
    ///
    /// Returns the index of the card that will be shown next.
    pub fn step(&mut self) -> Result<usize, StoryError> {
        let story = self.story;
        let index = self.state.card_index;
        let card = story
            .card(index)
            .ok_or(StoryError::EndOfStory { index })?;

        info!("=== Card {} '{}' ===", index, card.card_id);
        self.state.phase = EnginePhase::Rendering(index);

        self.teardown()?;
        self.show_buttons(card)?;
        self.show_card_background(card)?;
        self.fade_to(1.0)?;
        self.show_text(card)?;
        self.surface.refresh_and_wait_for_frame()?;
        self.start_card_sound(card)?;

        self.state.phase = EnginePhase::AwaitingAdvance(index);
        let next = match card.auto_advance()? {
            Some(wait) => {
                self.state.phase = EnginePhase::AutoAdvancing(index);
                self.sleep(wait);
                self.stop_sound()?;
                self.next_in_order(index)?
            }
            None => {
                self.state.phase = EnginePhase::AwaitingInput(index);
                let goto = self.wait_for_choice()?;
                self.stop_sound()?;
                self.state.phase = EnginePhase::Resolving(goto.clone());
                story.find_index_by_id(&goto)?
            }
        };

        debug!("Card {} -> {}", index, next);
        self.state.card_index = next;
        self.state.phase = EnginePhase::Rendering(next);
        Ok(next)
    }

    /// Swap the background image, optionally fading out and back in around
    /// the swap. `None` clears it.
    pub fn set_background(&mut self, name: Option<&str>, with_fade: bool) -> Result<(), StoryError> {
        debug!("Set background to {:?}", name);
        if with_fade {
            self.fade_to(0.0)?;
        }

        // Close the old file before opening the next one
        self.state.background = None;
        let asset = name.map(|name| self.assets.open(name)).transpose()?;
        self.surface.set_background(asset.as_ref())?;
        self.state.background = asset;

        if with_fade {
            self.surface.refresh_and_wait_for_frame()?;
            self.fade_to(1.0)?;
        }
        Ok(())
    }

    /// Stop the current sound and optionally start another.
    ///
    /// With `wait` set (and `looping` unset) this returns once the sound
    /// has finished.
    pub fn play_sound(&mut self, name: Option<&str>, looping: bool, wait: bool) -> Result<(), StoryError> {
        self.stop_sound()?;

        let Some(name) = name else {
            return Ok(());
        };

        let sound = self.assets.open(name)?;
        self.audio.play(&sound, looping, wait)?;
        if looping || !wait {
            self.state.sound = Some(sound);
        }
        Ok(())
    }

    fn stop_sound(&mut self) -> Result<(), StoryError> {
        self.audio.stop()?;
        self.state.sound = None;
        Ok(())
    }

    fn fade_to(&mut self, level: f32) -> Result<(), StoryError> {
        fade(
            &mut self.surface,
            &mut self.delay,
            level,
            self.config.fade_step_ms,
        )
    }

    /// Dark, empty and settled before anything of the next card is staged.
    fn teardown(&mut self) -> Result<(), StoryError> {
        self.fade_to(0.0)?;
        self.set_background(None, false)?;
        self.surface.set_text(None)?;
        self.state.buttons.clear();
        self.surface.set_buttons(&[])?;
        self.surface.refresh_and_wait_for_frame()
    }

    fn show_buttons(&mut self, card: &Card) -> Result<(), StoryError> {
        self.state.buttons = layout_buttons(card, &self.config);
        if self.state.buttons.is_empty() {
            return Ok(());
        }

        let specs: heapless::Vec<ButtonSpec, 2> = self
            .state
            .buttons
            .iter()
            .map(|button| button.spec.clone())
            .collect();
        self.surface.set_buttons(&specs)
    }

    fn show_card_background(&mut self, card: &Card) -> Result<(), StoryError> {
        if let Some(name) = card.background_image.as_deref() {
            self.set_background(Some(name), false)?;
        }
        self.surface.refresh_and_wait_for_frame()
    }

    fn show_text(&mut self, card: &Card) -> Result<(), StoryError> {
        let Some((text, color)) = card.styled_text() else {
            if card.text.is_some() {
                debug!("Card '{}' has text but no text_color, skipping", card.card_id);
            }
            return Ok(());
        };

        let block = TextBlock {
            lines: wrap_text(text, self.config.wrap_chars),
            color,
            origin: self.config.text_origin(),
        };
        self.surface.set_text(Some(&block))
    }

    fn start_card_sound(&mut self, card: &Card) -> Result<(), StoryError> {
        let Some(name) = card.sound.as_deref() else {
            return Ok(());
        };
        let looping = card.sound_repeat()?;
        self.play_sound(Some(name), looping, false)
    }

    fn sleep(&mut self, wait: Duration) {
        debug!("Auto-advancing in {:?}", wait);
        let ms = u32::try_from(wait.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }

    fn next_in_order(&self, index: usize) -> Result<usize, StoryError> {
        if index + 1 < self.story.len() {
            return Ok(index + 1);
        }

        match self.config.end_of_story {
            EndOfStory::Halt => Err(StoryError::EndOfStory { index }),
            EndOfStory::Restart => {
                info!("Reached the last card, restarting the story");
                Ok(0)
            }
        }
    }

    /// Poll until a touch lands on exactly one button; its `goto` id.
    ///
    /// A card without buttons never returns from here.
    fn wait_for_choice(&mut self) -> Result<String, StoryError> {
        if self.state.buttons.is_empty() {
            info!("Card has no buttons and no auto_advance, waiting indefinitely");
        }

        loop {
            if let Some(point) = self.touch.poll_point()?
                && let Some(button) = self.state.button_at(point)
            {
                info!("Selected '{}'", button.spec.label);
                return button
                    .goto
                    .clone()
                    .ok_or_else(|| StoryError::UnresolvedReference(String::new()));
            }
            self.delay.delay_ms(self.config.touch_poll_ms);
        }
    }

    fn halt(&mut self, err: &StoryError) {
        error!("Story halted: {}", err);
        self.state.phase = EnginePhase::Halted;

        if let Err(e) = self.stop_sound() {
            warn!("Could not stop sound while halting: {}", e);
        }
        if let Err(e) = self.surface.show_fault(err.title(), &err.to_string()) {
            warn!("Could not show fault screen: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemorySource;
    use crate::testing::{
        Event, FakeDelay, Journal, RecordingAudio, RecordingSurface, ScriptedTouch,
    };
    use alloc::vec;
    use alloc::vec::Vec;

    type TestEngine<'s> = StoryEngine<
        's,
        RecordingSurface,
        RecordingAudio,
        ScriptedTouch,
        MemorySource,
        FakeDelay,
    >;

    struct Rig {
        journal: Journal,
        delay: FakeDelay,
        touch: ScriptedTouch,
    }

    fn harness<'s>(
        story: &'s Story,
        taps: &[(u16, u16)],
        assets: MemorySource,
        config: EngineConfig,
    ) -> (TestEngine<'s>, Rig) {
        let journal = Journal::new();
        let delay = FakeDelay::new(journal.clone());
        let touch = ScriptedTouch::taps(journal.clone(), taps);
        let engine = StoryEngine::new(
            story,
            RecordingSurface::new(journal.clone()),
            RecordingAudio::new(journal.clone()),
            touch.clone(),
            assets,
            delay.clone(),
            config,
        );
        (
            engine,
            Rig {
                journal,
                delay,
                touch,
            },
        )
    }

    fn story(json: &str) -> Story {
        Story::from_json("cyoa.json", json.as_bytes()).unwrap()
    }

    fn sleeps(events: &[Event]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Sleep(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_teardown_settles_before_next_card_is_staged() {
        let story = story(
            r#"[{"card_id": "a", "text": "Hello there", "text_color": "0xFFFFFF",
                 "background_image": "bg.bmp", "auto_advance": 0},
                {"card_id": "b", "auto_advance": 0}]"#,
        );
        let assets = MemorySource::new().with_file("bg.bmp", [0u8; 4]);
        let (mut engine, rig) = harness(&story, &[], assets, EngineConfig::default());

        engine.step().unwrap();
        rig.journal.clear();
        engine.step().unwrap_err();

        let events = rig.journal.events();
        // Fully dark before any layer is touched
        let first_layer = events
            .iter()
            .position(|e| !matches!(e, Event::Brightness(_) | Event::Sleep(_)))
            .unwrap();
        assert!(first_layer > 0);
        assert_eq!(events[first_layer - 1], Event::Brightness(0.0));

        assert_eq!(
            &rig.journal.milestones()[..5],
            &[
                Event::Background(None),
                Event::Text(None),
                Event::Buttons(vec![]),
                Event::Refresh,
                Event::Refresh,
            ]
        );
    }

    #[test]
    fn test_card_cycle_order() {
        let story = story(
            r##"[{"card_id": "a", "text": "the quick brown fox", "text_color": "#000000",
                 "background_image": "bg.bmp", "sound": "hum.wav", "sound_repeat": "True",
                 "button1_text": "Next", "button1_goto": "a"}]"##,
        );
        let assets = MemorySource::new()
            .with_file("bg.bmp", [0u8; 4])
            .with_file("hum.wav", [0u8; 4]);
        let config = EngineConfig {
            wrap_chars: 10,
            ..Default::default()
        };
        let (mut engine, rig) = harness(&story, &[(150, 210)], assets, config);

        assert_eq!(engine.step().unwrap(), 0);

        let milestones = rig.journal.milestones();
        let staged = &milestones[4..];
        assert_eq!(
            staged,
            &[
                Event::Buttons(vec![ButtonSpec::new(
                    "Next",
                    EngineConfig::default().center_button.to_rectangle()
                )]),
                Event::Background(Some("bg.bmp".into())),
                Event::Refresh,
                Event::Text(Some(vec!["the quick".into(), "brown fox".into()])),
                Event::Refresh,
                Event::Stop,
                Event::Play {
                    name: "hum.wav".into(),
                    looping: true,
                    blocking: false
                },
                Event::Touch(crate::ui::TouchPoint::new(150, 210)),
                Event::Stop,
            ]
        );

        // Fade up happens between compositing the background and the text
        let events = rig.journal.events();
        let text_at = events
            .iter()
            .position(|e| matches!(e, Event::Text(Some(_))))
            .unwrap();
        assert_eq!(events[text_at - 1], Event::Brightness(1.0));
        assert_eq!(engine.state().sound(), None);
        assert_eq!(engine.state().background(), Some("bg.bmp"));
    }

    #[test]
    fn test_auto_advance_ignores_buttons() {
        let story = story(
            r#"[{"card_id": "a", "auto_advance": 2.0,
                 "button1_text": "Go", "button1_goto": "c"},
                {"card_id": "b"},
                {"card_id": "c"}]"#,
        );
        let (mut engine, rig) = harness(&story, &[], MemorySource::new(), EngineConfig::default());

        assert_eq!(engine.step().unwrap(), 1);
        assert_eq!(rig.touch.polls(), 0);
        assert!(sleeps(&rig.journal.events()).contains(&2000));
        // Fade up at 3 ms per step plus the two seconds
        assert_eq!(rig.delay.elapsed_ms(), 2000 + 100 * 3);
    }

    #[test]
    fn test_touch_outside_buttons_keeps_polling() {
        let story = story(
            r#"[{"card_id": "a", "button1_text": "L", "button1_goto": "a",
                 "button2_text": "R", "button2_goto": "b"},
                {"card_id": "b"}]"#,
        );
        let (mut engine, rig) = harness(
            &story,
            &[(160, 20), (160, 210), (250, 210)],
            MemorySource::new(),
            EngineConfig::default(),
        );

        assert_eq!(engine.step().unwrap(), 1);
        assert_eq!(rig.touch.polls(), 3);
        assert_eq!(sleeps(&rig.journal.events()).iter().filter(|&&ms| ms == 10).count(), 2);
    }

    #[test]
    fn test_unresolved_goto_is_fatal() {
        let story = story(
            r#"[{"card_id": "a", "button1_text": "Go", "button1_goto": "nowhere"},
                {"card_id": "b"}]"#,
        );
        let (mut engine, rig) =
            harness(&story, &[(150, 210)], MemorySource::new(), EngineConfig::default());

        assert_eq!(
            engine.run(),
            Err(StoryError::UnresolvedReference("nowhere".into()))
        );
        assert_eq!(engine.state().phase, EnginePhase::Halted);
        assert_eq!(engine.state().card_index, 0);
        assert_eq!(
            rig.journal.milestones().last(),
            Some(&Event::Fault("Broken Story Link".into()))
        );
    }

    #[test]
    fn test_button_without_goto_is_unresolved() {
        let story = story(r#"[{"card_id": "a", "button1_text": "Go"}]"#);
        let (mut engine, _rig) =
            harness(&story, &[(150, 210)], MemorySource::new(), EngineConfig::default());

        assert_eq!(
            engine.step(),
            Err(StoryError::UnresolvedReference(String::new()))
        );
    }

    #[test]
    fn test_end_of_story_policies() {
        let json = r#"[{"card_id": "a", "auto_advance": 0}, {"card_id": "b", "auto_advance": "0"}]"#;
        let halting = story(json);
        let (mut engine, _rig) =
            harness(&halting, &[], MemorySource::new(), EngineConfig::default());
        assert_eq!(engine.step(), Ok(1));
        assert_eq!(engine.step(), Err(StoryError::EndOfStory { index: 1 }));

        let restarting = story(json);
        let config = EngineConfig {
            end_of_story: EndOfStory::Restart,
            ..Default::default()
        };
        let (mut engine, _rig) = harness(&restarting, &[], MemorySource::new(), config);
        assert_eq!(engine.step(), Ok(1));
        assert_eq!(engine.step(), Ok(0));
    }

    #[test]
    fn test_missing_asset_halts_with_fault() {
        let story = story(r#"[{"card_id": "a", "background_image": "gone.bmp"}]"#);
        let (mut engine, rig) = harness(&story, &[], MemorySource::new(), EngineConfig::default());

        let err = engine.run().unwrap_err();
        assert!(matches!(err, StoryError::AssetLoad { ref name, .. } if name == "gone.bmp"));

        let milestones = rig.journal.milestones();
        assert_eq!(milestones[milestones.len() - 2], Event::Stop);
        assert_eq!(
            milestones.last(),
            Some(&Event::Fault("Missing Asset".into()))
        );
    }

    #[test]
    fn test_invalid_flag_is_rejected_when_read() {
        let story = story(
            r#"[{"card_id": "a", "sound": "hum.wav", "sound_repeat": "sometimes", "auto_advance": 0},
                {"card_id": "b"}]"#,
        );
        let assets = MemorySource::new().with_file("hum.wav", [0u8; 4]);
        let (mut engine, _rig) = harness(&story, &[], assets, EngineConfig::default());

        assert!(matches!(
            engine.step(),
            Err(StoryError::InvalidConfiguration { key: "sound_repeat", .. })
        ));
    }

    #[test]
    fn test_huge_auto_advance_halts_with_fault() {
        let story = story(r#"[{"card_id": "a", "auto_advance": 1e20}]"#);
        let (mut engine, rig) = harness(&story, &[], MemorySource::new(), EngineConfig::default());

        assert!(matches!(
            engine.run(),
            Err(StoryError::InvalidConfiguration { key: "auto_advance", .. })
        ));
        assert_eq!(engine.state().phase, EnginePhase::Halted);
        assert_eq!(
            rig.journal.milestones().last(),
            Some(&Event::Fault("Invalid Card Setting".into()))
        );
    }

    #[test]
    fn test_play_sound_replaces_and_waits() {
        let story = story(r#"[{"card_id": "a"}]"#);
        let assets = MemorySource::new()
            .with_file("rain.wav", [0u8; 4])
            .with_file("bell.wav", [0u8; 4]);
        let (mut engine, rig) = harness(&story, &[], assets, EngineConfig::default());

        engine.play_sound(Some("rain.wav"), true, false).unwrap();
        assert_eq!(engine.state().sound(), Some("rain.wav"));
        assert!(engine.audio().is_playing());

        engine.play_sound(Some("bell.wav"), false, true).unwrap();
        assert_eq!(engine.state().sound(), None);
        assert!(!engine.audio().is_playing());

        engine.play_sound(None, false, false).unwrap();
        assert_eq!(
            rig.journal.milestones(),
            vec![
                Event::Stop,
                Event::Play {
                    name: "rain.wav".into(),
                    looping: true,
                    blocking: false
                },
                Event::Stop,
                Event::Play {
                    name: "bell.wav".into(),
                    looping: false,
                    blocking: true
                },
                Event::Stop,
            ]
        );
    }

    #[test]
    fn test_set_background_with_fade() {
        let story = story(r#"[{"card_id": "a"}]"#);
        let assets = MemorySource::new().with_file("door.bmp", [0u8; 4]);
        let (mut engine, rig) = harness(&story, &[], assets, EngineConfig::default());

        engine.set_background(Some("door.bmp"), true).unwrap();
        assert_eq!(engine.state().background(), Some("door.bmp"));
        assert_eq!(engine.surface().brightness(), 1.0);
        assert_eq!(
            rig.journal.milestones(),
            vec![Event::Background(Some("door.bmp".into())), Event::Refresh]
        );

        engine.set_background(None, false).unwrap();
        assert_eq!(engine.state().background(), None);
    }
}
