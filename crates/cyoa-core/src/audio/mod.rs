//! Sound playback
//!
//! [`AudioChannel`] is what the engine drives. [`GatedAudio`] implements it
//! on top of a raw [`AudioOutput`] (DAC, I2S, simulator) and a speaker-enable
//! pin: the amplifier is only powered while a sound is actually playing.

mod wav;

pub use wav::{WavError, WavInfo};

extern crate alloc;

use alloc::string::ToString;
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::assets::Asset;
use crate::error::StoryError;

pub trait AudioChannel {
    /// Start `sound`. With `blocking` set (and `looping` unset) return only
    /// once it has finished.
    fn play(&mut self, sound: &Asset, looping: bool, blocking: bool) -> Result<(), StoryError>;

    /// Stop whatever is playing. Stopping silence is not an error.
    fn stop(&mut self) -> Result<(), StoryError>;

    fn is_playing(&self) -> bool;
}

/// Sample sink that plays decoded PCM in the background.
pub trait AudioOutput {
    type Error: Debug;

    fn start(&mut self, samples: &[u8], info: &WavInfo, looping: bool)
    -> Result<(), Self::Error>;

    fn halt(&mut self) -> Result<(), Self::Error>;

    fn is_playing(&self) -> bool;
}

/// [`AudioChannel`] over an [`AudioOutput`] with a speaker-enable pin.
pub struct GatedAudio<O, P, D> {
    output: O,
    speaker_enable: P,
    delay: D,
    poll_ms: u32,
}

impl<O, P, D> GatedAudio<O, P, D>
where
    O: AudioOutput,
    P: OutputPin,
    D: DelayNs,
{
    /// `poll_ms` is the sleep between checks while a blocking sound plays.
    pub fn new(output: O, speaker_enable: P, delay: D, poll_ms: u32) -> Self {
        Self {
            output,
            speaker_enable,
            delay,
            poll_ms,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn speaker_enable(&self) -> &P {
        &self.speaker_enable
    }

    fn speaker(&mut self, on: bool) -> Result<(), StoryError> {
        let result = if on {
            self.speaker_enable.set_high()
        } else {
            self.speaker_enable.set_low()
        };
        result.map_err(StoryError::hardware)
    }
}

impl<O, P, D> AudioChannel for GatedAudio<O, P, D>
where
    O: AudioOutput,
    P: OutputPin,
    D: DelayNs,
{
    fn play(&mut self, sound: &Asset, looping: bool, blocking: bool) -> Result<(), StoryError> {
        self.stop()?;

        let info =
            WavInfo::parse(sound.data()).map_err(|e| StoryError::asset(sound.name(), e.to_string()))?;
        info!(
            "Playing sound {} ({} Hz, {} ch, {:?}{})",
            sound.name(),
            info.sample_rate,
            info.channels,
            info.duration(),
            if looping { ", looping" } else { "" }
        );

        self.speaker(true)?;
        self.output
            .start(&sound.data()[info.data.clone()], &info, looping)
            .map_err(StoryError::hardware)?;

        if looping || !blocking {
            return Ok(());
        }

        while self.output.is_playing() {
            self.delay.delay_ms(self.poll_ms);
        }
        debug!("Sound {} finished", sound.name());
        self.speaker(false)
    }

    fn stop(&mut self) -> Result<(), StoryError> {
        self.speaker(false)?;
        self.output.halt().map_err(StoryError::hardware)
    }

    fn is_playing(&self) -> bool {
        self.output.is_playing()
    }
}
