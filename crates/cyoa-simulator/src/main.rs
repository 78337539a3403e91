//! Desktop simulator for the cyoa story player.
//!
//! Plays a story directory in an SDL2 window via `embedded-graphics-simulator`.
//! The backlight is simulated by dimming the window contents and sounds are
//! "played" for as long as their WAV header says they last.
//!
//! ```text
//! cyoa-simulator <story-dir>
//! ```
//!
//! The directory holds `cyoa.json`, its assets and optionally a
//! `config.json` overriding the engine configuration.
//!
//! Mouse clicks are forwarded as touches. Q, Escape or closing the window
//! quits.

use std::cell::RefCell;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, error, info};

use cyoa_core::audio::{AudioOutput, GatedAudio, WavInfo};
use cyoa_core::surface::{Backlight, Compositor, Panel, PresentationSurface};
use cyoa_core::touch::TouchInput;
use cyoa_core::ui::TouchPoint;
use cyoa_core::{AssetSource, EngineConfig, Story, StoryEngine, StoryError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Idle frame pacing once the story has stopped.
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Optional engine configuration inside the story directory.
const CONFIG_FILE: &str = "config.json";

// ---------------------------------------------------------------------------
// Story directory
// ---------------------------------------------------------------------------

struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl AssetSource for DirectorySource {
    fn read(&mut self, name: &str) -> Result<Vec<u8>, StoryError> {
        let path = self.root.join(name);
        debug!("Reading {}", path.display());
        std::fs::read(&path).map_err(|e| StoryError::AssetLoad {
            name: name.to_string(),
            reason: match e.kind() {
                std::io::ErrorKind::NotFound => "file not found".to_string(),
                _ => e.to_string(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Screen, backlight and touch
// ---------------------------------------------------------------------------

/// Last mouse click, waiting to be picked up as a touch sample.
///
/// Clicks made before the current frame was presented are discarded, so a
/// click during a fade or an auto-advance sleep cannot select a button the
/// user has not seen yet.
#[derive(Debug, Default)]
struct TouchLatch {
    pending: Option<TouchPoint>,
}

impl TouchLatch {
    fn press(&mut self, point: TouchPoint) {
        self.pending = Some(point);
    }

    fn discard(&mut self) {
        if let Some(point) = self.pending.take() {
            debug!("Dropping click at ({}, {}) made before the frame", point.x, point.y);
        }
    }

    fn take(&mut self) -> Option<TouchPoint> {
        self.pending.take()
    }
}

/// Window plus the undimmed panel contents, shared by the panel, backlight
/// and touch handles.
struct SimScreen {
    display: SimulatorDisplay<Rgb565>,
    window: Window,
    size: Size,
    frame: Vec<Rgb565>,
    brightness: f32,
    touch: TouchLatch,
    closed: bool,
}

type SharedScreen = Rc<RefCell<SimScreen>>;

impl SimScreen {
    fn open(size: Size) -> SharedScreen {
        let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
        let mut screen = Self {
            display: SimulatorDisplay::new(size),
            window: Window::new("CYOA Simulator", &output_settings),
            size,
            frame: vec![Rgb565::BLACK; (size.width * size.height) as usize],
            brightness: 0.0,
            touch: TouchLatch::default(),
            closed: false,
        };
        // The SDL window is created lazily on the first update; `events()`
        // panics before that.
        screen.present();
        Rc::new(RefCell::new(screen))
    }

    /// Show the panel contents at the current backlight level.
    fn present(&mut self) {
        let level = self.brightness;
        let area = Rectangle::new(Point::zero(), self.size);
        let dimmed = self.frame.iter().map(|&c| dim(c, level));
        let _ = self.display.fill_contiguous(&area, dimmed);
        self.window.update(&self.display);
    }

    fn pump_events(&mut self) {
        for event in self.window.events() {
            match event {
                SimulatorEvent::Quit => self.closed = true,
                SimulatorEvent::KeyDown { keycode, .. }
                    if keycode == Keycode::Q || keycode == Keycode::Escape =>
                {
                    self.closed = true
                }
                SimulatorEvent::MouseButtonDown { point, .. } => {
                    self.touch
                        .press(TouchPoint::new(point.x.max(0) as u16, point.y.max(0) as u16));
                }
                _ => {}
            }
        }
    }

    fn check_open(&self) -> Result<(), StoryError> {
        if self.closed {
            Err(StoryError::Hardware("simulator window closed".to_string()))
        } else {
            Ok(())
        }
    }
}

fn dim(color: Rgb565, level: f32) -> Rgb565 {
    let scale = |c: u8| (c as f32 * level).round() as u8;
    Rgb565::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

struct SimPanel(SharedScreen);

impl OriginDimensions for SimPanel {
    fn size(&self) -> Size {
        self.0.borrow().size
    }
}

impl DrawTarget for SimPanel {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let mut screen = self.0.borrow_mut();
        let bounds = Rectangle::new(Point::zero(), screen.size);
        let width = screen.size.width as usize;
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                screen.frame[point.y as usize * width + point.x as usize] = color;
            }
        }
        Ok(())
    }
}

impl Panel for SimPanel {
    fn wait_for_frame(&mut self) -> Result<(), StoryError> {
        let mut screen = self.0.borrow_mut();
        screen.present();
        screen.pump_events();
        screen.touch.discard();
        screen.check_open()
    }
}

struct SimBacklight(SharedScreen);

impl Backlight for SimBacklight {
    fn set_level(&mut self, level: f32) -> Result<(), StoryError> {
        let mut screen = self.0.borrow_mut();
        screen.brightness = level;
        screen.present();
        Ok(())
    }
}

struct SimTouch(SharedScreen);

impl TouchInput for SimTouch {
    fn poll_point(&mut self) -> Result<Option<TouchPoint>, StoryError> {
        let mut screen = self.0.borrow_mut();
        screen.pump_events();
        screen.check_open()?;
        Ok(screen.touch.take())
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Pretends to play: a sound is "playing" until its duration has elapsed.
#[derive(Default)]
struct SimAudio {
    ends_at: Option<Instant>,
    looping: bool,
}

impl AudioOutput for SimAudio {
    type Error = Infallible;

    fn start(&mut self, samples: &[u8], info: &WavInfo, looping: bool) -> Result<(), Infallible> {
        debug!(
            "Audio start: {} bytes, {:?}{}",
            samples.len(),
            info.duration(),
            if looping { " (looping)" } else { "" }
        );
        self.ends_at = Some(Instant::now() + info.duration());
        self.looping = looping;
        Ok(())
    }

    fn halt(&mut self) -> Result<(), Infallible> {
        self.ends_at = None;
        self.looping = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.ends_at {
            Some(_) if self.looping => true,
            Some(end) => Instant::now() < end,
            None => false,
        }
    }
}

/// Speaker amplifier enable line; only logs.
struct SimSpeaker;

impl ErrorType for SimSpeaker {
    type Error = Infallible;
}

impl OutputPin for SimSpeaker {
    fn set_low(&mut self) -> Result<(), Infallible> {
        debug!("Speaker off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        debug!("Speaker on");
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn load_config(story_dir: &Path, assets: &mut DirectorySource) -> Result<EngineConfig, StoryError> {
    if !story_dir.join(CONFIG_FILE).exists() {
        return Ok(EngineConfig::default());
    }
    let bytes = assets.read(CONFIG_FILE)?;
    EngineConfig::from_json(CONFIG_FILE, &bytes)
}

/// Keep the window responsive until the user closes it.
fn wait_for_close(screen: &SharedScreen) {
    info!("Close the window to exit");
    loop {
        {
            let mut guard = screen.borrow_mut();
            guard.pump_events();
            if guard.closed {
                return;
            }
            guard.present();
        }
        std::thread::sleep(FRAME_DURATION);
    }
}

fn main() {
    env_logger::init();

    let Some(story_dir) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: cyoa-simulator <story-dir>");
        std::process::exit(2);
    };

    let mut assets = DirectorySource::new(&story_dir);
    let config = match load_config(&story_dir, &mut assets) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Starting cyoa simulator on {}", story_dir.display());
    info!(
        "Display: {}×{} (scale {}×)",
        config.display_width, config.display_height, WINDOW_SCALE
    );

    let screen = SimScreen::open(Size::new(
        config.display_width as u32,
        config.display_height as u32,
    ));
    let mut surface = Compositor::new(SimPanel(screen.clone()), SimBacklight(screen.clone()));

    let story = match Story::load(&mut assets, &config.story_file) {
        Ok(story) => story,
        Err(e) => {
            error!("{}", e);
            if let Err(e) = surface.show_fault(e.title(), &e.to_string()) {
                error!("Could not show fault screen: {}", e);
            }
            wait_for_close(&screen);
            return;
        }
    };

    let audio = GatedAudio::new(
        SimAudio::default(),
        SimSpeaker,
        StdDelay,
        config.sound_poll_ms,
    );
    let mut engine = StoryEngine::new(
        &story,
        surface,
        audio,
        SimTouch(screen.clone()),
        assets,
        StdDelay,
        config,
    );

    let err = match engine.run() {
        Ok(never) => match never {},
        Err(err) => err,
    };

    if !screen.borrow().closed {
        info!("Story stopped: {}", err);
        wait_for_close(&screen);
    }
    info!("Simulator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_before_frame_is_discarded() {
        let mut latch = TouchLatch::default();
        latch.press(TouchPoint::new(60, 210));
        latch.discard();
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn test_click_after_frame_is_taken_once() {
        let mut latch = TouchLatch::default();
        latch.discard();
        latch.press(TouchPoint::new(250, 210));
        assert_eq!(latch.take(), Some(TouchPoint::new(250, 210)));
        assert_eq!(latch.take(), None);
    }
}
