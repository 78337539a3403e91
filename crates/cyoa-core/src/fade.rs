//! Stepped backlight fades
//!
//! Redraws happen in the dark: the engine fades to black, swaps the card and
//! fades back up. Each step is 1% of full brightness with a fixed delay
//! between steps.

use embedded_hal::delay::DelayNs;

use crate::error::StoryError;
use crate::surface::PresentationSurface;

/// Fade the surface's brightness from its current level to `to`.
///
/// `to` is clamped to `0.0..=1.0`. The walk is monotonic and always finishes
/// by setting exactly the clamped target, so rounding never drifts. When the
/// surface is already at the target no intermediate steps are taken.
pub fn fade<S, D>(surface: &mut S, delay: &mut D, to: f32, step_ms: u32) -> Result<(), StoryError>
where
    S: PresentationSurface + ?Sized,
    D: DelayNs + ?Sized,
{
    let target = if to.is_nan() { 0.0 } else { to.clamp(0.0, 1.0) };
    let from_pct = percent(surface.brightness());
    let to_pct = percent(target);
    let delta = if from_pct > to_pct { -1 } else { 1 };

    let mut level = from_pct;
    while level != to_pct {
        surface.set_brightness(level as f32 / 100.0)?;
        delay.delay_ms(step_ms);
        level += delta;
    }

    surface.set_brightness(target)
}

fn percent(level: f32) -> i32 {
    (level.clamp(0.0, 1.0) * 100.0 + 0.5) as i32
}
