//! Touch sampling
//!
//! The engine only needs "where is the finger right now, if anywhere". Each
//! poll is independent; debouncing and gestures are out of scope.

mod ft6336u;

pub use ft6336u::{Ft6336u, I2C_ADDR};

use crate::error::StoryError;
use crate::ui::TouchPoint;

pub trait TouchInput {
    /// Sample the panel once. `None` when nothing is touching it.
    fn poll_point(&mut self) -> Result<Option<TouchPoint>, StoryError>;
}

impl<T: TouchInput + ?Sized> TouchInput for &mut T {
    fn poll_point(&mut self) -> Result<Option<TouchPoint>, StoryError> {
        (**self).poll_point()
    }
}
