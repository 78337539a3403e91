use embedded_hal::i2c::I2c;
use log::debug;

use super::TouchInput;
use crate::error::StoryError;
use crate::ui::TouchPoint;

// =============================================================================
// Registers
// =============================================================================

/// FT6336U I2C address
pub const I2C_ADDR: u8 = 0x38;

/// Touch detection status, low nibble is the number of touch points
const ADDR_TD_STATUS: u8 = 0x02;
/// First touch point: XH, XL, YH, YL
const ADDR_TOUCH1_XH: u8 = 0x03;

/// Event flag in the top two bits of XH
const EVENT_LIFT_UP: u8 = 0b01;

/// Blocking single-point reader for the FT6336U capacitive touch controller.
///
/// Reset and interrupt lines are expected to be set up by the board code
/// before the reader is created. Each instance owns its transfer buffer, so
/// two readers on two buses never share state.
pub struct Ft6336u<I2C> {
    i2c: I2C,
    buf: [u8; 4],
}

impl<I2C: I2c> Ft6336u<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, buf: [0; 4] }
    }

    /// Number of touch points currently reported (0-2).
    pub fn read_touch_count(&mut self) -> Result<u8, I2C::Error> {
        self.i2c
            .write_read(I2C_ADDR, &[ADDR_TD_STATUS], &mut self.buf[..1])?;
        Ok(self.buf[0] & 0x0F)
    }

    /// First touch point, or `None` when its event is a lift-up.
    pub fn read_touch1(&mut self) -> Result<Option<TouchPoint>, I2C::Error> {
        self.i2c
            .write_read(I2C_ADDR, &[ADDR_TOUCH1_XH], &mut self.buf)?;

        let [xh, xl, yh, yl] = self.buf;
        if xh >> 6 == EVENT_LIFT_UP {
            return Ok(None);
        }

        // 12-bit coordinates
        let x = (((xh & 0x0F) as u16) << 8) | xl as u16;
        let y = (((yh & 0x0F) as u16) << 8) | yl as u16;
        Ok(Some(TouchPoint::new(x, y)))
    }
}

impl<I2C: I2c> TouchInput for Ft6336u<I2C> {
    fn poll_point(&mut self) -> Result<Option<TouchPoint>, StoryError> {
        let count = self.read_touch_count().map_err(StoryError::hardware)?;
        // The controller reports 0x0F while it is still booting
        if count == 0 || count > 2 {
            return Ok(None);
        }

        let point = self.read_touch1().map_err(StoryError::hardware)?;
        if let Some(point) = point {
            debug!("Touch at ({}, {})", point.x, point.y);
        }
        Ok(point)
    }
}
