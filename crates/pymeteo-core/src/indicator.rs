//! Single on/off indicator output

use embedded_hal::digital::OutputPin;
use log::error;

/// The board LED driven by `led_on`/`led_off` and cleared by the sensor commands.
pub struct Indicator<P> {
    pin: P,
}

impl<P: OutputPin> Indicator<P> {
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Drive the output. Pin errors are logged and otherwise ignored.
    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        if let Err(e) = result {
            error!("Failed to switch indicator {}: {:?}", if on { "on" } else { "off" }, e);
        }
    }
}
