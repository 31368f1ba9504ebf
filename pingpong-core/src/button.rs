//! Button press detection
//!
//! The button is active-low (pulled-up input shorted to ground when pressed).
//! A press is accepted only once the level returns to released, which waits
//! out contact bounce while the button is held.

use pingpong_hal::gpio::InputPin;

/// Press detector for an active-low button
pub struct Button<P> {
    pin: P,
    /// Low level seen, waiting for release
    held: bool,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, held: false }
    }

    /// Sample the pin once
    ///
    /// Returns `true` exactly once per press, on the poll that first sees the
    /// pin released again. Never blocks.
    pub fn poll(&mut self) -> bool {
        let pressed = self.pin.is_low();

        if pressed {
            self.held = true;
            false
        } else if self.held {
            self.held = false;
            true
        } else {
            false
        }
    }

    /// Check if a press is in progress
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Release the underlying pin
    pub fn free(self) -> P {
        self.pin
    }
}
