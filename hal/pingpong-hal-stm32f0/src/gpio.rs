//! GPIO support for STM32F0
//!
//! Bridges embassy-stm32 inputs to the `pingpong-hal` pin traits.

use embassy_stm32::gpio::{Input, Pull as EmbassyPull};
use pingpong_hal::gpio::{InputPin, PinConfig, Pull};

/// Translate a pull selection to embassy's
pub fn to_embassy_pull(pull: Pull) -> EmbassyPull {
    match pull {
        Pull::None => EmbassyPull::None,
        Pull::Up => EmbassyPull::Up,
        Pull::Down => EmbassyPull::Down,
    }
}

/// Pull to apply for a pin configuration
///
/// Output configurations get no pull.
pub fn input_pull(config: &PinConfig) -> EmbassyPull {
    if config.is_input() {
        to_embassy_pull(config.input_pull)
    } else {
        EmbassyPull::None
    }
}

/// Button wired to a GPIO input
pub struct ButtonInput<'d> {
    input: Input<'d>,
}

impl<'d> ButtonInput<'d> {
    pub fn new(input: Input<'d>) -> Self {
        Self { input }
    }
}

impl InputPin for ButtonInput<'_> {
    fn is_high(&self) -> bool {
        self.input.is_high()
    }
}
