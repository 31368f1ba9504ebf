//! GPIO pin abstractions
//!
//! Provides the input pin trait and pin configuration that chip-specific HALs
//! turn into a configured peripheral.

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// Input pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// GPIO pin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// Pin direction
    pub direction: Direction,
    /// Pull resistor applied while the pin is an input
    pub input_pull: Pull,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Input,
            input_pull: Pull::Up,
        }
    }
}

impl PinConfig {
    /// Input with the internal pull-up enabled (active-low button)
    pub const INPUT_PULL_UP: Self = Self {
        direction: Direction::Input,
        input_pull: Pull::Up,
    };

    /// Check whether this configuration describes an input
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
