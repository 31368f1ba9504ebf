//! Build-time configuration
//!
//! Constants are generated by build.rs from pingpong.toml, which is validated
//! before the firmware compiles.

use pingpong_hal::gpio::{Direction, PinConfig, Pull};
use pingpong_hal::i2c::I2cMasterConfig;

include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// Button pin configuration
pub const BUTTON_PIN: PinConfig = PinConfig {
    direction: Direction::Input,
    input_pull: BUTTON_PULL,
};

/// I2C master configuration
pub const I2C_MASTER: I2cMasterConfig = I2cMasterConfig {
    frequency: I2C_FREQUENCY_HZ,
    timeout_ms: I2C_TIMEOUT_MS,
};
