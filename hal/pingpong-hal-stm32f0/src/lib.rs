//! STM32F0-specific HAL for the Pingpong example
//!
//! Implements the `pingpong-hal` collaborator contracts for STM32F0 chips on
//! top of embassy-stm32:
//!
//! - [`gpio::ButtonInput`] - `InputPin` for an embassy `Input`
//! - [`i2c::JobEngine`] - async task body that runs queued I2C jobs on the
//!   peripheral; submission goes through `pingpong_hal::job::I2cMaster`
//!
//! # Features
//!
//! - `stm32f042k6` / `stm32f042f6` - chip selection
//! - `defmt` - debug formatting and job logging

#![no_std]

pub mod gpio;
pub mod i2c;

// Re-export shared types from pingpong-hal
pub use pingpong_hal::{I2cMasterConfig, I2cMasterJob, InputPin, PinConfig};
