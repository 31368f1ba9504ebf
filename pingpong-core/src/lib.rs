//! Board-agnostic application logic for the I2C callback example
//!
//! This crate contains everything the example does that does not depend on a
//! specific chip:
//!
//! - The two fixed write buffers and the toggle between them
//! - Button press detection (wait for release before accepting a press)
//! - The polling step that submits a write job per press
//! - The write-complete callback that chains a read job

#![no_std]
#![deny(unsafe_code)]

pub mod app;
pub mod buffers;
pub mod button;

pub use app::{on_write_complete, read_back_packet, PingPong, DEFAULT_SLAVE_ADDRESS};
pub use buffers::{WriteBuffer, DATA_LENGTH};
pub use button::Button;
