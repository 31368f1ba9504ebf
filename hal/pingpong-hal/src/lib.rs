//! Pingpong Hardware Abstraction Layer
//!
//! This crate defines the collaborator contracts the example application is
//! written against. Chip-specific crates implement them, so the application
//! logic in `pingpong-core` never touches a peripheral directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (pingpong-core)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pingpong-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ pingpong-hal- │
//!             │   stm32f0     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - Digital input (the user button)
//! - [`i2c::I2cMasterJob`] - Non-blocking, callback-driven I2C master
//!
//! # Job queue
//!
//! [`job::JobQueue`] and its [`job::I2cMaster`] handle implement
//! `I2cMasterJob` for any chip; a chip crate only supplies the engine task
//! that runs queued jobs on its peripheral.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod job;

// Re-export key types at crate root for convenience
pub use gpio::{InputPin, PinConfig, Pull};
pub use i2c::{
    Address, Callback, CallbackTable, CallbackType, Error, I2cMasterConfig, I2cMasterJob,
    JobStatus, ReadPacket, WritePacket,
};
