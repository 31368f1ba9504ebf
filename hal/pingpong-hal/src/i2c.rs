//! I2C master abstractions
//!
//! Provides a non-blocking, callback-driven I2C master contract. A job is
//! submitted and returns immediately; the driver later reports completion by
//! invoking the callback registered for the matching [`CallbackType`] from its
//! completion context.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Highest valid 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Errors reported by job submission or by a finished job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Another job is still in flight
    Busy,
    /// Module is not enabled
    Denied,
    /// Invalid address, length or configuration
    InvalidArgument,
    /// Slave did not acknowledge its address
    BadAddress,
    /// Slave did not acknowledge a data byte
    Nack,
    /// Arbitration lost to another master
    Collision,
    /// Data overrun
    Overflow,
    /// Transfer did not finish in time
    Timeout,
    /// Job cancelled before it finished
    Aborted,
    /// Bus error (misplaced start/stop)
    Bus,
    /// Other error
    Other,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => Error::Bus,
            ErrorKind::ArbitrationLoss => Error::Collision,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => Error::BadAddress,
            ErrorKind::NoAcknowledge(_) => Error::Nack,
            ErrorKind::Overrun => Error::Overflow,
            _ => Error::Other,
        }
    }
}

/// 7-bit slave address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Create an address, rejecting values that do not fit in 7 bits
    pub const fn new(raw: u8) -> Result<Self, Error> {
        if raw > MAX_ADDRESS {
            Err(Error::InvalidArgument)
        } else {
            Ok(Self(raw))
        }
    }

    /// Raw 7-bit value
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Address {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Write job descriptor
///
/// The data must outlive the job, so only `'static` buffers are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WritePacket {
    /// Slave address
    pub address: Address,
    /// Bytes to write
    pub data: &'static [u8],
}

impl WritePacket {
    pub const fn new(address: Address, data: &'static [u8]) -> Self {
        Self { address, data }
    }

    /// Number of bytes to write
    pub fn data_length(&self) -> usize {
        self.data.len()
    }
}

/// Read job descriptor
///
/// The received bytes stay in the driver's read buffer until copied out with
/// [`I2cMasterJob::read_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadPacket {
    /// Slave address
    pub address: Address,
    /// Number of bytes to read
    pub data_length: usize,
}

impl ReadPacket {
    pub const fn new(address: Address, data_length: usize) -> Self {
        Self {
            address,
            data_length,
        }
    }
}

/// State of the current job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobStatus {
    /// No job in flight; the last one (if any) succeeded
    Idle,
    /// A job is in flight
    Busy,
    /// The last job failed
    Failed(Error),
}

impl JobStatus {
    /// Check if a job is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, JobStatus::Busy)
    }
}

/// I2C master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cMasterConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Per-transfer timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for I2cMasterConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cMasterConfig {
    /// Lowest supported bus frequency
    pub const MIN_FREQUENCY: u32 = 10_000;

    /// Highest supported bus frequency
    pub const MAX_FREQUENCY: u32 = 1_000_000;

    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        timeout_ms: 100,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        timeout_ms: 100,
    };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
        timeout_ms: 100,
    };

    /// Check that the configuration can be applied
    pub fn validate(&self) -> Result<(), Error> {
        if !(Self::MIN_FREQUENCY..=Self::MAX_FREQUENCY).contains(&self.frequency) {
            return Err(Error::InvalidArgument);
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

/// Events a callback can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallbackType {
    /// A write job finished successfully
    WriteComplete,
    /// A read job finished successfully
    ReadComplete,
    /// A job failed
    Error,
}

impl CallbackType {
    /// Number of callback types
    pub const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            CallbackType::WriteComplete => 0,
            CallbackType::ReadComplete => 1,
            CallbackType::Error => 2,
        }
    }
}

/// Completion callback
///
/// Receives the module so it can inspect the job status or chain a new job.
pub type Callback<M> = fn(&mut M);

/// Registered callbacks and their enable flags
///
/// Shared building block for driver implementations. A callback fires only
/// when it is both registered and enabled.
pub struct CallbackTable<M> {
    callbacks: [Option<Callback<M>>; CallbackType::COUNT],
    enabled: u8,
}

impl<M> Default for CallbackTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> CallbackTable<M> {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            callbacks: [None, None, None],
            enabled: 0,
        }
    }

    /// Register a callback, replacing any previous one for the same type
    pub fn register(&mut self, callback: Callback<M>, kind: CallbackType) {
        self.callbacks[kind.index()] = Some(callback);
    }

    /// Remove the callback for a type
    pub fn unregister(&mut self, kind: CallbackType) {
        self.callbacks[kind.index()] = None;
    }

    pub fn enable(&mut self, kind: CallbackType) {
        self.enabled |= 1 << kind.index();
    }

    pub fn disable(&mut self, kind: CallbackType) {
        self.enabled &= !(1 << kind.index());
    }

    pub fn is_registered(&self, kind: CallbackType) -> bool {
        self.callbacks[kind.index()].is_some()
    }

    pub fn is_enabled(&self, kind: CallbackType) -> bool {
        self.enabled & (1 << kind.index()) != 0
    }

    /// Callback to invoke for `kind`, if registered and enabled
    pub fn get(&self, kind: CallbackType) -> Option<Callback<M>> {
        if self.is_enabled(kind) {
            self.callbacks[kind.index()]
        } else {
            None
        }
    }
}

/// Non-blocking I2C master driver
///
/// Job submission returns as soon as the job is queued. Completion is reported
/// through the callbacks registered with [`register_callback`] and enabled with
/// [`enable_callback`].
///
/// Only one job may be in flight at a time; submitting another while
/// [`job_status`] is [`JobStatus::Busy`] fails with [`Error::Busy`].
///
/// [`register_callback`]: I2cMasterJob::register_callback
/// [`enable_callback`]: I2cMasterJob::enable_callback
/// [`job_status`]: I2cMasterJob::job_status
pub trait I2cMasterJob: Sized {
    /// Apply a configuration to the module
    ///
    /// Fails with [`Error::Busy`] while a job is in flight; the new bus
    /// frequency and timeout apply from the next job on. May also fail
    /// transiently for other reasons (e.g. the bus is held by another
    /// master); callers are expected to retry.
    fn init(&mut self, config: &I2cMasterConfig) -> Result<(), Error>;

    /// Enable the module; jobs are rejected with [`Error::Denied`] until then
    fn enable(&mut self);

    /// Disable the module
    fn disable(&mut self);

    /// Register a callback for an event type
    fn register_callback(&mut self, callback: Callback<Self>, kind: CallbackType);

    /// Unregister the callback for an event type
    fn unregister_callback(&mut self, kind: CallbackType);

    /// Allow a registered callback to fire
    fn enable_callback(&mut self, kind: CallbackType);

    /// Stop a registered callback from firing
    fn disable_callback(&mut self, kind: CallbackType);

    /// Submit a non-blocking write
    fn write_packet_job(&mut self, packet: &WritePacket) -> Result<(), Error>;

    /// Submit a non-blocking read
    fn read_packet_job(&mut self, packet: &ReadPacket) -> Result<(), Error>;

    /// Status of the current or last job
    fn job_status(&self) -> JobStatus;

    /// Cancel the job in flight, if any
    fn cancel_job(&mut self);

    /// Address of the most recently submitted job
    fn last_address(&self) -> Option<Address>;

    /// Copy the bytes received by the last finished read into `buf`
    ///
    /// Returns the number of bytes copied.
    fn read_data(&self, buf: &mut [u8]) -> usize;
}
