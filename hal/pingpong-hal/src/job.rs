//! Job queue behind the callback-driven I2C master
//!
//! Jobs are submitted through an [`I2cMaster`] handle, which returns at once.
//! A chip-side engine task owns the peripheral: it takes each job with
//! [`JobQueue::next_job`], runs it, reports the outcome with
//! [`JobQueue::finish`] and hands the resulting callback type to
//! [`JobQueue::dispatch`]. Callbacks therefore run in the engine task and may
//! submit the next job directly.
//!
//! ```text
//!  I2cMaster ──write/read job──▶ JobQueue ──▶ engine ──▶ peripheral
//!      ▲                                        │
//!      └────────── callback(&mut I2cMaster) ◀───┘
//! ```
//!
//! Only `embassy-sync` primitives are used here, so the submission rules can
//! be exercised on the host.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::i2c::{
    Address, Callback, CallbackTable, CallbackType, Error, I2cMasterConfig, I2cMasterJob,
    JobStatus, ReadPacket, WritePacket,
};

/// Largest read the queue can buffer
pub const MAX_READ_LENGTH: usize = 32;

/// A transfer waiting for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Job {
    Write { address: Address, data: &'static [u8] },
    Read { address: Address, len: usize },
}

impl Job {
    pub fn address(&self) -> Address {
        match self {
            Job::Write { address, .. } | Job::Read { address, .. } => *address,
        }
    }
}

struct Shared {
    callbacks: CallbackTable<I2cMaster>,
    status: JobStatus,
    enabled: bool,
    config: I2cMasterConfig,
    /// Set by `init`, taken by the engine before its next job
    config_changed: bool,
    last_address: Option<Address>,
    rx: Vec<u8, MAX_READ_LENGTH>,
}

impl Shared {
    const fn new() -> Self {
        Self {
            callbacks: CallbackTable::new(),
            status: JobStatus::Idle,
            enabled: false,
            config: I2cMasterConfig::STANDARD,
            config_changed: false,
            last_address: None,
            rx: Vec::new(),
        }
    }
}

/// State shared between [`I2cMaster`] handles and the engine
///
/// Meant to live in a `static`.
pub struct JobQueue {
    jobs: Channel<CriticalSectionRawMutex, Job, 1>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
    shared: Mutex<CriticalSectionRawMutex, RefCell<Shared>>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub const fn new() -> Self {
        Self {
            jobs: Channel::new(),
            cancel: Signal::new(),
            shared: Mutex::new(RefCell::new(Shared::new())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        self.shared.lock(|shared| f(&mut shared.borrow_mut()))
    }

    fn submit(&self, job: Job) -> Result<(), Error> {
        self.with(|s| {
            if !s.enabled {
                return Err(Error::Denied);
            }
            if s.status.is_busy() {
                return Err(Error::Busy);
            }
            s.status = JobStatus::Busy;
            s.last_address = Some(job.address());
            Ok(())
        })?;

        if self.jobs.try_send(job).is_err() {
            // Engine has not picked up the previous job yet
            self.with(|s| s.status = JobStatus::Idle);
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Wait for the next submitted job
    pub async fn next_job(&self) -> Job {
        self.jobs.receive().await
    }

    /// Configuration stored by the last `init`, if the engine has not applied it yet
    pub fn take_config_change(&self) -> Option<I2cMasterConfig> {
        self.with(|s| core::mem::take(&mut s.config_changed).then_some(s.config))
    }

    /// Per-transfer timeout of the current configuration
    pub fn timeout_ms(&self) -> u32 {
        self.with(|s| s.config.timeout_ms)
    }

    /// Prepare to run `job`
    ///
    /// Fails with [`Error::Aborted`] if the job was cancelled before the
    /// engine got to it. A read discards the bytes of the previous read.
    pub fn start(&self, job: &Job) -> Result<(), Error> {
        if matches!(job, Job::Read { .. }) {
            self.with(|s| s.rx.clear());
        }
        match self.cancel.try_take() {
            Some(()) => Err(Error::Aborted),
            None => Ok(()),
        }
    }

    /// Resolves once [`I2cMasterJob::cancel_job`] is called
    pub async fn cancelled(&self) {
        self.cancel.wait().await
    }

    /// Drop a cancel request that raced with job completion
    pub fn clear_cancel(&self) {
        self.cancel.reset();
    }

    /// Keep the bytes of a finished read
    pub fn store_read(&self, data: &[u8]) {
        self.with(|s| {
            s.rx.clear();
            // Length was checked against capacity on submission
            let _ = s.rx.extend_from_slice(data);
        });
    }

    /// Record a job outcome and pick the callback type to report it with
    pub fn finish(&self, job: &Job, result: Result<(), Error>) -> CallbackType {
        self.with(|s| match result {
            Ok(()) => {
                s.status = JobStatus::Idle;
                match job {
                    Job::Write { .. } => CallbackType::WriteComplete,
                    Job::Read { .. } => CallbackType::ReadComplete,
                }
            }
            Err(e) => {
                s.status = JobStatus::Failed(e);
                if matches!(job, Job::Read { .. }) {
                    s.rx.clear();
                }
                CallbackType::Error
            }
        })
    }

    /// Invoke the callback for `kind` if it is registered and enabled
    pub fn dispatch(&'static self, kind: CallbackType) {
        // Copied out so the callback runs without the lock held
        let callback = self.with(|s| s.callbacks.get(kind));
        if let Some(callback) = callback {
            let mut master = I2cMaster::new(self);
            callback(&mut master);
        }
    }
}

/// Job submission handle
///
/// Cheap to copy; every copy talks to the same [`JobQueue`].
#[derive(Clone, Copy)]
pub struct I2cMaster {
    queue: &'static JobQueue,
}

impl I2cMaster {
    pub fn new(queue: &'static JobQueue) -> Self {
        Self { queue }
    }
}

impl I2cMasterJob for I2cMaster {
    fn init(&mut self, config: &I2cMasterConfig) -> Result<(), Error> {
        config.validate()?;
        self.queue.with(|s| {
            if s.status.is_busy() {
                return Err(Error::Busy);
            }
            s.config = *config;
            s.config_changed = true;
            Ok(())
        })
    }

    fn enable(&mut self) {
        self.queue.with(|s| s.enabled = true);
    }

    fn disable(&mut self) {
        self.queue.with(|s| s.enabled = false);
    }

    fn register_callback(&mut self, callback: Callback<Self>, kind: CallbackType) {
        self.queue.with(|s| s.callbacks.register(callback, kind));
    }

    fn unregister_callback(&mut self, kind: CallbackType) {
        self.queue.with(|s| s.callbacks.unregister(kind));
    }

    fn enable_callback(&mut self, kind: CallbackType) {
        self.queue.with(|s| s.callbacks.enable(kind));
    }

    fn disable_callback(&mut self, kind: CallbackType) {
        self.queue.with(|s| s.callbacks.disable(kind));
    }

    fn write_packet_job(&mut self, packet: &WritePacket) -> Result<(), Error> {
        if packet.data.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let job = Job::Write {
            address: packet.address,
            data: packet.data,
        };
        self.queue.submit(job).inspect_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Write job to {=u8:#x} rejected: {}", packet.address.raw(), _e);
        })
    }

    fn read_packet_job(&mut self, packet: &ReadPacket) -> Result<(), Error> {
        if packet.data_length == 0 || packet.data_length > MAX_READ_LENGTH {
            return Err(Error::InvalidArgument);
        }
        let job = Job::Read {
            address: packet.address,
            len: packet.data_length,
        };
        self.queue.submit(job).inspect_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Read job from {=u8:#x} rejected: {}", packet.address.raw(), _e);
        })
    }

    fn job_status(&self) -> JobStatus {
        self.queue.with(|s| s.status)
    }

    fn cancel_job(&mut self) {
        if self.job_status().is_busy() {
            self.queue.cancel.signal(());
        }
    }

    fn last_address(&self) -> Option<Address> {
        self.queue.with(|s| s.last_address)
    }

    fn read_data(&self, buf: &mut [u8]) -> usize {
        self.queue.with(|s| {
            let len = s.rx.len().min(buf.len());
            buf[..len].copy_from_slice(&s.rx[..len]);
            len
        })
    }
}
