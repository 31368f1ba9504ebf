//! Callback-driven I2C master for STM32F0
//!
//! Submission goes through the chip-independent [`JobQueue`] and its
//! `I2cMaster` handle from `pingpong_hal::job`. [`JobEngine`] is the chip
//! half: it owns the peripheral, runs each queued job with embassy's async
//! I2C driver and hands the outcome back to the queue, which invokes the
//! matching callback.

use embassy_embedded_hal::SetConfig;
use embassy_futures::select::{select, Either};
use embassy_stm32::i2c::{Config, Error as I2cError, I2c, Master};
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_time::{with_timeout, Duration, TimeoutError};

use pingpong_hal::i2c::{Error, I2cMasterConfig};
use pingpong_hal::job::{Job, JobQueue, MAX_READ_LENGTH};

/// Convert an embassy I2C error
pub fn convert_error(e: I2cError) -> Error {
    match e {
        I2cError::Timeout => Error::Timeout,
        other => embedded_hal::i2c::Error::kind(&other).into(),
    }
}

/// Build the embassy peripheral configuration for a master config
pub fn peripheral_config(config: &I2cMasterConfig) -> Config {
    let mut i2c_config = Config::default();
    i2c_config.frequency = Hertz(config.frequency);
    i2c_config.timeout = Duration::from_millis(config.timeout_ms as u64);
    i2c_config
}

/// Runs queued jobs on the I2C peripheral
pub struct JobEngine<'d> {
    i2c: I2c<'d, Async, Master>,
    queue: &'static JobQueue,
}

impl<'d> JobEngine<'d> {
    pub fn new(i2c: I2c<'d, Async, Master>, queue: &'static JobQueue) -> Self {
        Self { i2c, queue }
    }

    /// Serve jobs forever
    ///
    /// Run this from a dedicated task.
    pub async fn run(mut self) -> ! {
        loop {
            let job = self.queue.next_job().await;

            // `init` only succeeds between jobs, so the new rate lands here
            if let Some(config) = self.queue.take_config_change() {
                self.apply(&config);
            }

            let result = match self.queue.start(&job) {
                Ok(()) => self.execute(job).await,
                Err(e) => Err(e),
            };
            self.queue.clear_cancel();

            #[cfg(feature = "defmt")]
            {
                if let Err(e) = result {
                    defmt::warn!("I2C job {} failed: {}", job, e);
                }
            }

            let kind = self.queue.finish(&job, result);
            self.queue.dispatch(kind);
        }
    }

    fn apply(&mut self, config: &I2cMasterConfig) {
        if self.i2c.set_config(&Hertz(config.frequency)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("I2C bus frequency {} Hz not applied", config.frequency);
        }
    }

    async fn execute(&mut self, job: Job) -> Result<(), Error> {
        let queue = self.queue;
        let timeout = Duration::from_millis(queue.timeout_ms() as u64);

        match job {
            Job::Write { address, data } => {
                let transfer = with_timeout(timeout, self.i2c.write(address.raw(), data));
                settle(select(transfer, queue.cancelled()).await)
            }
            Job::Read { address, len } => {
                let mut buf = [0u8; MAX_READ_LENGTH];
                let transfer =
                    with_timeout(timeout, self.i2c.read(address.raw(), &mut buf[..len]));
                settle(select(transfer, queue.cancelled()).await)?;
                queue.store_read(&buf[..len]);
                Ok(())
            }
        }
    }
}

fn settle(outcome: Either<Result<Result<(), I2cError>, TimeoutError>, ()>) -> Result<(), Error> {
    match outcome {
        Either::First(Ok(Ok(()))) => Ok(()),
        Either::First(Ok(Err(e))) => Err(convert_error(e)),
        Either::First(Err(TimeoutError)) => Err(Error::Timeout),
        Either::Second(()) => Err(Error::Aborted),
    }
}
