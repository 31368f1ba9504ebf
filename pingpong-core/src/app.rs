//! Application loop and completion callback
//!
//! Each accepted button press sends one of the two write buffers to the slave.
//! When the write finishes, the driver invokes [`on_write_complete`], which
//! reads the same number of bytes back from the slave.

use pingpong_hal::gpio::InputPin;
use pingpong_hal::i2c::{
    Address, CallbackType, Error, I2cMasterConfig, I2cMasterJob, ReadPacket, WritePacket,
};

use crate::buffers::{WriteBuffer, DATA_LENGTH};
use crate::button::Button;

/// Slave address used when none is configured
pub const DEFAULT_SLAVE_ADDRESS: u8 = 0x12;

/// Example application state
pub struct PingPong<M, P> {
    module: M,
    button: Button<P>,
    wr_packet: WritePacket,
}

impl<M: I2cMasterJob, P: InputPin> PingPong<M, P> {
    /// Create the application; the write packet starts on the forward buffer
    pub fn new(module: M, button: P, address: Address) -> Self {
        Self {
            module,
            button: Button::new(button),
            wr_packet: WritePacket::new(address, WriteBuffer::Forward.data()),
        }
    }

    /// Bring up the I2C module
    ///
    /// Initializes the module (retrying until it succeeds), enables it, and
    /// registers and enables the write-complete callback. Returns the number of
    /// init attempts. An invalid configuration is rejected up front since no
    /// number of retries would make it succeed.
    ///
    /// Call this before the first press. The driver refuses `init` with
    /// [`Error::Busy`] while a job is in flight, and the retry loop never
    /// yields, so reconfiguring from the task the engine waits on would hang.
    pub fn configure(&mut self, config: &I2cMasterConfig) -> Result<u32, Error> {
        config.validate()?;

        let attempts = init_with_retry(&mut self.module, config);
        self.module.enable();

        self.module
            .register_callback(on_write_complete::<M>, CallbackType::WriteComplete);
        self.module.enable_callback(CallbackType::WriteComplete);

        Ok(attempts)
    }

    /// Run one iteration of the polling loop
    ///
    /// On an accepted press, switches the write packet to the other buffer and
    /// submits a write job. Returns the buffer submitted. A rejected job keeps
    /// the switch, so the next press alternates again.
    pub fn poll(&mut self) -> Result<Option<WriteBuffer>, Error> {
        if !self.button.poll() {
            return Ok(None);
        }

        let next = WriteBuffer::after(self.wr_packet.data);
        self.wr_packet.data = next.data();

        self.module.write_packet_job(&self.wr_packet)?;
        Ok(Some(next))
    }

    /// Buffer the write packet currently references
    pub fn current_buffer(&self) -> WriteBuffer {
        WriteBuffer::after(self.wr_packet.data).toggled()
    }

    pub fn write_packet(&self) -> &WritePacket {
        &self.wr_packet
    }

    /// Read job [`on_write_complete`] submits after a write to the slave
    pub fn read_packet(&self) -> ReadPacket {
        read_back_packet(self.wr_packet.address)
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }
}

/// Initialize `module`, retrying until it reports success
///
/// Returns the number of attempts. Spins without yielding; see
/// [`PingPong::configure`].
pub fn init_with_retry<M: I2cMasterJob>(module: &mut M, config: &I2cMasterConfig) -> u32 {
    let mut attempts = 0;
    loop {
        attempts += 1;
        if module.init(config).is_ok() {
            return attempts;
        }
    }
}

/// Read as many bytes back from `address` as a write sends
pub const fn read_back_packet(address: Address) -> ReadPacket {
    ReadPacket::new(address, DATA_LENGTH)
}

/// Write-complete callback: read back from the address just written
pub fn on_write_complete<M: I2cMasterJob>(module: &mut M) {
    if let Some(address) = module.last_address() {
        // Rejections are visible through the driver's job status and logs
        let _ = module.read_packet_job(&read_back_packet(address));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{WR_BUFFER, WR_BUFFER_REVERSED};
    use core::cell::Cell;
    use pingpong_hal::i2c::{Callback, CallbackTable, JobStatus};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Job {
        Write(u8, &'static [u8]),
        Read(u8, usize),
    }

    /// I2C module talking to an echo slave
    ///
    /// Jobs stay pending until the test calls `complete` or `fail`, which play
    /// the role of the completion interrupt.
    struct MockMaster {
        init_failures: u32,
        init_calls: u32,
        enabled: bool,
        callbacks: CallbackTable<MockMaster>,
        status: JobStatus,
        pending: Option<Job>,
        jobs: heapless::Vec<Job, 16>,
        last_address: Option<Address>,
        slave_memory: [u8; DATA_LENGTH],
        rx: [u8; DATA_LENGTH],
        rx_len: usize,
        read_completions: u32,
        errors: u32,
    }

    impl MockMaster {
        fn new() -> Self {
            Self::failing_init(0)
        }

        fn failing_init(init_failures: u32) -> Self {
            Self {
                init_failures,
                init_calls: 0,
                enabled: false,
                callbacks: CallbackTable::new(),
                status: JobStatus::Idle,
                pending: None,
                jobs: heapless::Vec::new(),
                last_address: None,
                slave_memory: [0; DATA_LENGTH],
                rx: [0; DATA_LENGTH],
                rx_len: 0,
                read_completions: 0,
                errors: 0,
            }
        }

        fn submit(&mut self, address: Address, job: Job) -> Result<(), Error> {
            if !self.enabled {
                return Err(Error::Denied);
            }
            if self.status.is_busy() {
                return Err(Error::Busy);
            }
            self.status = JobStatus::Busy;
            self.pending = Some(job);
            self.last_address = Some(address);
            self.jobs.push(job).map_err(|_| Error::Overflow)
        }

        fn complete(&mut self) {
            let Some(job) = self.pending.take() else {
                return;
            };
            self.status = JobStatus::Idle;
            match job {
                Job::Write(_, data) => {
                    self.slave_memory[..data.len()].copy_from_slice(data);
                    self.fire(CallbackType::WriteComplete);
                }
                Job::Read(_, len) => {
                    self.rx[..len].copy_from_slice(&self.slave_memory[..len]);
                    self.rx_len = len;
                    self.fire(CallbackType::ReadComplete);
                }
            }
        }

        fn fail(&mut self, error: Error) {
            if self.pending.take().is_some() {
                self.status = JobStatus::Failed(error);
                self.fire(CallbackType::Error);
            }
        }

        fn fire(&mut self, kind: CallbackType) {
            if let Some(callback) = self.callbacks.get(kind) {
                callback(self);
            }
        }
    }

    impl I2cMasterJob for MockMaster {
        fn init(&mut self, config: &I2cMasterConfig) -> Result<(), Error> {
            self.init_calls += 1;
            config.validate()?;
            if self.init_calls <= self.init_failures {
                return Err(Error::Busy);
            }
            Ok(())
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn register_callback(&mut self, callback: Callback<Self>, kind: CallbackType) {
            self.callbacks.register(callback, kind);
        }

        fn unregister_callback(&mut self, kind: CallbackType) {
            self.callbacks.unregister(kind);
        }

        fn enable_callback(&mut self, kind: CallbackType) {
            self.callbacks.enable(kind);
        }

        fn disable_callback(&mut self, kind: CallbackType) {
            self.callbacks.disable(kind);
        }

        fn write_packet_job(&mut self, packet: &WritePacket) -> Result<(), Error> {
            if packet.data.is_empty() {
                return Err(Error::InvalidArgument);
            }
            self.submit(
                packet.address,
                Job::Write(packet.address.raw(), packet.data),
            )
        }

        fn read_packet_job(&mut self, packet: &ReadPacket) -> Result<(), Error> {
            if packet.data_length == 0 || packet.data_length > DATA_LENGTH {
                return Err(Error::InvalidArgument);
            }
            self.submit(
                packet.address,
                Job::Read(packet.address.raw(), packet.data_length),
            )
        }

        fn job_status(&self) -> JobStatus {
            self.status
        }

        fn cancel_job(&mut self) {
            self.fail(Error::Aborted);
        }

        fn last_address(&self) -> Option<Address> {
            self.last_address
        }

        fn read_data(&self, buf: &mut [u8]) -> usize {
            let len = self.rx_len.min(buf.len());
            buf[..len].copy_from_slice(&self.rx[..len]);
            len
        }
    }

    /// Button driven by the test through a shared cell
    struct TestButton<'a>(&'a Cell<bool>);

    impl InputPin for TestButton<'_> {
        fn is_high(&self) -> bool {
            self.0.get()
        }
    }

    fn address() -> Address {
        Address::new(DEFAULT_SLAVE_ADDRESS).unwrap()
    }

    /// Press and release the button, returning the result of the release poll
    fn press(
        app: &mut PingPong<MockMaster, TestButton<'_>>,
        level: &Cell<bool>,
    ) -> Result<Option<WriteBuffer>, Error> {
        level.set(false);
        assert_eq!(app.poll(), Ok(None));
        level.set(true);
        app.poll()
    }

    fn count_read_complete(module: &mut MockMaster) {
        module.read_completions += 1;
    }

    fn count_error(module: &mut MockMaster) {
        module.errors += 1;
    }

    #[test]
    fn test_configure_retries_init() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::failing_init(3), TestButton(&level), address());

        assert_eq!(app.configure(&I2cMasterConfig::default()), Ok(4));
        assert_eq!(app.module().init_calls, 4);
        assert!(app.module().enabled);
        assert!(app.module().callbacks.is_registered(CallbackType::WriteComplete));
        assert!(app.module().callbacks.is_enabled(CallbackType::WriteComplete));
        assert!(!app.module().callbacks.is_enabled(CallbackType::ReadComplete));
    }

    #[test]
    fn test_configure_rejects_invalid_config() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        let config = I2cMasterConfig {
            frequency: 0,
            ..I2cMasterConfig::STANDARD
        };

        assert_eq!(app.configure(&config), Err(Error::InvalidArgument));
        assert_eq!(app.module().init_calls, 0);
        assert!(!app.module().enabled);
    }

    #[test]
    fn test_packets_target_slave_address() {
        let level = Cell::new(true);
        let app = PingPong::new(MockMaster::new(), TestButton(&level), address());

        assert_eq!(app.write_packet().address.raw(), 0x12);
        assert_eq!(app.write_packet().data_length(), DATA_LENGTH);
        assert_eq!(app.read_packet().address.raw(), 0x12);
        assert_eq!(app.read_packet().data_length, DATA_LENGTH);
        assert_eq!(app.current_buffer(), WriteBuffer::Forward);
    }

    #[test]
    fn test_no_press_no_job() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();

        for _ in 0..10 {
            assert_eq!(app.poll(), Ok(None));
        }
        assert!(app.module().jobs.is_empty());
    }

    #[test]
    fn test_presses_alternate_buffers() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();

        // Starts on forward, so the first press sends the reversed buffer
        assert_eq!(press(&mut app, &level), Ok(Some(WriteBuffer::Reversed)));
        app.module_mut().complete(); // write
        app.module_mut().complete(); // chained read

        assert_eq!(press(&mut app, &level), Ok(Some(WriteBuffer::Forward)));
        app.module_mut().complete();
        app.module_mut().complete();

        let jobs = &app.module().jobs;
        assert_eq!(
            jobs.as_slice(),
            &[
                Job::Write(0x12, &WR_BUFFER_REVERSED[..]),
                Job::Read(0x12, DATA_LENGTH),
                Job::Write(0x12, &WR_BUFFER[..]),
                Job::Read(0x12, DATA_LENGTH),
            ]
        );
    }

    #[test]
    fn test_write_complete_chains_read() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();
        app.module_mut()
            .register_callback(count_read_complete, CallbackType::ReadComplete);
        app.module_mut().enable_callback(CallbackType::ReadComplete);

        press(&mut app, &level).unwrap();
        assert_eq!(app.module().job_status(), JobStatus::Busy);

        // Write finishes; the callback queues the app's read descriptor
        app.module_mut().complete();
        let read = app.read_packet();
        assert_eq!(
            app.module().pending,
            Some(Job::Read(read.address.raw(), read.data_length))
        );

        // Read finishes with the echoed data
        app.module_mut().complete();
        assert_eq!(app.module().job_status(), JobStatus::Idle);
        assert_eq!(app.module().read_completions, 1);

        let mut data = [0u8; DATA_LENGTH];
        assert_eq!(app.module().read_data(&mut data), DATA_LENGTH);
        assert_eq!(data, WR_BUFFER_REVERSED);
    }

    #[test]
    fn test_press_while_busy_is_rejected_but_still_toggles() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();

        assert_eq!(press(&mut app, &level), Ok(Some(WriteBuffer::Reversed)));
        // Write still pending
        assert_eq!(press(&mut app, &level), Err(Error::Busy));
        assert_eq!(app.current_buffer(), WriteBuffer::Forward);

        app.module_mut().complete();
        app.module_mut().complete();

        assert_eq!(press(&mut app, &level), Ok(Some(WriteBuffer::Reversed)));
        assert_eq!(app.module().jobs.len(), 3);
    }

    #[test]
    fn test_failed_write_does_not_read() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();
        app.module_mut().register_callback(count_error, CallbackType::Error);
        app.module_mut().enable_callback(CallbackType::Error);

        press(&mut app, &level).unwrap();
        app.module_mut().fail(Error::BadAddress);

        assert_eq!(app.module().job_status(), JobStatus::Failed(Error::BadAddress));
        assert_eq!(app.module().errors, 1);
        assert!(app.module().pending.is_none());
        assert_eq!(app.module().jobs.len(), 1);
        assert_eq!(app.module().read_data(&mut [0u8; DATA_LENGTH]), 0);
    }

    #[test]
    fn test_cancelled_write_does_not_read() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();

        press(&mut app, &level).unwrap();
        app.module_mut().cancel_job();

        assert_eq!(app.module().job_status(), JobStatus::Failed(Error::Aborted));
        assert_eq!(app.module().jobs.len(), 1);
    }

    #[test]
    fn test_disabled_callback_does_not_read() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());
        app.configure(&I2cMasterConfig::default()).unwrap();
        app.module_mut().disable_callback(CallbackType::WriteComplete);

        press(&mut app, &level).unwrap();
        app.module_mut().complete();

        assert!(app.module().pending.is_none());
        assert_eq!(app.module().jobs.len(), 1);
    }

    #[test]
    fn test_press_before_enable_is_denied() {
        let level = Cell::new(true);
        let mut app = PingPong::new(MockMaster::new(), TestButton(&level), address());

        assert_eq!(press(&mut app, &level), Err(Error::Denied));
        assert!(app.module().jobs.is_empty());
    }

    #[test]
    fn test_on_write_complete_without_address() {
        let mut module = MockMaster::new();
        module.enable();

        on_write_complete(&mut module);
        assert!(module.jobs.is_empty());
    }
}
