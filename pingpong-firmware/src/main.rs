//! Pingpong I2C callback example firmware
//!
//! Runs on an STM32F042K6 board. Each press of the button on PA1 writes one of
//! two 10-byte sequences to the slave on I2C1 (PB6=SCL, PB7=SDA). The write is
//! non-blocking; when it completes, a callback reads the same number of bytes
//! back from the slave, and a second callback logs what came back.

#![no_std]
#![no_main]

mod config;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::gpio::Input;
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals::I2C1;
use embassy_time::Timer;
use portable_atomic::{AtomicU32, Ordering};
use {defmt_rtt as _, panic_probe as _};

use pingpong_core::{PingPong, DATA_LENGTH};
use pingpong_hal::i2c::{Address, CallbackType, I2cMasterJob};
use pingpong_hal::job::{I2cMaster, JobQueue};
use pingpong_hal_stm32f0::gpio::{input_pull, ButtonInput};
use pingpong_hal_stm32f0::i2c::{peripheral_config, JobEngine};

bind_interrupts!(struct Irqs {
    I2C1 => i2c::EventInterruptHandler<I2C1>, i2c::ErrorInterruptHandler<I2C1>;
});

/// Shared state of the I2C master driver
static JOB_QUEUE: JobQueue = JobQueue::new();

/// Completed write/read round trips
static ROUND_TRIPS: AtomicU32 = AtomicU32::new(0);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pingpong firmware starting...");

    // Default clock tree (HSI, no PLL) is enough for a 100-400 kHz bus
    let p = embassy_stm32::init(Default::default());

    // Setup button (PA1, active low)
    let button = ButtonInput::new(Input::new(p.PA1, input_pull(&config::BUTTON_PIN)));

    // Setup I2C for the slave (PB6=SCL, PB7=SDA)
    let i2c = I2c::new(
        p.I2C1,
        p.PB6,
        p.PB7,
        Irqs,
        p.DMA1_CH2,
        p.DMA1_CH3,
        peripheral_config(&config::I2C_MASTER),
    );
    spawner
        .spawn(i2c_engine_task(JobEngine::new(i2c, &JOB_QUEUE)))
        .unwrap();

    let address = unwrap!(Address::new(config::SLAVE_ADDRESS));
    let mut app = PingPong::new(I2cMaster::new(&JOB_QUEUE), button, address);

    match app.configure(&config::I2C_MASTER) {
        Ok(attempts) => info!("I2C master enabled after {} init attempt(s)", attempts),
        Err(e) => {
            error!("I2C master configuration rejected: {}", e);
            loop {
                Timer::after_secs(60).await;
            }
        }
    }

    // Reporting callbacks on top of the write-complete chain
    let master = app.module_mut();
    master.register_callback(read_complete, CallbackType::ReadComplete);
    master.enable_callback(CallbackType::ReadComplete);
    master.register_callback(job_failed, CallbackType::Error);
    master.enable_callback(CallbackType::Error);

    info!("Press the button to send a packet to {=u8:#x}", address.raw());

    loop {
        match app.poll() {
            Ok(Some(buffer)) => debug!("Write job submitted: {} buffer", buffer),
            Ok(None) => {}
            Err(e) => warn!("Write job not submitted: {}", e),
        }

        Timer::after_millis(config::POLL_INTERVAL_MS).await;
    }
}

/// Runs I2C jobs and their completion callbacks
#[embassy_executor::task]
async fn i2c_engine_task(engine: JobEngine<'static>) {
    info!("I2C job engine started");
    engine.run().await
}

/// Read-complete callback: log the echoed bytes
fn read_complete(master: &mut I2cMaster) {
    let mut data = [0u8; DATA_LENGTH];
    let len = master.read_data(&mut data);
    let count = ROUND_TRIPS.fetch_add(1, Ordering::Relaxed) + 1;

    info!("Round trip {}: read {=[u8]:x}", count, &data[..len]);
}

/// Error callback: log the failed job
fn job_failed(master: &mut I2cMaster) {
    warn!("I2C job failed: {}", master.job_status());
}
