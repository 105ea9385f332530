//! nRF24L01+ Probe Main Application
//!
//! Entry point for the STM32G474-based radio probe.
//! Brings up the tick interrupt, the bus and the radio, then runs the
//! probe cycle forever while a task blinks the status LED.

#![no_std]
#![no_main]

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::InterruptExt;
use {defmt_rtt as _, panic_probe as _};

use nrf24_probe::hal::gpio::{SerialLine, StatusLed};
use nrf24_probe::hal::timer::TickTimer;
use nrf24_probe::prelude::*;
use nrf24_probe::probe;

/// Serial bit clock and time base, advanced by `TIM7_DAC`
static TICK: TickShared = TickShared::new();

/// Peripherals owned by the tick interrupt
struct TickHardware {
    timer: TickTimer,
    line: SerialLine<'static>,
}

static TICK_HW: Mutex<RefCell<Option<TickHardware>>> = Mutex::new(RefCell::new(None));

#[interrupt]
#[allow(non_snake_case)]
unsafe fn TIM7_DAC() {
    critical_section::with(|cs| {
        if let Some(hw) = TICK_HW.borrow_ref_mut(cs).as_mut() {
            hw.timer.acknowledge();
            if let Some(level) = TICK.on_tick() {
                hw.line.drive(level);
            }
        }
    });
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("nRF24 probe v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

    // Serial line idles high before the timer starts clocking it
    let line = SerialLine::new(Output::new(p.PA9, Level::High, Speed::Medium));
    let timer = TickTimer::new(p.TIM7, TICK_RATE_HZ);
    timer.start();
    info!("{} driving serial at ~{} baud", timer, NOMINAL_BAUD);
    critical_section::with(|cs| {
        TICK_HW.borrow_ref_mut(cs).replace(TickHardware { timer, line });
    });
    interrupt::TIM7_DAC.unpend();
    // SAFETY: the handler only touches `TICK` and `TICK_HW`, both guarded by
    // critical sections, and `TICK_HW` is populated above.
    unsafe { interrupt::TIM7_DAC.enable() };

    let sck = Output::new(p.PB3, Level::Low, Speed::VeryHigh);
    let mosi = Output::new(p.PB5, Level::Low, Speed::VeryHigh);
    let miso = Input::new(p.PB4, Pull::Up);
    let csn = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let ce = Output::new(p.PA8, Level::Low, Speed::VeryHigh);

    let Ok(usi) = SoftShiftRegister::new(sck, mosi, miso);
    let Ok(mut radio) = Nrf24::new(UsiBus::new(usi), csn, ce, Delay);

    info!("Radio bus ready");

    spawner.spawn(heartbeat_task(led)).unwrap();

    let cfg = ProbeConfig::default();
    let mut serial = TICK.serial();
    let mut cycle: u32 = 0;

    loop {
        cycle = cycle.wrapping_add(1);
        match probe::run_cycle(&mut radio, &mut serial, &cfg) {
            Ok(report) => match report.tx.outcome() {
                TxOutcome::Sent => info!("cycle {}: {}", cycle, report),
                TxOutcome::RetriesExhausted => warn!("cycle {}: no ack, {}", cycle, report),
            },
            Err(e) => error!("cycle {}: {}", cycle, e),
        }
        Timer::after(Duration::from_millis(CYCLE_PAUSE_MS)).await;
    }
}

/// Heartbeat task - toggles the LED off the tick time base
#[embassy_executor::task]
async fn heartbeat_task(mut led: StatusLed<'static>) {
    let mut blink = Interval::new(HEARTBEAT_MS);
    loop {
        if blink.check(TICK.now_ms()) {
            led.toggle();
            trace!("heartbeat {} at {}ms", led.state(), blink.last());
        }
        Timer::after(Duration::from_millis(HEARTBEAT_POLL_MS)).await;
    }
}
