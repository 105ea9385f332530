//! Tick Timer
//!
//! The basic timer that paces the software UART and the time base. It runs
//! free at [`TICK_RATE_HZ`](crate::config::TICK_RATE_HZ) and raises its update
//! interrupt once per period; the interrupt handler must acknowledge it
//! before calling [`TickShared::on_tick`](crate::tick::TickShared::on_tick).

use embassy_stm32::peripherals::TIM7;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::Timer;

/// Periodic update-interrupt source on TIM7
pub struct TickTimer {
    timer: Timer<'static, TIM7>,
    rate_hz: u32,
}

impl TickTimer {
    /// Configure TIM7 for `rate_hz` update events (not yet started)
    #[must_use]
    pub fn new(tim: TIM7, rate_hz: u32) -> Self {
        let timer = Timer::new(tim);
        timer.stop();
        timer.set_frequency(Hertz(rate_hz));
        timer.clear_update_interrupt();
        timer.enable_update_interrupt(true);
        Self { timer, rate_hz }
    }

    /// Start counting
    pub fn start(&self) {
        self.timer.reset();
        self.timer.start();
    }

    /// Clear the pending update flag, returns whether it was set
    pub fn acknowledge(&self) -> bool {
        self.timer.clear_update_interrupt()
    }

    /// Tick period in microseconds
    #[must_use]
    pub const fn period_us(&self) -> u32 {
        1_000_000 / self.rate_hz
    }
}

impl defmt::Format for TickTimer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TickTimer({}Hz, {}us)", self.rate_hz, self.period_us());
    }
}
