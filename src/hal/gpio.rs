//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the probe board.
//! Provides semantic meaning to pins through the type system.

use embassy_stm32::gpio::{Level, Output};
use embedded_hal::digital::PinState;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a status LED, switched on to show the board is alive
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        let mut led = Self {
            pin,
            state: LedState::Off,
        };
        led.on();
        led
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.pin.set_high();
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.pin.set_low();
        self.state = LedState::Off;
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        match self.state.toggle() {
            LedState::On => self.on(),
            LedState::Off => self.off(),
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Software UART output line
///
/// Driven only from the tick interrupt. Starts at the idle (high) level.
pub struct SerialLine<'d> {
    pin: Output<'d>,
}

impl<'d> SerialLine<'d> {
    /// Take the TX pin and drive it idle high
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_high();
        Self { pin }
    }

    /// Drive one bit level
    pub fn drive(&mut self, level: PinState) {
        self.pin.set_level(match level {
            PinState::High => Level::High,
            PinState::Low => Level::Low,
        });
    }
}
