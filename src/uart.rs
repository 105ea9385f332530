//! Software UART transmitter
//!
//! An 8N1 transmitter clocked by the shared timer interrupt: every tick
//! emits exactly one bit. The line idles high, a frame is one low start
//! bit, eight data bits least significant first, and one high stop bit.
//!
//! The bit state machine ([`TxFrame`]) is advanced from the interrupt.
//! The main context queues bytes through [`SerialTx`], which spins until
//! the previous frame has left the line.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::PinState;

use crate::tick::TickShared;

/// Bit periods per frame (start + 8 data + stop)
pub const FRAME_BITS: u8 = 10;

/// Per-bit transmitter state
///
/// `bit_index` and `shift` only carry meaning while `busy` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TxFrame {
    busy: bool,
    bit_index: u8,
    shift: u8,
}

impl TxFrame {
    /// Idle transmitter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: false,
            bit_index: 0,
            shift: 0,
        }
    }

    /// A frame is on the line
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Next bit to be emitted (0 = start bit)
    #[must_use]
    pub const fn bit_index(&self) -> u8 {
        self.bit_index
    }

    /// Start a new frame. Returns false, leaving the state untouched, while
    /// a previous frame is still in flight.
    pub fn load(&mut self, byte: u8) -> bool {
        if self.busy {
            return false;
        }
        self.shift = byte;
        self.bit_index = 0;
        self.busy = true;
        true
    }

    /// Advance one bit period.
    ///
    /// Returns the level to drive onto the line, or `None` when idle (the
    /// line keeps the level of the last stop bit).
    pub fn tick(&mut self) -> Option<PinState> {
        if !self.busy {
            return None;
        }

        let level = match self.bit_index {
            0 => PinState::Low,
            1..=8 => {
                let bit = PinState::from(self.shift & 1 != 0);
                self.shift >>= 1;
                bit
            }
            _ => {
                self.busy = false;
                PinState::High
            }
        };
        self.bit_index = self.bit_index.saturating_add(1);
        Some(level)
    }
}

/// Main-context handle to the transmitter
///
/// Every write blocks until the transmitter is idle before handing the byte
/// to the interrupt, so at most one frame is ever in flight. Never call
/// these from the tick interrupt itself, and never keep interrupts masked
/// for longer than a bit period while a byte is outstanding: the wait has
/// no timeout.
pub struct SerialTx<'a> {
    shared: &'a TickShared,
}

impl<'a> SerialTx<'a> {
    /// Create a writer over the shared tick state
    #[must_use]
    pub const fn new(shared: &'a TickShared) -> Self {
        Self { shared }
    }

    /// Queue a byte if the transmitter is idle
    pub fn try_write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if self.shared.try_queue(byte) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Wait for the transmitter, then queue one byte.
    ///
    /// Returns as soon as the frame has started; it completes in the
    /// background over the next [`FRAME_BITS`] ticks.
    pub fn send_byte(&mut self, byte: u8) {
        nb::block!(self.try_write(byte)).unwrap_or_else(|never| match never {});
    }

    /// Send every byte of `s`, one blocking [`SerialTx::send_byte`] at a time
    pub fn send_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.send_byte(byte);
        }
    }

    /// Wait until the last queued frame has been fully emitted
    pub fn flush(&mut self) {
        while self.shared.tx_busy() {
            core::hint::spin_loop();
        }
    }
}

impl fmt::Write for SerialTx<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send_str(s);
        Ok(())
    }
}
