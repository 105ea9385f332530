//! Shared periodic tick state
//!
//! One hardware timer serves two logical clocks: the serial bit clock and
//! the millisecond time base. Both live in a single [`TickShared`] block
//! owned by a `static`, advanced from the timer interrupt through
//! [`TickShared::on_tick`].
//!
//! # Access discipline
//!
//! All state sits behind a `critical_section::Mutex`. Every access, from
//! the interrupt or from the main loop, runs inside
//! `critical_section::with`, which on the target masks interrupts and
//! restores the previous mask afterwards. That makes the 64-bit millisecond
//! read atomic with respect to the interrupt's update, and makes the
//! check-and-load of the transmitter a single step. The sections are a
//! handful of instructions long, well under one bit period.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::PinState;

use crate::timebase::TimeBase;
use crate::uart::{SerialTx, TxFrame};

#[derive(Debug)]
struct TickState {
    frame: TxFrame,
    time: TimeBase,
}

/// State shared between the tick interrupt and the main context
pub struct TickShared {
    state: Mutex<RefCell<TickState>>,
}

impl TickShared {
    /// Shared block for the default tick period
    #[must_use]
    pub const fn new() -> Self {
        Self::with_time_base(TimeBase::new())
    }

    /// Shared block around an explicit time base
    #[must_use]
    pub const fn with_time_base(time: TimeBase) -> Self {
        Self {
            state: Mutex::new(RefCell::new(TickState {
                frame: TxFrame::new(),
                time,
            })),
        }
    }

    /// Interrupt entry point, call once per timer period.
    ///
    /// Advances the bit clock first, then the time base. Returns the level
    /// the caller must drive onto the serial line, if any.
    pub fn on_tick(&self) -> Option<PinState> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let level = state.frame.tick();
            state.time.advance();
            level
        })
    }

    /// Milliseconds since start-up
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        critical_section::with(|cs| self.state.borrow_ref(cs).time.millis())
    }

    /// A serial frame is still being clocked out
    #[must_use]
    pub fn tx_busy(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).frame.is_busy())
    }

    /// Hand a byte to the transmitter if it is idle
    pub fn try_queue(&self, byte: u8) -> bool {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).frame.load(byte))
    }

    /// Blocking serial writer over this block
    #[must_use]
    pub const fn serial(&self) -> SerialTx<'_> {
        SerialTx::new(self)
    }
}

impl Default for TickShared {
    fn default() -> Self {
        Self::new()
    }
}
