//! Error type for radio operations
//!
//! Bus waits never fail, they block. The only reportable failures are the
//! ones embedded-hal collaborators return, plus oversize payloads.

use core::fmt;

/// Radio operation error
///
/// `B` is the bus error, `P` the control pin (CSN/CE) error. On the target
/// both are `Infallible`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<B, P> {
    /// Shift-register bus failure
    Bus(B),
    /// Chip-select or chip-enable line failure
    Pin(P),
    /// Payload longer than the TX FIFO slot (carries the rejected length)
    PayloadTooLarge(usize),
}

impl<B: fmt::Debug, P: fmt::Debug> fmt::Display for Error<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus error: {e:?}"),
            Self::Pin(e) => write!(f, "control pin error: {e:?}"),
            Self::PayloadTooLarge(len) => write!(f, "payload of {len} bytes exceeds FIFO slot"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<B, P> defmt::Format for Error<B, P> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(_) => defmt::write!(f, "Bus"),
            Self::Pin(_) => defmt::write!(f, "Pin"),
            Self::PayloadTooLarge(len) => defmt::write!(f, "PayloadTooLarge({})", len),
        }
    }
}
