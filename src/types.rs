//! Shared types used across the probe firmware
//!
//! Small value types that keep radio parameters inside the ranges the
//! transceiver accepts.

use core::fmt;

/// Largest payload the nRF24L01+ TX FIFO accepts per packet
pub const MAX_PAYLOAD: usize = 32;

/// Width of a pipe address in bytes
pub const ADDRESS_WIDTH: usize = 5;

/// Packet payload, at most [`MAX_PAYLOAD`] bytes
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD>;

/// Build a payload of `len` copies of `fill` (truncated to [`MAX_PAYLOAD`])
#[must_use]
pub fn filled_payload(fill: u8, len: usize) -> Payload {
    let mut payload = Payload::new();
    for _ in 0..len.min(MAX_PAYLOAD) {
        // Length is bounded above, push cannot fail
        let _ = payload.push(fill);
    }
    payload
}

/// RF channel (2400 MHz + n MHz)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Lowest channel
    pub const MIN: Self = Self(0);

    /// Highest channel the RF_CH register accepts
    pub const MAX: Self = Self(125);

    /// Create a channel, returns None if above [`Channel::MAX`]
    #[must_use]
    pub const fn from_raw(ch: u8) -> Option<Self> {
        if ch <= Self::MAX.0 {
            Some(Self(ch))
        } else {
            None
        }
    }

    /// Register value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Carrier frequency in MHz
    #[must_use]
    pub const fn as_mhz(self) -> u16 {
        2400 + self.0 as u16
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({} = {} MHz)", self.0, self.as_mhz())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ch{} ({} MHz)", self.0, self.as_mhz());
    }
}

/// Five byte pipe address, stored in over-the-air order (LSB first)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; ADDRESS_WIDTH]);

impl Address {
    /// Wrap raw address bytes
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_WIDTH]) -> Self {
        Self(bytes)
    }

    /// Address bytes
    #[must_use]
    pub const fn bytes(&self) -> &[u8; ADDRESS_WIDTH] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e] = self.0;
        write!(f, "Address({a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X})")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:02X}", self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_range() {
        assert_eq!(Channel::from_raw(0), Some(Channel::MIN));
        assert_eq!(Channel::from_raw(125), Some(Channel::MAX));
        assert!(Channel::from_raw(126).is_none());
    }

    #[test]
    fn channel_frequency() {
        let ch = Channel::from_raw(0x40).unwrap();
        assert_eq!(ch.as_mhz(), 2464);
    }

    #[test]
    fn filled_payload_truncates() {
        assert_eq!(filled_payload(b'A', 16).len(), 16);
        assert_eq!(filled_payload(0, 100).len(), MAX_PAYLOAD);
        assert!(filled_payload(b'A', 16).iter().all(|&b| b == b'A'));
    }
}
