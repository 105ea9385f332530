//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the probe firmware.
//! Pin mappings, the shared tick period and the radio script defaults are
//! centralized here.

use crate::drivers::nrf24::config as nrf_config;
use crate::types::{Address, Channel, Payload};

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// Period of the shared timer interrupt in microseconds.
///
/// One tick is one serial bit period and also the unit the time base
/// accumulates into milliseconds.
pub const TICK_PERIOD_US: u16 = 103;

/// Interrupt rate produced by [`TICK_PERIOD_US`]
pub const TICK_RATE_HZ: u32 = 1_000_000 / TICK_PERIOD_US as u32;

/// Nominal baud rate of the diagnostic serial line (8N1)
pub const NOMINAL_BAUD: u32 = 9_600;

/// Delay between status reads while waiting for a transmission to finish
pub const POLL_DELAY_US: u32 = 15;

/// Pause between two probe cycles
pub const CYCLE_PAUSE_MS: u64 = 5_000;

/// Status LED toggle interval
pub const HEARTBEAT_MS: u64 = 2_000;

/// How often the heartbeat task samples the time base
pub const HEARTBEAT_POLL_MS: u64 = 100;

/// RF channel programmed by the probe (2.464 GHz)
pub const DEFAULT_CHANNEL: u8 = 0x40;

/// Pipe address used for both TX and auto-acknowledge RX
pub const DEFAULT_ADDRESS: [u8; 5] = [0xB3; 5];

/// Test payload length in bytes
pub const PAYLOAD_LEN: usize = 16;

/// Byte the test payload is filled with
pub const PAYLOAD_FILL: u8 = b'A';

/// CONFIG register value: powered up, CRC enabled, PTX mode
pub const DEFAULT_RADIO_CONFIG: u8 = nrf_config::PWR_UP | nrf_config::EN_CRC;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the wiring

    /// Status LED (Nucleo user LED)
    pub const LED_STATUS: &str = "PA5";

    /// Software UART TX line (idle high)
    pub const SERIAL_TX: &str = "PA9";

    /// Shift register clock
    pub const BUS_SCK: &str = "PB3";

    /// Shift register data in (pull-up)
    pub const BUS_MISO: &str = "PB4";

    /// Shift register data out
    pub const BUS_MOSI: &str = "PB5";

    /// nRF24L01+ chip select (active low)
    pub const NRF_CSN: &str = "PA4";

    /// nRF24L01+ chip enable (TX/RX activation)
    pub const NRF_CE: &str = "PA8";
}

/// Timer assignments
pub mod timers {
    //! Hardware timer assignments

    /// Basic timer driving the software UART and the time base
    pub const TICK: u8 = 7;
}

/// Parameters of one probe cycle against the radio
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
    /// RF channel to program
    pub channel: Channel,
    /// TX address, also written to RX pipe 0 for auto-acknowledge
    pub address: Address,
    /// CONFIG register value
    pub radio_config: u8,
    /// Payload loaded into the TX FIFO
    pub payload: Payload,
    /// Delay between completion polls in microseconds
    pub poll_delay_us: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            address: Address::new(DEFAULT_ADDRESS),
            radio_config: DEFAULT_RADIO_CONFIG,
            payload: default_payload(),
            poll_delay_us: POLL_DELAY_US,
        }
    }
}

/// Build the default RF channel
#[must_use]
pub const fn default_channel() -> Channel {
    match Channel::from_raw(DEFAULT_CHANNEL) {
        Some(ch) => ch,
        None => Channel::MIN,
    }
}

/// Build the default test payload
#[must_use]
pub fn default_payload() -> Payload {
    crate::types::filled_payload(PAYLOAD_FILL, PAYLOAD_LEN)
}
