//! Radio probe cycle
//!
//! The scripted exercise the firmware runs in its main loop: reset the
//! transceiver's flags, program channel, configuration and addresses, send
//! one test payload and report every step as text. Diagnostics go to any
//! `core::fmt::Write` sink (the software UART on the target). They are
//! best-effort and their errors are ignored.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::bus::ByteTransfer;
use crate::config::ProbeConfig;
use crate::drivers::nrf24::{Nrf24, Status, TxOutcome, TxReport};
use crate::error::Error;
use crate::types::Address;

/// What one probe cycle observed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    /// STATUS after flushing and setting the channel
    pub status: Status,
    /// TX address as read back before reprogramming it
    pub tx_address: Address,
    /// Completion poll result
    pub tx: TxReport,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ProbeReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "status={} tx_addr={} {}", self.status, self.tx_address, self.tx);
    }
}

/// Run one probe cycle
pub fn run_cycle<B, CSN, CE, D, P, W>(
    radio: &mut Nrf24<B, CSN, CE, D>,
    out: &mut W,
    cfg: &ProbeConfig,
) -> Result<ProbeReport, Error<B::Error, P>>
where
    B: ByteTransfer,
    CSN: OutputPin<Error = P>,
    CE: OutputPin<Error = P>,
    D: DelayNs,
    W: Write,
{
    let _ = out.write_str("reset MAX_RT\r\n");
    radio.clear_status(Status::MAX_RT)?;

    let _ = out.write_str("flush Tx\r\n");
    radio.flush_tx()?;

    let _ = write!(out, "RF_CH = 0x{:x}\r\n", cfg.channel.raw());
    radio.set_channel(cfg.channel)?;

    let status = radio.status()?;
    let _ = write!(out, "read status 0x{:x}\r\n", status.bits());

    let tx_address = radio.tx_address()?;
    let _ = out.write_str("read Tx AD 0x");
    for byte in tx_address.bytes() {
        let _ = write!(out, "{byte:x}");
    }
    let _ = out.write_str("\r\n");

    radio.set_config(cfg.radio_config)?;
    radio.set_tx_address(&cfg.address)?;
    radio.set_rx_address_p0(&cfg.address)?;
    radio.load_payload(&cfg.payload)?;

    let _ = out.write_str("CE pulse\r\n");
    radio.set_poll_delay(cfg.poll_delay_us);
    let tx = radio.transmit()?;

    let _ = write!(out, "polls: 0x{:x}\r\n", tx.polls);
    let _ = write!(out, "status 0x{:x}\r\n", tx.status.bits());
    if tx.outcome() == TxOutcome::RetriesExhausted {
        let _ = out.write_str("no ack (MAX_RT)\r\n");
    }
    let _ = out.write_str("\r\n\r\n");

    Ok(ProbeReport {
        status,
        tx_address,
        tx,
    })
}
