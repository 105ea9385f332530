//! nRF24L01+ Command Sequencer
//!
//! Drives the transceiver over the shift-register bus. Every operation is
//! one transaction: CSN low, a command selector byte (answered with the
//! STATUS register), zero or more data or placeholder bytes, CSN high.
//!
//! The command set is kept as a table ([`Command`]) mapping symbolic names
//! to selector bytes, so new operations are built from [`Nrf24::transaction`]
//! without touching the bus primitive.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::bus::ByteTransfer;
use crate::config::POLL_DELAY_US;
use crate::error::Error;
use crate::types::{Address, Channel, ADDRESS_WIDTH, MAX_PAYLOAD};

/// Register addresses
pub mod reg {
    /// Configuration
    pub const CONFIG: u8 = 0x00;
    /// Auto acknowledgement per pipe
    pub const EN_AA: u8 = 0x01;
    /// Enabled RX pipes
    pub const EN_RXADDR: u8 = 0x02;
    /// Address width
    pub const SETUP_AW: u8 = 0x03;
    /// Automatic retransmission
    pub const SETUP_RETR: u8 = 0x04;
    /// RF channel
    pub const RF_CH: u8 = 0x05;
    /// RF setup (data rate, power)
    pub const RF_SETUP: u8 = 0x06;
    /// Status flags
    pub const STATUS: u8 = 0x07;
    /// Transmit observe counters
    pub const OBSERVE_TX: u8 = 0x08;
    /// RX address pipe 0 (5 bytes)
    pub const RX_ADDR_P0: u8 = 0x0A;
    /// RX address pipe 1 (5 bytes)
    pub const RX_ADDR_P1: u8 = 0x0B;
    /// TX address (5 bytes)
    pub const TX_ADDR: u8 = 0x10;
    /// RX payload width pipe 0
    pub const RX_PW_P0: u8 = 0x11;
    /// FIFO status
    pub const FIFO_STATUS: u8 = 0x17;
}

/// CONFIG register bits
pub mod config {
    /// Mask RX_DR from the IRQ pin
    pub const MASK_RX_DR: u8 = 0x40;
    /// Mask TX_DS from the IRQ pin
    pub const MASK_TX_DS: u8 = 0x20;
    /// Mask MAX_RT from the IRQ pin
    pub const MASK_MAX_RT: u8 = 0x10;
    /// Enable CRC
    pub const EN_CRC: u8 = 0x08;
    /// Two byte CRC
    pub const CRCO: u8 = 0x04;
    /// Power up
    pub const PWR_UP: u8 = 0x02;
    /// Primary receiver
    pub const PRIM_RX: u8 = 0x01;
}

/// Command selector bytes
mod cmd {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const REGISTER_MASK: u8 = 0x1F;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const REUSE_TX_PL: u8 = 0xE3;
    pub const NOP: u8 = 0xFF;
}

/// Placeholder clocked out while reading
pub const DUMMY: u8 = cmd::NOP;

/// Transceiver command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Read a register (address in the low five bits)
    ReadRegister(u8),
    /// Write a register (address in the low five bits)
    WriteRegister(u8),
    /// Read one RX payload
    ReadRxPayload,
    /// Write one TX payload
    WriteTxPayload,
    /// Drop the TX FIFO
    FlushTx,
    /// Drop the RX FIFO
    FlushRx,
    /// Retransmit the last payload
    ReuseTxPayload,
    /// No operation, only returns STATUS
    Nop,
}

impl Command {
    /// Selector byte sent first in the transaction
    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            Self::ReadRegister(r) => cmd::R_REGISTER | (r & cmd::REGISTER_MASK),
            Self::WriteRegister(r) => cmd::W_REGISTER | (r & cmd::REGISTER_MASK),
            Self::ReadRxPayload => cmd::R_RX_PAYLOAD,
            Self::WriteTxPayload => cmd::W_TX_PAYLOAD,
            Self::FlushTx => cmd::FLUSH_TX,
            Self::FlushRx => cmd::FLUSH_RX,
            Self::ReuseTxPayload => cmd::REUSE_TX_PL,
            Self::Nop => cmd::NOP,
        }
    }

    /// Decode a selector byte
    #[must_use]
    pub const fn from_selector(byte: u8) -> Option<Self> {
        match byte {
            0x00..=0x1F => Some(Self::ReadRegister(byte & cmd::REGISTER_MASK)),
            0x20..=0x3F => Some(Self::WriteRegister(byte & cmd::REGISTER_MASK)),
            cmd::R_RX_PAYLOAD => Some(Self::ReadRxPayload),
            cmd::W_TX_PAYLOAD => Some(Self::WriteTxPayload),
            cmd::FLUSH_TX => Some(Self::FlushTx),
            cmd::FLUSH_RX => Some(Self::FlushRx),
            cmd::REUSE_TX_PL => Some(Self::ReuseTxPayload),
            cmd::NOP => Some(Self::Nop),
            _ => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ReadRegister(r) => defmt::write!(f, "R_REGISTER({=u8:#04x})", *r),
            Self::WriteRegister(r) => defmt::write!(f, "W_REGISTER({=u8:#04x})", *r),
            Self::ReadRxPayload => defmt::write!(f, "R_RX_PAYLOAD"),
            Self::WriteTxPayload => defmt::write!(f, "W_TX_PAYLOAD"),
            Self::FlushTx => defmt::write!(f, "FLUSH_TX"),
            Self::FlushRx => defmt::write!(f, "FLUSH_RX"),
            Self::ReuseTxPayload => defmt::write!(f, "REUSE_TX_PL"),
            Self::Nop => defmt::write!(f, "NOP"),
        }
    }
}

/// STATUS register snapshot
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u8);

impl Status {
    /// Data ready in RX FIFO
    pub const RX_DR: u8 = 0x40;
    /// Data sent (acknowledged when auto-ack is on)
    pub const TX_DS: u8 = 0x20;
    /// Retransmit limit reached
    pub const MAX_RT: u8 = 0x10;
    /// TX FIFO full
    pub const TX_FULL: u8 = 0x01;
    /// Write-one-to-clear interrupt flags
    pub const IRQ_MASK: u8 = Self::RX_DR | Self::TX_DS | Self::MAX_RT;

    /// Wrap a raw STATUS byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw STATUS byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// TX_DS is set
    #[must_use]
    pub const fn data_sent(self) -> bool {
        self.0 & Self::TX_DS != 0
    }

    /// MAX_RT is set
    #[must_use]
    pub const fn max_retries(self) -> bool {
        self.0 & Self::MAX_RT != 0
    }

    /// RX_DR is set
    #[must_use]
    pub const fn rx_ready(self) -> bool {
        self.0 & Self::RX_DR != 0
    }

    /// TX FIFO is full
    #[must_use]
    pub const fn tx_full(self) -> bool {
        self.0 & Self::TX_FULL != 0
    }

    /// Pipe of the payload at the head of the RX FIFO, None when empty
    #[must_use]
    pub const fn rx_pipe(self) -> Option<u8> {
        match (self.0 >> 1) & 0x07 {
            p @ 0..=5 => Some(p),
            _ => None,
        }
    }

    /// Either transmit completion flag is set
    #[must_use]
    pub const fn tx_finished(self) -> bool {
        self.0 & (Self::TX_DS | Self::MAX_RT) != 0
    }
}

impl core::fmt::Debug for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Status({:#04x})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status({=u8:#04x} ds={} rt={})",
            self.0,
            self.data_sent(),
            self.max_retries()
        );
    }
}

/// How a transmission ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// TX_DS was raised
    Sent,
    /// Only MAX_RT was raised
    RetriesExhausted,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Sent => defmt::write!(f, "Sent"),
            Self::RetriesExhausted => defmt::write!(f, "RetriesExhausted"),
        }
    }
}

/// Result of the completion poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReport {
    /// STATUS read that ended the poll
    pub status: Status,
    /// Number of status reads taken
    pub polls: u32,
}

impl TxReport {
    /// Distinguish a delivered packet from an exhausted retry budget
    #[must_use]
    pub const fn outcome(&self) -> TxOutcome {
        if self.status.data_sent() {
            TxOutcome::Sent
        } else {
            TxOutcome::RetriesExhausted
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} after {} polls ({})", self.outcome(), self.polls, self.status);
    }
}

/// nRF24L01+ driver
pub struct Nrf24<B, CSN, CE, D> {
    bus: B,
    csn: CSN,
    ce: CE,
    delay: D,
    poll_delay_us: u32,
}

impl<B, CSN, CE, D, P> Nrf24<B, CSN, CE, D>
where
    B: ByteTransfer,
    CSN: OutputPin<Error = P>,
    CE: OutputPin<Error = P>,
    D: DelayNs,
{
    /// Take the bus and control lines, leaving CSN released and CE low
    pub fn new(bus: B, mut csn: CSN, mut ce: CE, delay: D) -> Result<Self, Error<B::Error, P>> {
        csn.set_high().map_err(Error::Pin)?;
        ce.set_low().map_err(Error::Pin)?;
        Ok(Self {
            bus,
            csn,
            ce,
            delay,
            poll_delay_us: POLL_DELAY_US,
        })
    }

    /// Change the delay between completion polls
    pub fn set_poll_delay(&mut self, us: u32) {
        self.poll_delay_us = us;
    }

    /// Delay between completion polls in microseconds
    #[must_use]
    pub const fn poll_delay(&self) -> u32 {
        self.poll_delay_us
    }

    /// Run one transaction: send `cmd`, then `write`, then clock in
    /// `read.len()` reply bytes. Returns the STATUS shifted out with the
    /// selector.
    pub fn transaction(
        &mut self,
        cmd: Command,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<Status, Error<B::Error, P>> {
        self.csn.set_low().map_err(Error::Pin)?;
        let result = self.exchange(cmd, write, read);
        let released = self.csn.set_high().map_err(Error::Pin);
        let status = result?;
        released?;
        Ok(status)
    }

    fn exchange(
        &mut self,
        cmd: Command,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<Status, Error<B::Error, P>> {
        let status = self.bus.transfer(cmd.selector()).map_err(Error::Bus)?;
        for &byte in write {
            self.bus.transfer(byte).map_err(Error::Bus)?;
        }
        for slot in read.iter_mut() {
            *slot = self.bus.transfer(DUMMY).map_err(Error::Bus)?;
        }
        Ok(Status::from_bits(status))
    }

    /// Issue a command with no data phase
    pub fn command(&mut self, cmd: Command) -> Result<Status, Error<B::Error, P>> {
        self.transaction(cmd, &[], &mut [])
    }

    /// Read STATUS with a NOP
    pub fn status(&mut self) -> Result<Status, Error<B::Error, P>> {
        self.command(Command::Nop)
    }

    /// Write a one byte register
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<Status, Error<B::Error, P>> {
        self.transaction(Command::WriteRegister(reg), &[value], &mut [])
    }

    /// Write a multi-byte register
    pub fn write_register_bytes(
        &mut self,
        reg: u8,
        values: &[u8],
    ) -> Result<Status, Error<B::Error, P>> {
        self.transaction(Command::WriteRegister(reg), values, &mut [])
    }

    /// Read a one byte register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Error<B::Error, P>> {
        let mut value = [0u8];
        self.transaction(Command::ReadRegister(reg), &[], &mut value)?;
        Ok(value[0])
    }

    /// Read a multi-byte register into `buf`
    pub fn read_register_bytes(
        &mut self,
        reg: u8,
        buf: &mut [u8],
    ) -> Result<Status, Error<B::Error, P>> {
        self.transaction(Command::ReadRegister(reg), &[], buf)
    }

    /// Clear the given STATUS interrupt flags (write one to clear)
    pub fn clear_status(&mut self, flags: u8) -> Result<Status, Error<B::Error, P>> {
        self.write_register(reg::STATUS, flags & Status::IRQ_MASK)
    }

    /// Drop every payload in the TX FIFO
    pub fn flush_tx(&mut self) -> Result<Status, Error<B::Error, P>> {
        self.command(Command::FlushTx)
    }

    /// Drop every payload in the RX FIFO
    pub fn flush_rx(&mut self) -> Result<Status, Error<B::Error, P>> {
        self.command(Command::FlushRx)
    }

    /// Select the RF channel
    pub fn set_channel(&mut self, channel: Channel) -> Result<Status, Error<B::Error, P>> {
        self.write_register(reg::RF_CH, channel.raw())
    }

    /// Write the CONFIG register
    pub fn set_config(&mut self, config: u8) -> Result<Status, Error<B::Error, P>> {
        self.write_register(reg::CONFIG, config)
    }

    /// Read the TX address
    pub fn tx_address(&mut self) -> Result<Address, Error<B::Error, P>> {
        let mut bytes = [0u8; ADDRESS_WIDTH];
        self.read_register_bytes(reg::TX_ADDR, &mut bytes)?;
        Ok(Address::new(bytes))
    }

    /// Write the TX address
    pub fn set_tx_address(&mut self, addr: &Address) -> Result<Status, Error<B::Error, P>> {
        self.write_register_bytes(reg::TX_ADDR, addr.bytes())
    }

    /// Write the pipe 0 RX address (must match TX address for auto-ack)
    pub fn set_rx_address_p0(&mut self, addr: &Address) -> Result<Status, Error<B::Error, P>> {
        self.write_register_bytes(reg::RX_ADDR_P0, addr.bytes())
    }

    /// Queue one payload in the TX FIFO
    pub fn load_payload(&mut self, payload: &[u8]) -> Result<Status, Error<B::Error, P>> {
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(payload.len()));
        }
        self.transaction(Command::WriteTxPayload, payload, &mut [])
    }

    /// Raise CE and poll STATUS until TX_DS or MAX_RT appears, then drop CE.
    ///
    /// The poll waits the configured delay before each read and has no
    /// iteration limit. Both completion flags end it the same way; see
    /// [`TxReport::outcome`] to tell them apart. The flags are left set.
    ///
    /// CE is dropped on every exit, including a failed status read.
    pub fn transmit(&mut self) -> Result<TxReport, Error<B::Error, P>> {
        self.ce.set_high().map_err(Error::Pin)?;
        let result = self.poll_completion();
        let dropped = self.ce.set_low().map_err(Error::Pin);
        let report = result?;
        dropped?;
        Ok(report)
    }

    fn poll_completion(&mut self) -> Result<TxReport, Error<B::Error, P>> {
        let mut polls: u32 = 0;
        loop {
            polls = polls.wrapping_add(1);
            self.delay.delay_us(self.poll_delay_us);
            let status = self.status()?;
            #[cfg(feature = "embedded")]
            defmt::trace!("poll {}: {}", polls, status);
            if status.tx_finished() {
                return Ok(TxReport { status, polls });
            }
        }
    }

    /// Give back the bus, control lines and delay
    pub fn release(self) -> (B, CSN, CE, D) {
        (self.bus, self.csn, self.ce, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_command_table() {
        assert_eq!(Command::WriteRegister(reg::STATUS).selector(), 0x27);
        assert_eq!(Command::ReadRegister(reg::TX_ADDR).selector(), 0x10);
        assert_eq!(Command::WriteRegister(reg::RF_CH).selector(), 0x25);
        assert_eq!(Command::FlushTx.selector(), 0xE1);
        assert_eq!(Command::WriteTxPayload.selector(), 0xA0);
        assert_eq!(Command::Nop.selector(), 0xFF);
    }

    #[test]
    fn register_address_is_masked() {
        assert_eq!(Command::WriteRegister(0xFF).selector(), 0x3F);
    }

    #[test]
    fn selector_decoding() {
        for cmd in [
            Command::ReadRegister(reg::CONFIG),
            Command::WriteRegister(reg::RX_ADDR_P0),
            Command::ReadRxPayload,
            Command::WriteTxPayload,
            Command::FlushTx,
            Command::FlushRx,
            Command::ReuseTxPayload,
            Command::Nop,
        ] {
            assert_eq!(Command::from_selector(cmd.selector()), Some(cmd));
        }
        assert_eq!(Command::from_selector(0x50), None);
    }

    #[test]
    fn status_fields() {
        let s = Status::from_bits(0x0E);
        assert_eq!(s.rx_pipe(), None);
        assert!(!s.tx_finished());

        let s = Status::from_bits(0x20 | 0x02);
        assert!(s.data_sent());
        assert_eq!(s.rx_pipe(), Some(1));
        assert!(s.tx_finished());

        let s = Status::from_bits(0x10 | 0x01);
        assert!(s.max_retries());
        assert!(s.tx_full());
    }

    #[test]
    fn report_outcome() {
        let sent = TxReport {
            status: Status::from_bits(0x2E),
            polls: 3,
        };
        assert_eq!(sent.outcome(), TxOutcome::Sent);

        let lost = TxReport {
            status: Status::from_bits(0x1E),
            polls: 40,
        };
        assert_eq!(lost.outcome(), TxOutcome::RetriesExhausted);
    }
}
