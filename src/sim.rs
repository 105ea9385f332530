//! Host-side nRF24L01+ register model
//!
//! A simulated transceiver that answers bus transfers the way the chip
//! does, for exercising the sequencer without hardware. One [`SimRadio`]
//! hands out a bus ([`SimBus`]), the two control lines ([`SimPin`]) and a
//! delay ([`SimDelay`]) that all share its state, and records every edge
//! and byte in an event log.
//!
//! A payload starts going out once CE is high with PWR_UP set and PRIM_RX
//! clear. After `airtime_us` of simulated delay it completes with TX_DS,
//! or with MAX_RT when acknowledgements are switched off.

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::bus::ByteTransfer;
use crate::drivers::nrf24::{config, reg, Command, Status};
use crate::types::{ADDRESS_WIDTH, MAX_PAYLOAD};

/// TX FIFO depth
pub const FIFO_DEPTH: usize = 3;

/// Default time from CE high to a completion flag (TX settling plus packet)
pub const DEFAULT_AIRTIME_US: u32 = 300;

/// Something observable on the simulated wires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// CSN driven low
    Select,
    /// CSN driven high
    Deselect,
    /// CE driven high
    EnableHigh,
    /// CE driven low
    EnableLow,
    /// One bus transfer (MOSI, MISO)
    Byte(u8, u8),
    /// A transmission finished (TX_DS or MAX_RT raised)
    Transmitted,
}

/// Which control line a [`SimPin`] drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    /// Chip select, active low
    Csn,
    /// Chip enable
    Ce,
}

#[derive(Debug)]
struct Transaction {
    command: Option<Command>,
    data: Vec<u8>,
}

#[derive(Debug)]
struct SimState {
    regs: [u8; 0x20],
    rx_addr_p0: [u8; ADDRESS_WIDTH],
    rx_addr_p1: [u8; ADDRESS_WIDTH],
    tx_addr: [u8; ADDRESS_WIDTH],
    tx_fifo: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    csn_low: bool,
    ce_high: bool,
    current: Option<Transaction>,
    airtime_us: u32,
    on_air_us: u32,
    delayed_ns: u64,
    acknowledge: bool,
    events: Vec<SimEvent>,
}

impl SimState {
    fn new() -> Self {
        let mut regs = [0u8; 0x20];
        regs[usize::from(reg::CONFIG)] = config::EN_CRC;
        regs[usize::from(reg::EN_AA)] = 0x3F;
        regs[usize::from(reg::EN_RXADDR)] = 0x03;
        regs[usize::from(reg::SETUP_AW)] = 0x03;
        regs[usize::from(reg::SETUP_RETR)] = 0x03;
        regs[usize::from(reg::RF_CH)] = 0x02;
        regs[usize::from(reg::RF_SETUP)] = 0x0E;
        regs[usize::from(reg::STATUS)] = 0x0E;
        regs[usize::from(reg::FIFO_STATUS)] = 0x11;
        Self {
            regs,
            rx_addr_p0: [0xE7; ADDRESS_WIDTH],
            rx_addr_p1: [0xC2; ADDRESS_WIDTH],
            tx_addr: [0xE7; ADDRESS_WIDTH],
            tx_fifo: VecDeque::new(),
            sent: Vec::new(),
            csn_low: false,
            ce_high: false,
            current: None,
            airtime_us: DEFAULT_AIRTIME_US,
            on_air_us: 0,
            delayed_ns: 0,
            acknowledge: true,
            events: Vec::new(),
        }
    }

    fn status(&self) -> u8 {
        let mut status = self.regs[usize::from(reg::STATUS)] & Status::IRQ_MASK;
        // RX FIFO is never filled: RX_P_NO reads "empty"
        status |= 0x0E;
        if self.tx_fifo.len() >= FIFO_DEPTH {
            status |= Status::TX_FULL;
        }
        status
    }

    fn fifo_status(&self) -> u8 {
        let mut fifo = 0x01; // RX_EMPTY
        if self.tx_fifo.is_empty() {
            fifo |= 0x10;
        }
        if self.tx_fifo.len() >= FIFO_DEPTH {
            fifo |= 0x20;
        }
        fifo
    }

    fn address_reg(&mut self, r: u8) -> Option<&mut [u8; ADDRESS_WIDTH]> {
        match r {
            reg::RX_ADDR_P0 => Some(&mut self.rx_addr_p0),
            reg::RX_ADDR_P1 => Some(&mut self.rx_addr_p1),
            reg::TX_ADDR => Some(&mut self.tx_addr),
            _ => None,
        }
    }

    fn read_reg_byte(&mut self, r: u8, index: usize) -> u8 {
        match r {
            reg::STATUS => return self.status(),
            reg::FIFO_STATUS => return self.fifo_status(),
            _ => {}
        }
        if let Some(addr) = self.address_reg(r) {
            return addr.get(index).copied().unwrap_or(0);
        }
        if index == 0 {
            self.regs[usize::from(r & 0x1F)]
        } else {
            0
        }
    }

    fn write_reg_byte(&mut self, r: u8, index: usize, value: u8) {
        if r == reg::STATUS {
            if index == 0 {
                self.regs[usize::from(reg::STATUS)] &= !(value & Status::IRQ_MASK);
            }
            return;
        }
        if let Some(addr) = self.address_reg(r) {
            if let Some(slot) = addr.get_mut(index) {
                *slot = value;
            }
        } else if index == 0 {
            self.regs[usize::from(r & 0x1F)] = value;
        }
    }

    fn select(&mut self) {
        self.csn_low = true;
        self.current = Some(Transaction {
            command: None,
            data: Vec::new(),
        });
        self.events.push(SimEvent::Select);
    }

    fn deselect(&mut self) {
        self.csn_low = false;
        if let Some(Transaction {
            command: Some(Command::WriteTxPayload),
            data,
        }) = self.current.take()
        {
            if self.tx_fifo.len() < FIFO_DEPTH && !data.is_empty() {
                let mut data = data;
                data.truncate(MAX_PAYLOAD);
                self.tx_fifo.push_back(data);
            }
        }
        self.events.push(SimEvent::Deselect);
    }

    fn exchange(&mut self, mosi: u8) -> u8 {
        let Some(mut txn) = self.current.take() else {
            // Deselected chip leaves MISO floating high
            self.events.push(SimEvent::Byte(mosi, 0xFF));
            return 0xFF;
        };

        let miso = match txn.command {
            None => {
                let status = self.status();
                txn.command = Command::from_selector(mosi);
                if txn.command == Some(Command::FlushTx) {
                    self.tx_fifo.clear();
                }
                status
            }
            Some(Command::ReadRegister(r)) => {
                let value = self.read_reg_byte(r, txn.data.len());
                txn.data.push(mosi);
                value
            }
            Some(Command::WriteRegister(r)) => {
                self.write_reg_byte(r, txn.data.len(), mosi);
                txn.data.push(mosi);
                0x00
            }
            Some(Command::WriteTxPayload) => {
                txn.data.push(mosi);
                0x00
            }
            Some(_) => 0x00,
        };

        self.current = Some(txn);
        self.events.push(SimEvent::Byte(mosi, miso));
        miso
    }

    fn transmitting(&self) -> bool {
        let cfg = self.regs[usize::from(reg::CONFIG)];
        self.ce_high
            && cfg & config::PWR_UP != 0
            && cfg & config::PRIM_RX == 0
            && !self.tx_fifo.is_empty()
            && self.regs[usize::from(reg::STATUS)] & Status::MAX_RT == 0
    }

    fn elapse_us(&mut self, us: u32) {
        if !self.transmitting() {
            self.on_air_us = 0;
            return;
        }
        self.on_air_us += us;
        if self.on_air_us >= self.airtime_us {
            self.on_air_us = 0;
            let flag = if self.acknowledge {
                if let Some(payload) = self.tx_fifo.pop_front() {
                    self.sent.push(payload);
                }
                Status::TX_DS
            } else {
                // Payload stays in the FIFO after MAX_RT
                Status::MAX_RT
            };
            self.regs[usize::from(reg::STATUS)] |= flag;
            self.events.push(SimEvent::Transmitted);
        }
    }
}

/// Simulated transceiver
#[derive(Clone)]
pub struct SimRadio {
    state: Rc<RefCell<SimState>>,
}

impl SimRadio {
    /// Chip in its power-on reset state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new())),
        }
    }

    /// Time a payload needs on air
    #[must_use]
    pub fn with_airtime_us(self, us: u32) -> Self {
        self.state.borrow_mut().airtime_us = us;
        self
    }

    /// Receiver never acknowledges: every payload ends in MAX_RT
    #[must_use]
    pub fn without_ack(self) -> Self {
        self.state.borrow_mut().acknowledge = false;
        self
    }

    /// Bus endpoint
    #[must_use]
    pub fn bus(&self) -> SimBus {
        SimBus {
            state: Rc::clone(&self.state),
        }
    }

    /// Control line endpoint
    #[must_use]
    pub fn pin(&self, line: Line) -> SimPin {
        SimPin {
            state: Rc::clone(&self.state),
            line,
        }
    }

    /// Delay endpoint
    #[must_use]
    pub fn delay(&self) -> SimDelay {
        SimDelay {
            state: Rc::clone(&self.state),
        }
    }

    /// Current STATUS value
    #[must_use]
    pub fn status(&self) -> u8 {
        self.state.borrow().status()
    }

    /// Force interrupt flags on, as if events had happened
    pub fn raise_status(&self, flags: u8) {
        self.state.borrow_mut().regs[usize::from(reg::STATUS)] |= flags & Status::IRQ_MASK;
    }

    /// Single byte register value
    #[must_use]
    pub fn register(&self, r: u8) -> u8 {
        self.state.borrow_mut().read_reg_byte(r, 0)
    }

    /// Pipe address register value
    #[must_use]
    pub fn address(&self, r: u8) -> Option<[u8; ADDRESS_WIDTH]> {
        self.state.borrow_mut().address_reg(r).copied()
    }

    /// Payloads waiting in the TX FIFO
    #[must_use]
    pub fn tx_fifo(&self) -> Vec<Vec<u8>> {
        self.state.borrow().tx_fifo.iter().cloned().collect()
    }

    /// Payloads that left the chip
    #[must_use]
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// Every recorded event, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// CSN is asserted
    #[must_use]
    pub fn selected(&self) -> bool {
        self.state.borrow().csn_low
    }

    /// CE is high
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.state.borrow().ce_high
    }

    /// Total simulated delay in nanoseconds
    #[must_use]
    pub fn delayed_ns(&self) -> u64 {
        self.state.borrow().delayed_ns
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus side of a [`SimRadio`]
pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl ByteTransfer for SimBus {
    type Error = Infallible;

    fn transfer(&mut self, byte: u8) -> Result<u8, Infallible> {
        Ok(self.state.borrow_mut().exchange(byte))
    }
}

/// CSN or CE line of a [`SimRadio`]
pub struct SimPin {
    state: Rc<RefCell<SimState>>,
    line: Line,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut state = self.state.borrow_mut();
        match self.line {
            Line::Csn => state.select(),
            Line::Ce => {
                state.ce_high = false;
                state.events.push(SimEvent::EnableLow);
            }
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut state = self.state.borrow_mut();
        match self.line {
            Line::Csn => state.deselect(),
            Line::Ce => {
                state.ce_high = true;
                state.events.push(SimEvent::EnableHigh);
            }
        }
        Ok(())
    }
}

/// Delay that advances the simulated clock instead of sleeping
pub struct SimDelay {
    state: Rc<RefCell<SimState>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut state = self.state.borrow_mut();
        state.delayed_ns += u64::from(ns);
        state.elapse_us(ns.div_ceil(1000));
    }
}
