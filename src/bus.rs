//! Shift-register bus primitive
//!
//! A three-wire synchronous bus (clock, data out, data in) built on a
//! universal shift register: an 8-bit data register plus a 4-bit edge
//! counter that raises an overflow flag after 16 clock edges. Software
//! strobes the clock; one byte goes out MSB first while the peripheral's
//! reply is shifted in on the same edges.
//!
//! [`ShiftRegister`] is the seam between the transfer algorithm
//! ([`UsiBus`]) and whatever implements the register: the GPIO-backed
//! [`SoftShiftRegister`] on the target, or a model in tests.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Clock edges per byte (two per bit)
pub const EDGES_PER_BYTE: u8 = 16;

/// A clocked shift register with an edge counter and overflow flag
pub trait ShiftRegister {
    /// Error raised by the underlying lines
    type Error;

    /// Load the data register with the byte to shift out
    fn load(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Clear the counter overflow flag
    fn clear_overflow(&mut self);

    /// The counter has wrapped since the flag was last cleared
    fn overflowed(&self) -> bool;

    /// Produce one clock edge
    fn strobe(&mut self) -> Result<(), Self::Error>;

    /// Current contents of the data register
    fn data(&self) -> u8;
}

/// Full-duplex single byte exchange, main context only
pub trait ByteTransfer {
    /// Error raised by the bus
    type Error;

    /// Clock `byte` out and return the byte clocked in on the same edges
    fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error>;
}

/// Blocking byte transfer over a [`ShiftRegister`]
pub struct UsiBus<S> {
    usi: S,
}

impl<S: ShiftRegister> UsiBus<S> {
    /// Wrap a shift register
    #[must_use]
    pub const fn new(usi: S) -> Self {
        Self { usi }
    }

    /// Exchange one byte.
    ///
    /// Strobes the clock until the counter overflows. There is no timeout:
    /// with working hardware the loop ends after [`EDGES_PER_BYTE`] strobes,
    /// a stuck counter hangs the caller. Never call from an interrupt.
    pub fn transfer(&mut self, byte: u8) -> Result<u8, S::Error> {
        self.usi.load(byte)?;
        self.usi.clear_overflow();
        while !self.usi.overflowed() {
            self.usi.strobe()?;
        }
        Ok(self.usi.data())
    }

    /// Borrow the shift register
    pub fn inner(&self) -> &S {
        &self.usi
    }

    /// Give back the shift register
    pub fn release(self) -> S {
        self.usi
    }
}

impl<S: ShiftRegister> ByteTransfer for UsiBus<S> {
    type Error = S::Error;

    fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
        UsiBus::transfer(self, byte)
    }
}

/// Shift register implemented on three GPIO lines (SPI mode 0)
///
/// Mirrors the universal shift register in three-wire mode: data out always
/// presents the data register's MSB, the register shifts left and samples
/// data in on the rising edge, the counter advances on both edges.
pub struct SoftShiftRegister<SCK, MOSI, MISO> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    data: u8,
    counter: u8,
    overflow: bool,
    clock: PinState,
}

impl<SCK, MOSI, MISO, E> SoftShiftRegister<SCK, MOSI, MISO>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
{
    /// Take the bus lines, driving the clock low
    pub fn new(mut sck: SCK, mosi: MOSI, miso: MISO) -> Result<Self, E> {
        sck.set_low()?;
        Ok(Self {
            sck,
            mosi,
            miso,
            data: 0,
            counter: 0,
            overflow: false,
            clock: PinState::Low,
        })
    }

    /// Edge counter value (0..16)
    #[must_use]
    pub const fn counter(&self) -> u8 {
        self.counter
    }

    /// Give back the bus lines
    pub fn release(self) -> (SCK, MOSI, MISO) {
        (self.sck, self.mosi, self.miso)
    }

    fn present_msb(&mut self) -> Result<(), E> {
        self.mosi.set_state(PinState::from(self.data & 0x80 != 0))
    }
}

impl<SCK, MOSI, MISO, E> ShiftRegister for SoftShiftRegister<SCK, MOSI, MISO>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
{
    type Error = E;

    fn load(&mut self, byte: u8) -> Result<(), E> {
        self.data = byte;
        self.present_msb()
    }

    fn clear_overflow(&mut self) {
        self.overflow = false;
    }

    fn overflowed(&self) -> bool {
        self.overflow
    }

    fn strobe(&mut self) -> Result<(), E> {
        self.clock = !self.clock;
        self.sck.set_state(self.clock)?;

        if self.clock == PinState::High {
            let bit = u8::from(self.miso.is_high()?);
            self.data = (self.data << 1) | bit;
        } else {
            self.present_msb()?;
        }

        self.counter = (self.counter + 1) % EDGES_PER_BYTE;
        if self.counter == 0 {
            self.overflow = true;
        }
        Ok(())
    }

    fn data(&self) -> u8 {
        self.data
    }
}
