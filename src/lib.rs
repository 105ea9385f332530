//! nRF24L01+ Probe Firmware Library
//!
//! Bare-metal driver stack for an STM32G474 talking to an nRF24L01+
//! transceiver. One periodic timer interrupt clocks a software UART for
//! diagnostics and keeps a millisecond time base; a GPIO shift register
//! carries the radio's command protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Probe cycle (scripted radio exercise + serial diagnostics)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      DRIVER LAYER                            │
//! │  nRF24 command sequencer  │  Software UART writer            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       CORE LAYER                             │
//! │  Shift-register bus  │  Tick state (bit clock + time base)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        HAL LAYER                             │
//! │  Tick timer (TIM7)  │  GPIO lines  │  embassy-stm32          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Execution contexts
//!
//! - **Tick interrupt**: calls [`tick::TickShared::on_tick`] once per bit
//!   period and drives the serial line with the returned level.
//! - **Main context**: everything else. Serial writes, bus transfers and
//!   the completion poll all busy-wait here.
//!
//! The only cross-context state lives in [`tick::TickShared`]; see its
//! module documentation for the access rules.

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// STM32G474 tick timer and GPIO wrappers.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// Command sequencers for external ICs.
pub mod drivers;

/// Shift-register bus primitive
pub mod bus;

/// Millisecond time base
pub mod timebase;

/// Software UART transmitter
pub mod uart;

/// State shared with the periodic tick interrupt
pub mod tick;

/// Scripted radio probe cycle
pub mod probe;

/// Error type for radio operations
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Simulated transceiver for host testing
#[cfg(all(feature = "std", not(feature = "embedded")))]
pub mod sim;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::bus::{ByteTransfer, SoftShiftRegister, UsiBus};
    pub use crate::drivers::nrf24::{Nrf24, Status, TxOutcome, TxReport};
    pub use crate::tick::TickShared;
    pub use crate::timebase::Interval;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Delay, Duration, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
