//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use nrf24_probe::config::*;
use nrf24_probe::drivers::nrf24::config as radio_config;
use nrf24_probe::types::{Channel, MAX_PAYLOAD};

// =============================================================================
// Clock and Tick Tests
// =============================================================================

#[test]
fn system_clock_valid() {
    // STM32G474 max clock is 170 MHz
    assert_eq!(SYSTEM_CLOCK_HZ, 170_000_000);
}

#[test]
fn tick_period_is_one_bit() {
    assert_eq!(TICK_PERIOD_US, 103);
    // 1 / 9600 s = 104.17 us, within 2% of one tick
    let bit_ns = 1_000_000_000 / NOMINAL_BAUD;
    let tick_ns = u32::from(TICK_PERIOD_US) * 1000;
    assert!(bit_ns.abs_diff(tick_ns) * 50 < bit_ns);
}

#[test]
fn tick_rate_matches_period() {
    assert_eq!(TICK_RATE_HZ, 9_708);
}

#[test]
fn tick_below_one_millisecond() {
    assert!(TICK_PERIOD_US < 1000);
}

// =============================================================================
// Timing Tests
// =============================================================================

#[test]
fn poll_delay_short() {
    assert_eq!(POLL_DELAY_US, 15);
}

#[test]
fn cycle_pause() {
    assert_eq!(CYCLE_PAUSE_MS, 5_000);
}

#[test]
fn heartbeat_sampled_often_enough() {
    assert_eq!(HEARTBEAT_MS, 2_000);
    assert!(HEARTBEAT_POLL_MS * 10 <= HEARTBEAT_MS);
}

// =============================================================================
// Radio Parameter Tests
// =============================================================================

#[test]
fn default_channel_valid() {
    assert!(Channel::from_raw(DEFAULT_CHANNEL).is_some());
    assert_eq!(default_channel().as_mhz(), 2464);
}

#[test]
fn default_config_powers_up_transmitter() {
    assert_ne!(DEFAULT_RADIO_CONFIG & radio_config::PWR_UP, 0);
    assert_ne!(DEFAULT_RADIO_CONFIG & radio_config::EN_CRC, 0);
    assert_eq!(DEFAULT_RADIO_CONFIG & radio_config::PRIM_RX, 0);
}

#[test]
fn payload_fits_fifo() {
    assert!(PAYLOAD_LEN <= MAX_PAYLOAD);
    let payload = default_payload();
    assert_eq!(payload.len(), PAYLOAD_LEN);
    assert!(payload.iter().all(|&b| b == b'A'));
}

#[test]
fn probe_config_defaults() {
    let cfg = ProbeConfig::default();
    assert_eq!(cfg.channel.raw(), 0x40);
    assert_eq!(cfg.address.bytes(), &[0xB3; 5]);
    assert_eq!(cfg.radio_config, 0x0A);
    assert_eq!(cfg.payload.len(), 16);
    assert_eq!(cfg.poll_delay_us, POLL_DELAY_US);
}

// =============================================================================
// Pin Assignment Tests
// =============================================================================

#[test]
fn pins_unique() {
    let all = [
        pins::LED_STATUS,
        pins::SERIAL_TX,
        pins::BUS_SCK,
        pins::BUS_MISO,
        pins::BUS_MOSI,
        pins::NRF_CSN,
        pins::NRF_CE,
    ];
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn tick_timer_is_basic_timer() {
    // TIM6/TIM7 are the basic timers
    assert!(timers::TICK == 6 || timers::TICK == 7);
}
