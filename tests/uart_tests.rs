//! Software UART Tests
//!
//! Tests for frame shaping, bit timing and the blocking writer handshake with
//! the tick interrupt (played here by a ticker thread).
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test uart_tests

use core::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use embedded_hal::digital::PinState;
use nrf24_probe::tick::TickShared;
use nrf24_probe::uart::{TxFrame, FRAME_BITS};

/// Levels one frame must produce, one per tick
fn expected_frame(byte: u8) -> Vec<PinState> {
    let mut levels = vec![PinState::Low];
    levels.extend((0..8).map(|i| PinState::from(byte >> i & 1 != 0)));
    levels.push(PinState::High);
    levels
}

/// Decode consecutive 10-level frames back into bytes
fn decode(levels: &[PinState]) -> Vec<u8> {
    assert_eq!(levels.len() % usize::from(FRAME_BITS), 0, "partial frame");
    levels
        .chunks(usize::from(FRAME_BITS))
        .map(|frame| {
            assert_eq!(frame[0], PinState::Low, "start bit");
            assert_eq!(frame[9], PinState::High, "stop bit");
            frame[1..9]
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | u8::from(bit == PinState::High) << i)
        })
        .collect()
}

/// Run `body` against a shared block while a thread ticks it, returning
/// every level the interrupt drove
fn with_ticker(body: impl FnOnce(&TickShared)) -> Vec<PinState> {
    let shared = Arc::new(TickShared::new());
    let stop = Arc::new(AtomicBool::new(false));

    let ticker = {
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut driven = Vec::new();
            while !stop.load(Ordering::Acquire) {
                if let Some(level) = shared.on_tick() {
                    driven.push(level);
                }
                thread::yield_now();
            }
            driven
        })
    };

    body(&shared);
    let mut serial = shared.serial();
    serial.flush();
    stop.store(true, Ordering::Release);
    ticker.join().unwrap()
}

// =============================================================================
// Frame Tests
// =============================================================================

#[test]
fn frame_spans_ten_ticks() {
    let mut frame = TxFrame::new();
    assert!(frame.load(0x4B));
    let levels: Vec<_> = (0..FRAME_BITS).map(|_| frame.tick().unwrap()).collect();
    assert_eq!(levels, expected_frame(0x4B));
    assert!(!frame.is_busy());
    assert_eq!(frame.tick(), None);
}

#[test]
fn line_idles_after_stop_bit() {
    let shared = TickShared::new();
    assert!(shared.try_queue(b'A'));
    let levels: Vec<_> = (0..FRAME_BITS).filter_map(|_| shared.on_tick()).collect();
    assert_eq!(levels, expected_frame(b'A'));
    assert!(!shared.tx_busy());
    for _ in 0..5 {
        assert_eq!(shared.on_tick(), None);
    }
}

#[test]
fn second_byte_rejected_until_frame_done() {
    let shared = TickShared::new();
    assert!(shared.try_queue(0x00));
    for _ in 0..FRAME_BITS - 1 {
        shared.on_tick();
        assert!(!shared.try_queue(0xFF));
    }
    shared.on_tick();
    assert!(shared.try_queue(0xFF));
}

#[test]
fn try_write_would_block_while_busy() {
    let shared = TickShared::new();
    let mut serial = shared.serial();
    assert_eq!(serial.try_write(0x31), Ok(()));
    assert_eq!(serial.try_write(0x32), Err(nb::Error::WouldBlock));
}

// =============================================================================
// Writer Handshake Tests
// =============================================================================

#[test]
fn back_to_back_bytes_do_not_overlap() {
    let driven = with_ticker(|shared| {
        let mut serial = shared.serial();
        serial.send_byte(0x55);
        serial.send_byte(0xA3);
    });

    let mut expected = expected_frame(0x55);
    expected.extend(expected_frame(0xA3));
    assert_eq!(driven, expected);
}

#[test]
fn formatted_hex_goes_out_in_order() {
    let driven = with_ticker(|shared| {
        let mut serial = shared.serial();
        write!(serial, "read status 0x{:x}\r\n", 0x0E).unwrap();
    });
    assert_eq!(decode(&driven), b"read status 0xe\r\n");
}

#[test]
fn hex_has_no_padding() {
    let driven = with_ticker(|shared| {
        let mut serial = shared.serial();
        write!(serial, "0x{:x} 0x{:x}", 0x0u8, 0xB3u8).unwrap();
    });
    assert_eq!(decode(&driven), b"0x0 0xb3");
}

#[test]
fn send_str_emits_every_byte() {
    let driven = with_ticker(|shared| {
        shared.serial().send_str("CE pulse\r\n");
    });
    assert_eq!(driven.len(), 10 * usize::from(FRAME_BITS));
    assert_eq!(decode(&driven), b"CE pulse\r\n");
}
