//! Millisecond time base
//!
//! Converts the fixed-period timer tick into a monotonic millisecond count
//! by integer accumulation. No floating point, and the long-run error stays
//! below one tick period.

use crate::config::TICK_PERIOD_US;

/// Microseconds per millisecond
const US_PER_MS: u16 = 1000;

/// Monotonic millisecond counter fed by the periodic tick
///
/// Only the tick handler mutates it. Readers in other contexts go through
/// [`crate::tick::TickShared::now_ms`], which masks interrupts around the
/// 64-bit read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBase {
    millis: u64,
    /// Microseconds not yet carried into `millis`, always below 1000
    accumulator: u16,
    period_us: u16,
}

impl TimeBase {
    /// Time base for the default tick period
    #[must_use]
    pub const fn new() -> Self {
        Self::with_period(TICK_PERIOD_US)
    }

    /// Time base for an arbitrary tick period in microseconds
    #[must_use]
    pub const fn with_period(period_us: u16) -> Self {
        Self {
            millis: 0,
            accumulator: 0,
            period_us,
        }
    }

    /// Account for one elapsed tick
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self) {
        let total = u32::from(self.accumulator) + u32::from(self.period_us);
        let carry = total / u32::from(US_PER_MS);
        self.millis += u64::from(carry);
        // Remainder is below 1000, fits the accumulator
        self.accumulator = (total % u32::from(US_PER_MS)) as u16;
    }

    /// Elapsed milliseconds
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.millis
    }

    /// Sub-millisecond remainder in microseconds
    #[must_use]
    pub const fn accumulator(&self) -> u16 {
        self.accumulator
    }

    /// Tick period in microseconds
    #[must_use]
    pub const fn period_us(&self) -> u16 {
        self.period_us
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimeBase {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{:03}ms", self.millis, self.accumulator);
    }
}

/// Fires once every time more than `period_ms` has passed since it last fired
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    period_ms: u64,
    last_ms: u64,
}

impl Interval {
    /// Create an interval whose reference point is time zero
    #[must_use]
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    /// Check against the current time (and rearm if fired)
    pub fn check(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) > self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Time of the last firing
    #[must_use]
    pub const fn last(&self) -> u64 {
        self.last_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let tb = TimeBase::new();
        assert_eq!(tb.millis(), 0);
        assert_eq!(tb.accumulator(), 0);
        assert_eq!(tb.period_us(), 103);
    }

    #[test]
    fn carries_on_exact_millisecond() {
        let mut tb = TimeBase::with_period(250);
        for _ in 0..4 {
            tb.advance();
        }
        assert_eq!(tb.millis(), 1);
        assert_eq!(tb.accumulator(), 0);
    }

    #[test]
    fn longest_period_does_not_overflow() {
        let mut tb = TimeBase::with_period(u16::MAX);
        tb.advance();
        tb.advance();
        assert_eq!(tb.millis(), 131);
        assert_eq!(tb.accumulator(), 70);
    }

    #[test]
    fn interval_fires_after_period() {
        let mut iv = Interval::new(2000);
        assert!(!iv.check(2000));
        assert!(iv.check(2001));
        assert_eq!(iv.last(), 2001);
        assert!(!iv.check(4001));
        assert!(iv.check(4002));
    }
}
