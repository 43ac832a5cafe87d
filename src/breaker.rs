//! Per-venture circuit breaker.
//!
//! Pauses a venture's trading when the published price swings more than the
//! game's configured percentage between two consecutive VWAP updates. The pause
//! is deadline-based: it expires on its own once the configured duration passes
//! on the engine clock, and a new qualifying swing while paused replaces the
//! deadline instead of stacking a second pause.

use crate::types::Timestamp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Breaker thresholds, taken from the game configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakerParams {
    /// Swing threshold in percent of the previous price.
    pub percent: Decimal,
    pub duration_secs: i64,
}

/// Absolute swing between two prices, in percent of the previous one.
pub fn swing_percent(previous: Decimal, new: Decimal) -> Decimal {
    debug_assert!(previous > Decimal::ZERO);
    ((new - previous) / previous).abs() * dec!(100)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BreakerState {
    paused_until: Option<Timestamp>,
}

/// Outcome of feeding a price update through the breaker.
#[derive(Debug, Clone, Copy)]
pub struct BreakerTrip {
    pub swing_percent: Decimal,
    pub paused_until: Timestamp,
}

impl BreakerState {
    pub fn new() -> Self {
        Self { paused_until: None }
    }

    pub fn is_paused(&self, now: Timestamp) -> bool {
        matches!(self.paused_until, Some(until) if now < until)
    }

    pub fn paused_until(&self) -> Option<Timestamp> {
        self.paused_until
    }

    /// Drop an expired pause. Returns true when a pause actually ended, so the
    /// caller can emit the resume event.
    pub fn clear_if_expired(&mut self, now: Timestamp) -> bool {
        match self.paused_until {
            Some(until) if now >= until => {
                self.paused_until = None;
                true
            }
            _ => false,
        }
    }

    /// Evaluate a price move. Trips (or re-arms) the pause when the swing meets
    /// the threshold. `previous` is the price before this update; the breaker
    /// never fires on a venture's first price.
    pub fn record_swing(
        &mut self,
        previous: Decimal,
        new: Decimal,
        params: &BreakerParams,
        now: Timestamp,
    ) -> Option<BreakerTrip> {
        let swing = swing_percent(previous, new);
        if swing < params.percent {
            return None;
        }
        let paused_until = now.plus_seconds(params.duration_secs);
        self.paused_until = Some(paused_until);
        Some(BreakerTrip {
            swing_percent: swing,
            paused_until,
        })
    }
}
