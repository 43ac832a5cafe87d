// 7.0: price discovery. a venture's price is the volume-weighted average of its
// last VWAP_WINDOW trades. fewer trades average over what exists; zero trades
// means no price at all.
//
// rounding policy: the published VWAP is rounded to 2 decimal places, midpoint
// away from zero, and floored at the minimum tick. cash movements elsewhere
// stay exact; only the derived price is rounded.

use crate::types::Price;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of most-recent trades the VWAP is computed over.
pub const VWAP_WINDOW: usize = 3;

const VWAP_SCALE: u32 = 2;

/// Smallest publishable price. A window of sub-cent trades floors here
/// instead of rounding down to an invalid zero price.
const MIN_TICK: Decimal = dec!(0.01);

/// Rolling per-venture trade window feeding the VWAP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VwapWindow {
    trades: VecDeque<(u64, Price)>,
}

impl VwapWindow {
    pub fn new() -> Self {
        Self {
            trades: VecDeque::with_capacity(VWAP_WINDOW + 1),
        }
    }

    /// Record a settled trade and return the recomputed price.
    pub fn record(&mut self, qty: u64, price: Price) -> Price {
        debug_assert!(qty > 0);
        self.trades.push_back((qty, price));
        while self.trades.len() > VWAP_WINDOW {
            self.trades.pop_front();
        }
        // The window is non-empty here, so a price always exists.
        self.vwap().unwrap_or(price)
    }

    /// Current VWAP over the window, or None before any trade.
    pub fn vwap(&self) -> Option<Price> {
        if self.trades.is_empty() {
            return None;
        }
        let mut notional = Decimal::ZERO;
        let mut volume = Decimal::ZERO;
        for (qty, price) in &self.trades {
            let qty = Decimal::from(*qty);
            notional += qty * price.value();
            volume += qty;
        }
        let raw = notional / volume;
        let rounded =
            raw.round_dp_with_strategy(VWAP_SCALE, RoundingStrategy::MidpointAwayFromZero);
        Price::new(rounded.max(MIN_TICK))
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
