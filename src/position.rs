// 4.0: per-(participant, venture) holding. created on the first trade touching the
// pair, never deleted, only decremented toward zero.
// avg_cost is the weighted average purchase price; selling leaves it unchanged.

use crate::types::{Cash, ParticipantId, Price, Timestamp, VentureId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub participant: ParticipantId,
    pub venture: VentureId,
    pub qty_total: u64,
    /// Weighted average purchase price. Zero while qty_total is zero and nothing
    /// was ever bought.
    pub avg_cost: Decimal,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn new(participant: ParticipantId, venture: VentureId, timestamp: Timestamp) -> Self {
        Self {
            participant,
            venture,
            qty_total: 0,
            avg_cost: Decimal::ZERO,
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.qty_total == 0
    }

    // 4.1: buy: new avg = (old_qty * old_avg + qty * price) / (old_qty + qty)
    pub fn apply_buy(&mut self, qty: u64, price: Price, timestamp: Timestamp) {
        debug_assert!(qty > 0);
        let old_qty = Decimal::from(self.qty_total);
        let add_qty = Decimal::from(qty);
        let weighted = old_qty * self.avg_cost + add_qty * price.value();
        self.avg_cost = weighted / (old_qty + add_qty);
        self.qty_total += qty;
        self.updated_at = timestamp;
    }

    // 4.2: sell: qty shrinks, cost basis of the remainder is untouched.
    pub fn apply_sell(
        &mut self,
        qty: u64,
        timestamp: Timestamp,
    ) -> Result<(), PositionError> {
        if qty > self.qty_total {
            return Err(PositionError::InsufficientShares {
                requested: qty,
                held: self.qty_total,
            });
        }
        self.qty_total -= qty;
        self.updated_at = timestamp;
        Ok(())
    }

    /// Mark-to-market value at the given price. None price (no trades yet)
    /// contributes zero by the caller's convention.
    pub fn value_at(&self, price: Price) -> Cash {
        price.notional(self.qty_total)
    }

    pub fn cost_basis(&self) -> Cash {
        Cash::new(Decimal::from(self.qty_total) * self.avg_cost)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PositionError {
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u64, held: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pos() -> Position {
        Position::new(ParticipantId(1), VentureId(1), Timestamp::from_millis(0))
    }

    #[test]
    fn first_buy_sets_cost_basis() {
        let mut p = pos();
        p.apply_buy(10, Price::new_unchecked(dec!(100)), Timestamp::from_millis(1));
        assert_eq!(p.qty_total, 10);
        assert_eq!(p.avg_cost, dec!(100));
    }

    #[test]
    fn buys_average_the_cost() {
        let mut p = pos();
        p.apply_buy(10, Price::new_unchecked(dec!(100)), Timestamp::from_millis(1));
        p.apply_buy(30, Price::new_unchecked(dec!(140)), Timestamp::from_millis(2));
        // (10*100 + 30*140) / 40 = 130
        assert_eq!(p.qty_total, 40);
        assert_eq!(p.avg_cost, dec!(130));
        assert_eq!(p.cost_basis().value(), dec!(5_200));
    }

    #[test]
    fn sell_keeps_avg_cost() {
        let mut p = pos();
        p.apply_buy(20, Price::new_unchecked(dec!(50)), Timestamp::from_millis(1));
        p.apply_sell(15, Timestamp::from_millis(2)).unwrap();
        assert_eq!(p.qty_total, 5);
        assert_eq!(p.avg_cost, dec!(50));
    }

    #[test]
    fn oversell_rejected() {
        let mut p = pos();
        p.apply_buy(5, Price::new_unchecked(dec!(10)), Timestamp::from_millis(1));
        let err = p.apply_sell(6, Timestamp::from_millis(2));
        assert!(matches!(
            err,
            Err(PositionError::InsufficientShares {
                requested: 6,
                held: 5
            })
        ));
        assert_eq!(p.qty_total, 5);
    }

    #[test]
    fn sell_to_zero_keeps_record() {
        let mut p = pos();
        p.apply_buy(5, Price::new_unchecked(dec!(10)), Timestamp::from_millis(1));
        p.apply_sell(5, Timestamp::from_millis(2)).unwrap();
        assert!(p.is_empty());
        // Rebuy after a full exit re-averages from scratch.
        p.apply_buy(2, Price::new_unchecked(dec!(30)), Timestamp::from_millis(3));
        assert_eq!(p.avg_cost, dec!(30));
    }

    #[test]
    fn mark_to_market_value() {
        let mut p = pos();
        p.apply_buy(8, Price::new_unchecked(dec!(25)), Timestamp::from_millis(1));
        assert_eq!(p.value_at(Price::new_unchecked(dec!(40))).value(), dec!(320));
    }
}
