// 2.0: venture ledger. the authoritative record of share supply and last price.
// total_shares is fixed at creation; primary_shares_remaining only ever shrinks,
// floored at zero; last_vwap_price stays None until the first trade settles.

use crate::types::{Cash, GameId, ParticipantId, Price, Timestamp, VentureId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venture {
    pub id: VentureId,
    pub game_id: GameId,
    pub name: String,
    /// Participant administering this venture's share issuance.
    pub founder: ParticipantId,
    pub total_shares: u64,
    pub primary_shares_remaining: u64,
    /// Derived by the pricing engine, never set directly.
    pub last_vwap_price: Option<Price>,
    pub created_at: Timestamp,
}

impl Venture {
    pub fn new(
        id: VentureId,
        game_id: GameId,
        name: String,
        founder: ParticipantId,
        total_shares: u64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            game_id,
            name,
            founder,
            total_shares,
            primary_shares_remaining: total_shares,
            last_vwap_price: None,
            created_at: timestamp,
        }
    }

    /// Consume primary supply for an issuance.
    pub fn take_primary(&mut self, qty: u64) -> Result<(), VentureError> {
        if qty > self.primary_shares_remaining {
            return Err(VentureError::InsufficientSupply {
                requested: qty,
                remaining: self.primary_shares_remaining,
            });
        }
        self.primary_shares_remaining -= qty;
        Ok(())
    }

    pub fn issued_shares(&self) -> u64 {
        self.total_shares - self.primary_shares_remaining
    }

    /// last_vwap_price * total_shares. None until the first trade.
    pub fn market_cap(&self) -> Option<Cash> {
        self.last_vwap_price.map(|p| p.notional(self.total_shares))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VentureError {
    #[error("insufficient primary supply: requested {requested}, remaining {remaining}")]
    InsufficientSupply { requested: u64, remaining: u64 },
}
