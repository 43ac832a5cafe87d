// 6.0: trades. append-only, immutable record of every completed exchange.
// seller == None means primary issuance. trades are the sole input to price
// discovery and audit; nothing ever edits or deletes one.

use crate::types::{Cash, GameId, ParticipantId, Price, Timestamp, TradeId, VentureId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketType {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub game_id: GameId,
    pub venture: VentureId,
    pub qty: u64,
    pub price_per_share: Price,
    pub buyer: ParticipantId,
    /// None for primary issuance.
    pub seller: Option<ParticipantId>,
    pub market_type: MarketType,
    pub executed_at: Timestamp,
}

impl Trade {
    pub fn notional(&self) -> Cash {
        self.price_per_share.notional(self.qty)
    }
}
