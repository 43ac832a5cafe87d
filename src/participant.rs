// 3.0: participant ledger. one record per (user, game) membership.
// current_cash never goes negative: it only decreases on a buy and increases on a
// sell or on founder receipt of primary-sale proceeds.

use crate::types::{Cash, GameId, ParticipantId, Role, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub game_id: GameId,
    pub display_name: String,
    pub role: Role,
    pub initial_budget: Cash,
    pub current_cash: Cash,
    pub created_at: Timestamp,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        game_id: GameId,
        display_name: String,
        role: Role,
        budget: Cash,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            game_id,
            display_name,
            role,
            initial_budget: budget,
            current_cash: budget,
            created_at: timestamp,
        }
    }

    pub fn can_afford(&self, amount: Cash) -> bool {
        amount <= self.current_cash
    }

    pub fn debit(&mut self, amount: Cash) -> Result<(), ParticipantError> {
        if amount > self.current_cash {
            return Err(ParticipantError::InsufficientFunds {
                required: amount,
                available: self.current_cash,
            });
        }
        self.current_cash = self.current_cash.sub(amount);
        Ok(())
    }

    pub fn credit(&mut self, amount: Cash) {
        debug_assert!(!amount.is_negative());
        self.current_cash = self.current_cash.add(amount);
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParticipantError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Cash, available: Cash },
}
