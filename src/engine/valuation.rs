//! Portfolio and leaderboard valuation.
//!
//! Everything here is a read-only projection recomputed on demand. Positions in
//! ventures with no trades yet contribute zero. Rankings carry a documented,
//! stable tiebreak so repeated queries paginate identically: ROI descending,
//! then total value descending, then earliest join, then participant id.

use super::core::Engine;
use super::results::EngineError;
use crate::types::{Cash, GameId, ParticipantId, Price, Role, Timestamp, VentureId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cmp::Ordering;

/// One leaderboard row for a venture.
#[derive(Debug, Clone)]
pub struct VentureRank {
    pub venture: VentureId,
    pub name: String,
    pub last_vwap_price: Option<Price>,
    pub market_cap: Option<Cash>,
}

/// One valuation row for a participant.
#[derive(Debug, Clone)]
pub struct PortfolioRow {
    pub participant: ParticipantId,
    pub display_name: String,
    pub role: Role,
    pub current_cash: Cash,
    pub portfolio_value: Cash,
    pub total_value: Cash,
    /// None when the initial budget is zero (founders by default).
    pub roi_percent: Option<Decimal>,
    pub joined_at: Timestamp,
}

impl Engine {
    /// Mark-to-market value of all holdings. Null prices count as zero.
    pub fn portfolio_value(
        &self,
        participant: ParticipantId,
    ) -> Result<Cash, EngineError> {
        if !self.participants.contains_key(&participant) {
            return Err(EngineError::ParticipantNotFound(participant));
        }
        let value = self
            .positions
            .iter()
            .filter(|((owner, _), _)| *owner == participant)
            .filter_map(|((_, venture_id), position)| {
                let price = self.ventures.get(venture_id)?.last_vwap_price?;
                Some(position.value_at(price))
            })
            .sum();
        Ok(value)
    }

    pub fn total_value(&self, participant: ParticipantId) -> Result<Cash, EngineError> {
        let record = self
            .participants
            .get(&participant)
            .ok_or(EngineError::ParticipantNotFound(participant))?;
        Ok(record.current_cash.add(self.portfolio_value(participant)?))
    }

    /// (total - initial) / initial * 100. None for zero-budget participants.
    pub fn roi_percent(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<Decimal>, EngineError> {
        let record = self
            .participants
            .get(&participant)
            .ok_or(EngineError::ParticipantNotFound(participant))?;
        if record.initial_budget.is_zero() {
            return Ok(None);
        }
        let total = self.total_value(participant)?;
        let initial = record.initial_budget.value();
        Ok(Some(
            (total.value() - initial) / initial * dec!(100),
        ))
    }

    /// Ventures ranked by market cap, descending, unpriced ventures last.
    pub fn venture_leaderboard(
        &self,
        game_id: GameId,
    ) -> Result<Vec<VentureRank>, EngineError> {
        if !self.games.contains_key(&game_id) {
            return Err(EngineError::GameNotFound(game_id));
        }
        let mut rows: Vec<VentureRank> = self
            .ventures
            .values()
            .filter(|v| v.game_id == game_id)
            .map(|v| VentureRank {
                venture: v.id,
                name: v.name.clone(),
                last_vwap_price: v.last_vwap_price,
                market_cap: v.market_cap(),
            })
            .collect();
        rows.sort_by(|a, b| match (&a.market_cap, &b.market_cap) {
            (Some(x), Some(y)) => y.cmp(x).then(a.venture.cmp(&b.venture)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.venture.cmp(&b.venture),
        });
        Ok(rows)
    }

    /// Participants of one role ranked by ROI with the documented tiebreak.
    pub fn role_leaderboard(
        &self,
        game_id: GameId,
        role: &Role,
    ) -> Result<Vec<PortfolioRow>, EngineError> {
        let mut rows: Vec<PortfolioRow> = self
            .portfolio_data(game_id)?
            .into_iter()
            .filter(|row| &row.role == role)
            .collect();
        rows.sort_by(|a, b| {
            rank_roi(b.roi_percent, a.roi_percent)
                .then(b.total_value.cmp(&a.total_value))
                .then(a.joined_at.cmp(&b.joined_at))
                .then(a.participant.cmp(&b.participant))
        });
        Ok(rows)
    }

    pub fn angel_leaderboard(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        self.role_leaderboard(game_id, &Role::Angel)
    }

    pub fn vc_leaderboard(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        self.role_leaderboard(game_id, &Role::Vc)
    }

    /// Valuation rows for every participant in a game, ordered by id.
    pub fn portfolio_data(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        if !self.games.contains_key(&game_id) {
            return Err(EngineError::GameNotFound(game_id));
        }
        let mut rows = Vec::new();
        let mut ids: Vec<ParticipantId> = self
            .participants
            .values()
            .filter(|p| p.game_id == game_id)
            .map(|p| p.id)
            .collect();
        ids.sort();
        for id in ids {
            // Participants were just enumerated from the map; lookups succeed.
            let record = &self.participants[&id];
            let portfolio_value = self.portfolio_value(id)?;
            let total_value = record.current_cash.add(portfolio_value);
            let roi_percent = self.roi_percent(id)?;
            rows.push(PortfolioRow {
                participant: id,
                display_name: record.display_name.clone(),
                role: record.role.clone(),
                current_cash: record.current_cash,
                portfolio_value,
                total_value,
                roi_percent,
                joined_at: record.created_at,
            });
        }
        Ok(rows)
    }
}

// Descending-friendly ROI comparison: None (no meaningful ROI) sorts below any
// value.
fn rank_roi(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
