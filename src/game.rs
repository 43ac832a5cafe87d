//! Game configuration and lifecycle.
//!
//! A game is one bounded trading event. Its status only moves forward: once an
//! organizer publishes results there is no way back to an open market.

use crate::types::{Cash, GameId, Price, Role, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Game status. Transitions are organizer-driven and strictly monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Draft,
    PreMarket,
    Open,
    Closed,
    Results,
}

impl GameStatus {
    fn rank(&self) -> u8 {
        match self {
            GameStatus::Draft => 0,
            GameStatus::PreMarket => 1,
            GameStatus::Open => 2,
            GameStatus::Closed => 3,
            GameStatus::Results => 4,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::Draft => "draft",
            GameStatus::PreMarket => "pre_market",
            GameStatus::Open => "open",
            GameStatus::Closed => "closed",
            GameStatus::Results => "results",
        };
        write!(f, "{}", s)
    }
}

/// Default starting budget per role, fixed when the game is configured.
/// Custom roles must be registered here before anyone can join with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleBudgets {
    budgets: HashMap<Role, Cash>,
}

impl RoleBudgets {
    pub fn new(budgets: HashMap<Role, Cash>) -> Self {
        Self { budgets }
    }

    pub fn budget_for(&self, role: &Role) -> Option<Cash> {
        self.budgets.get(role).copied()
    }

    pub fn validate(&self) -> Result<(), GameError> {
        for core in [Role::Founder, Role::Angel, Role::Vc] {
            if !self.budgets.contains_key(&core) {
                return Err(GameError::MissingRoleBudget { role: core });
            }
        }
        for (role, budget) in &self.budgets {
            if budget.is_negative() {
                return Err(GameError::NegativeRoleBudget {
                    role: role.clone(),
                    budget: *budget,
                });
            }
        }
        Ok(())
    }
}

impl Default for RoleBudgets {
    fn default() -> Self {
        let mut budgets = HashMap::new();
        budgets.insert(Role::Founder, Cash::new(dec!(0)));
        budgets.insert(Role::Angel, Cash::new(dec!(50_000)));
        budgets.insert(Role::Vc, Cash::new(dec!(250_000)));
        Self { budgets }
    }
}

/// Static game configuration (immutable after creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub id: GameId,
    pub name: String,
    /// Display currency code (e.g., "USD"). Purely cosmetic to the engine.
    pub currency: String,
    /// Peer-to-peer resale of issued shares.
    pub allow_secondary: bool,
    /// Volatility pause on excessive price swings.
    pub circuit_breaker: bool,
    /// Swing threshold in percent (e.g., 200 = a 200% move trips the breaker).
    pub circuit_breaker_percent: Decimal,
    pub circuit_breaker_duration_secs: i64,
    /// Optional cap on any order's price per share.
    pub max_price_per_share: Option<Price>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub role_budgets: RoleBudgets,
}

impl GameConfig {
    /// A sensible demo configuration used by the simulation and tests.
    pub fn demo(id: GameId) -> Self {
        Self {
            id,
            name: "Demo Pitch Night".to_string(),
            currency: "USD".to_string(),
            allow_secondary: true,
            circuit_breaker: true,
            circuit_breaker_percent: dec!(200),
            circuit_breaker_duration_secs: 300,
            max_price_per_share: Some(Price::new_unchecked(dec!(1_000))),
            starts_at: None,
            ends_at: None,
            role_budgets: RoleBudgets::default(),
        }
    }
}

/// Dynamic game state.
#[derive(Debug, Clone)]
pub struct Game {
    pub config: GameConfig,
    pub status: GameStatus,
    pub created_at: Timestamp,
}

impl Game {
    pub fn new(config: GameConfig, timestamp: Timestamp) -> Self {
        Self {
            config,
            status: GameStatus::Draft,
            created_at: timestamp,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == GameStatus::Open
    }

    /// Move the game forward. Going backwards or standing still is rejected.
    pub fn transition(&mut self, to: GameStatus) -> Result<(), GameError> {
        if to.rank() <= self.status.rank() {
            return Err(GameError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GameError {
    #[error("cannot transition game from {from} to {to}")]
    InvalidTransition { from: GameStatus, to: GameStatus },

    #[error("no default budget configured for role {role}")]
    MissingRoleBudget { role: Role },

    #[error("role {role} has negative default budget {budget}")]
    NegativeRoleBudget { role: Role, budget: Cash },

    #[error("no budget configured for role {role} in this game")]
    UnknownRole { role: Role },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_only() {
        let mut game = Game::new(GameConfig::demo(GameId(1)), Timestamp::from_millis(0));
        assert_eq!(game.status, GameStatus::Draft);

        game.transition(GameStatus::PreMarket).unwrap();
        game.transition(GameStatus::Open).unwrap();
        assert!(game.is_open());

        // No reversal once advanced.
        let err = game.transition(GameStatus::PreMarket);
        assert!(matches!(err, Err(GameError::InvalidTransition { .. })));

        game.transition(GameStatus::Results).unwrap();
        assert!(game.transition(GameStatus::Closed).is_err());
    }

    #[test]
    fn skipping_statuses_is_allowed_forward() {
        let mut game = Game::new(GameConfig::demo(GameId(1)), Timestamp::from_millis(0));
        game.transition(GameStatus::Open).unwrap();
        assert!(game.is_open());
    }

    #[test]
    fn default_budgets_validate() {
        assert!(RoleBudgets::default().validate().is_ok());
    }

    #[test]
    fn missing_core_role_rejected() {
        let mut budgets = HashMap::new();
        budgets.insert(Role::Founder, Cash::zero());
        budgets.insert(Role::Angel, Cash::new(dec!(1_000)));
        let budgets = RoleBudgets::new(budgets);
        assert!(matches!(
            budgets.validate(),
            Err(GameError::MissingRoleBudget { role: Role::Vc })
        ));
    }

    #[test]
    fn negative_budget_rejected() {
        let mut budgets = HashMap::new();
        budgets.insert(Role::Founder, Cash::zero());
        budgets.insert(Role::Angel, Cash::new(dec!(1_000)));
        budgets.insert(Role::Vc, Cash::new(dec!(-5)));
        let budgets = RoleBudgets::new(budgets);
        assert!(matches!(
            budgets.validate(),
            Err(GameError::NegativeRoleBudget { .. })
        ));
    }

    #[test]
    fn custom_role_budget_lookup() {
        let mut budgets = HashMap::new();
        budgets.insert(Role::Founder, Cash::zero());
        budgets.insert(Role::Angel, Cash::new(dec!(1_000)));
        budgets.insert(Role::Vc, Cash::new(dec!(2_000)));
        budgets.insert(Role::Custom("scout".into()), Cash::new(dec!(500)));
        let budgets = RoleBudgets::new(budgets);

        assert!(budgets.validate().is_ok());
        assert_eq!(
            budgets.budget_for(&Role::Custom("scout".into())),
            Some(Cash::new(dec!(500)))
        );
        assert_eq!(budgets.budget_for(&Role::Custom("ghost".into())), None);
    }
}
