// 9.0.2: result types and errors for engine operations.
//
// Validation errors are business-rule violations: returned synchronously,
// never retried. StaleOrder is the expected outcome of losing a supply or
// funds race between submission and acceptance, not a failure.

use crate::game::{GameError, GameStatus};
use crate::order::{ListingStatus, PrimaryOrderStatus};
use crate::participant::ParticipantError;
use crate::position::PositionError;
use crate::types::{Cash, GameId, OrderId, ParticipantId, Price, Timestamp, VentureId};
use crate::venture::VentureError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("game {0:?} not found")]
    GameNotFound(GameId),

    #[error("venture {0:?} not found")]
    VentureNotFound(VentureId),

    #[error("participant {0:?} not found")]
    ParticipantNotFound(ParticipantId),

    #[error("order {0:?} not found")]
    OrderNotFound(OrderId),

    #[error("invalid quantity {qty}, available {available}")]
    InvalidQuantity { qty: u64, available: u64 },

    #[error("price {price} exceeds game maximum {max}")]
    PriceOutOfBounds { price: Price, max: Price },

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Cash, available: Cash },

    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u64, held: u64 },

    #[error("insufficient primary supply: requested {requested}, remaining {remaining}")]
    InsufficientSupply { requested: u64, remaining: u64 },

    #[error("market closed for venture {venture:?}: {reason}")]
    MarketClosed {
        venture: VentureId,
        reason: MarketClosedReason,
    },

    #[error("order {order:?} already decided ({status})")]
    OrderAlreadyDecided {
        order: OrderId,
        status: PrimaryOrderStatus,
    },

    #[error("order {order:?} went stale before acceptance: {cause}")]
    StaleOrder {
        order: OrderId,
        cause: Box<EngineError>,
    },

    #[error("listing {order:?} is not open ({status:?})")]
    ListingNotOpen {
        order: OrderId,
        status: ListingStatus,
    },

    #[error("participant {participant:?} is not authorized to {action}")]
    NotAuthorized {
        participant: ParticipantId,
        action: &'static str,
    },

    #[error("game error: {0}")]
    Game(#[from] GameError),
}

/// Why admission is refusing orders on a venture right now.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketClosedReason {
    #[error("game is {status}")]
    GameNotOpen { status: GameStatus },

    #[error("circuit breaker paused until {until:?}")]
    BreakerPaused { until: Timestamp },

    #[error("secondary trading disabled for this game")]
    SecondaryDisabled,
}

impl From<ParticipantError> for EngineError {
    fn from(err: ParticipantError) -> Self {
        match err {
            ParticipantError::InsufficientFunds {
                required,
                available,
            } => EngineError::InsufficientFunds {
                required,
                available,
            },
        }
    }
}

impl From<VentureError> for EngineError {
    fn from(err: VentureError) -> Self {
        match err {
            VentureError::InsufficientSupply {
                requested,
                remaining,
            } => EngineError::InsufficientSupply {
                requested,
                remaining,
            },
        }
    }
}

impl From<PositionError> for EngineError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::InsufficientShares { requested, held } => {
                EngineError::InsufficientShares { requested, held }
            }
        }
    }
}

impl EngineError {
    /// Validation-class errors that mean an accepted order lost a race rather
    /// than the engine misbehaving.
    pub(crate) fn is_stale_cause(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientFunds { .. }
                | EngineError::InsufficientSupply { .. }
                | EngineError::InvalidQuantity { .. }
        )
    }
}
