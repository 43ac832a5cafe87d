// 8.0: every state change produces an event. used for audit trails and for the
// post-commit feed that drives price tickers and portfolio updates. the
// EventPayload enum lists all event types.

use crate::order::{Decision, PrimaryOrderStatus};
use crate::trade::Trade;
use crate::types::{GameId, OrderId, ParticipantId, Price, Timestamp, VentureId};
use crate::game::GameStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.payload.game_id()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Order lifecycle
    OrderSubmitted(OrderSubmittedEvent),
    OrderDecided(OrderDecidedEvent),
    OrderExpired(OrderExpiredEvent),
    ListingPosted(ListingPostedEvent),
    ListingCancelled(ListingCancelledEvent),

    // Settlement and pricing
    TradeSettled(TradeSettledEvent),
    PriceUpdated(PriceUpdatedEvent),

    // Volatility control
    BreakerTripped(BreakerTrippedEvent),
    BreakerCleared(BreakerClearedEvent),

    // Game lifecycle
    GameStatusChanged(GameStatusChangedEvent),
}

impl EventPayload {
    pub fn game_id(&self) -> GameId {
        match self {
            EventPayload::OrderSubmitted(e) => e.game_id,
            EventPayload::OrderDecided(e) => e.game_id,
            EventPayload::OrderExpired(e) => e.game_id,
            EventPayload::ListingPosted(e) => e.game_id,
            EventPayload::ListingCancelled(e) => e.game_id,
            EventPayload::TradeSettled(e) => e.trade.game_id,
            EventPayload::PriceUpdated(e) => e.game_id,
            EventPayload::BreakerTripped(e) => e.game_id,
            EventPayload::BreakerCleared(e) => e.game_id,
            EventPayload::GameStatusChanged(e) => e.game_id,
        }
    }

    pub fn venture_id(&self) -> Option<VentureId> {
        match self {
            EventPayload::OrderSubmitted(e) => Some(e.venture),
            EventPayload::OrderDecided(e) => Some(e.venture),
            EventPayload::OrderExpired(e) => Some(e.venture),
            EventPayload::ListingPosted(e) => Some(e.venture),
            EventPayload::ListingCancelled(e) => Some(e.venture),
            EventPayload::TradeSettled(e) => Some(e.trade.venture),
            EventPayload::PriceUpdated(e) => Some(e.venture),
            EventPayload::BreakerTripped(e) => Some(e.venture),
            EventPayload::BreakerCleared(e) => Some(e.venture),
            EventPayload::GameStatusChanged(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmittedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub order_id: OrderId,
    pub buyer: ParticipantId,
    pub qty: u64,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDecidedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub order_id: OrderId,
    pub decided_by: ParticipantId,
    pub decision: Decision,
    pub outcome: PrimaryOrderStatus,
    /// Set when an accept was auto-rejected because supply or funds went stale.
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExpiredEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub order_id: OrderId,
    pub kind: ExpiredOrderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiredOrderKind {
    Primary,
    SecondaryListing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPostedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub order_id: OrderId,
    pub seller: ParticipantId,
    pub qty: u64,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingCancelledEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub order_id: OrderId,
    pub seller: ParticipantId,
    pub qty_unsold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSettledEvent {
    pub trade: Trade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdatedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub previous: Option<Price>,
    pub new: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerTrippedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
    pub swing_percent: Decimal,
    pub paused_until: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerClearedEvent {
    pub game_id: GameId,
    pub venture: VentureId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatusChangedEvent {
    pub game_id: GameId,
    pub from: GameStatus,
    pub to: GameStatus,
}
