// 9.1 engine/core.rs: main engine. holds all games, ventures, participants,
// positions, orders, and the trade tape. deterministic: time only moves when the
// caller moves it.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::breaker::BreakerState;
use crate::events::{
    Event, EventId, EventPayload, ExpiredOrderKind, GameStatusChangedEvent, OrderExpiredEvent,
};
use crate::game::{Game, GameConfig, GameStatus};
use crate::order::{PrimaryOrder, PrimaryOrderStatus, SecondaryListing};
use crate::participant::Participant;
use crate::position::Position;
use crate::pricing::VwapWindow;
use crate::trade::Trade;
use crate::types::{
    Cash, GameId, IdempotencyKey, OrderId, ParticipantId, Role, Timestamp, TradeId, VentureId,
};
use crate::venture::Venture;
use std::collections::HashMap;

/** 9.2: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) games: HashMap<GameId, Game>,
    pub(super) ventures: HashMap<VentureId, Venture>,
    pub(super) participants: HashMap<ParticipantId, Participant>,
    pub(super) positions: HashMap<(ParticipantId, VentureId), Position>,
    pub(super) primary_orders: HashMap<OrderId, PrimaryOrder>,
    pub(super) listings: HashMap<OrderId, SecondaryListing>,
    pub(super) trades: Vec<Trade>,
    pub(super) trade_index: HashMap<TradeId, usize>,
    pub(super) vwap_windows: HashMap<VentureId, VwapWindow>,
    pub(super) breakers: HashMap<VentureId, BreakerState>,
    pub(super) submit_keys: HashMap<IdempotencyKey, OrderId>,
    pub(super) settle_keys: HashMap<IdempotencyKey, TradeId>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_order_id: u64,
    pub(super) next_trade_id: u64,
    pub(super) next_participant_id: u64,
    pub(super) next_venture_id: u32,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            games: HashMap::new(),
            ventures: HashMap::new(),
            participants: HashMap::new(),
            positions: HashMap::new(),
            primary_orders: HashMap::new(),
            listings: HashMap::new(),
            trades: Vec::new(),
            trade_index: HashMap::new(),
            vwap_windows: HashMap::new(),
            breakers: HashMap::new(),
            submit_keys: HashMap::new(),
            settle_keys: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_order_id: 1,
            next_trade_id: 1,
            next_participant_id: 1,
            next_venture_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    /// Register a game. The role-budget table is validated here, not at trade
    /// time.
    pub fn create_game(&mut self, config: GameConfig) -> Result<GameId, EngineError> {
        config.role_budgets.validate()?;
        let game_id = config.id;
        let game = Game::new(config, self.current_time);
        self.games.insert(game_id, game);
        Ok(game_id)
    }

    /// Organizer-driven status change. Forward only; moving at or past Closed
    /// expires every still-pending order in the game.
    pub fn set_game_status(
        &mut self,
        game_id: GameId,
        to: GameStatus,
    ) -> Result<(), EngineError> {
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        let from = game.status;
        game.transition(to)?;

        self.emit_event(EventPayload::GameStatusChanged(GameStatusChangedEvent {
            game_id,
            from,
            to,
        }));

        let market_over = matches!(to, GameStatus::Closed | GameStatus::Results)
            && matches!(from, GameStatus::Draft | GameStatus::PreMarket | GameStatus::Open);
        if market_over {
            self.expire_open_orders(game_id);
        }
        Ok(())
    }

    /// Add a participant, drawing the budget from the game's role table unless
    /// the organizer overrides it.
    pub fn join_game(
        &mut self,
        game_id: GameId,
        display_name: impl Into<String>,
        role: Role,
        budget_override: Option<Cash>,
    ) -> Result<ParticipantId, EngineError> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        let budget = match budget_override {
            Some(b) => b,
            None => game
                .config
                .role_budgets
                .budget_for(&role)
                .ok_or(crate::game::GameError::UnknownRole { role: role.clone() })?,
        };

        let id = ParticipantId(self.next_participant_id);
        self.next_participant_id += 1;
        let participant = Participant::new(
            id,
            game_id,
            display_name.into(),
            role,
            budget,
            self.current_time,
        );
        self.participants.insert(id, participant);
        Ok(id)
    }

    /// Register a venture owned by a founder participant of the same game.
    pub fn create_venture(
        &mut self,
        game_id: GameId,
        name: impl Into<String>,
        founder: ParticipantId,
        total_shares: u64,
    ) -> Result<VentureId, EngineError> {
        if !self.games.contains_key(&game_id) {
            return Err(EngineError::GameNotFound(game_id));
        }
        let owner = self
            .participants
            .get(&founder)
            .ok_or(EngineError::ParticipantNotFound(founder))?;
        if owner.game_id != game_id || owner.role != Role::Founder {
            return Err(EngineError::NotAuthorized {
                participant: founder,
                action: "own a venture in this game",
            });
        }
        if total_shares == 0 {
            return Err(EngineError::InvalidQuantity {
                qty: 0,
                available: 0,
            });
        }

        let id = VentureId(self.next_venture_id);
        self.next_venture_id += 1;
        let venture = Venture::new(
            id,
            game_id,
            name.into(),
            founder,
            total_shares,
            self.current_time,
        );
        self.ventures.insert(id, venture);
        self.vwap_windows.insert(id, VwapWindow::new());
        self.breakers.insert(id, BreakerState::new());
        Ok(id)
    }

    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        self.games.get(&game_id)
    }

    pub fn venture(&self, venture_id: VentureId) -> Option<&Venture> {
        self.ventures.get(&venture_id)
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&participant_id)
    }

    pub fn position(
        &self,
        participant: ParticipantId,
        venture: VentureId,
    ) -> Option<&Position> {
        self.positions.get(&(participant, venture))
    }

    pub fn primary_order(&self, order_id: OrderId) -> Option<&PrimaryOrder> {
        self.primary_orders.get(&order_id)
    }

    pub fn listing(&self, order_id: OrderId) -> Option<&SecondaryListing> {
        self.listings.get(&order_id)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trades_for_venture(&self, venture_id: VentureId) -> Vec<&Trade> {
        self.trades
            .iter()
            .filter(|t| t.venture == venture_id)
            .collect()
    }

    /// Whether the venture is currently paused by its circuit breaker.
    pub fn breaker_paused(&self, venture_id: VentureId) -> bool {
        self.breakers
            .get(&venture_id)
            .map(|b| b.is_paused(self.current_time))
            .unwrap_or(false)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Events appended since a previous `events_len` observation. Used by the
    /// service layer to publish after commit.
    pub fn events_since(&self, mark: usize) -> &[Event] {
        let start = mark.min(self.events.len());
        &self.events[start..]
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    pub(super) fn next_trade_id(&mut self) -> TradeId {
        let id = TradeId(self.next_trade_id);
        self.next_trade_id += 1;
        id
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        tracing::trace!(event_id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    // Pending orders do not survive the end of the market. Primary orders are
    // auto-rejected, listings are marked expired; both get an expiry event.
    fn expire_open_orders(&mut self, game_id: GameId) {
        let now = self.current_time;

        let mut expired = Vec::new();
        for order in self.primary_orders.values_mut() {
            if order.game_id == game_id && order.is_pending() {
                order.mark_decided(PrimaryOrderStatus::Rejected, now);
                expired.push((order.id, order.venture, ExpiredOrderKind::Primary));
            }
        }
        for listing in self.listings.values_mut() {
            if listing.game_id == game_id && listing.status == crate::order::ListingStatus::Pending
            {
                listing.expire(now);
                expired.push((listing.id, listing.venture, ExpiredOrderKind::SecondaryListing));
            }
        }

        // Deterministic event order regardless of map iteration.
        expired.sort_by_key(|(id, _, _)| *id);
        for (order_id, venture, kind) in expired {
            self.emit_event(EventPayload::OrderExpired(OrderExpiredEvent {
                game_id,
                venture,
                order_id,
                kind,
            }));
        }
    }
}
