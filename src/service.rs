//! Concurrent service boundary over the deterministic engine.
//!
//! The engine itself is single-threaded; this wrapper makes it safe to share.
//! Mutating calls take a per-venture admission lock first, so orders against
//! one venture are strictly serialized while distinct ventures proceed in
//! parallel up to the store lock, which is held only for the duration of a
//! single settlement. Reads take the shared lock and see committed state only.
//! Committed events are published to the feed after the write lock is
//! released: delivery can neither block nor roll back a settlement.

use crate::engine::{Engine, EngineConfig, EngineError, PortfolioRow, VentureRank};
use crate::events::Event;
use crate::feed::EventBus;
use crate::game::{GameConfig, GameStatus};
use crate::order::{Decision, PrimaryOrder, SecondaryListing};
use crate::trade::Trade;
use crate::types::{
    Cash, GameId, IdempotencyKey, OrderId, ParticipantId, Price, Role, Timestamp, VentureId,
};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 1024;

pub struct Exchange {
    engine: RwLock<Engine>,
    admission_locks: DashMap<VentureId, Arc<Mutex<()>>>,
    bus: EventBus,
}

impl Exchange {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: RwLock::new(Engine::new(config)),
            admission_locks: DashMap::new(),
            bus: EventBus::new(FEED_CAPACITY),
        }
    }

    /// Live event feed for one game.
    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<Event> {
        self.bus.subscribe(game_id)
    }

    // --- organizer surface ---

    pub fn create_game(&self, config: GameConfig) -> Result<GameId, EngineError> {
        self.mutate(None, |engine| engine.create_game(config))
    }

    pub fn set_game_status(
        &self,
        game_id: GameId,
        to: GameStatus,
    ) -> Result<(), EngineError> {
        let result = self.mutate(None, |engine| engine.set_game_status(game_id, to));
        if result.is_ok() {
            tracing::info!(game = game_id.0, status = %to, "game status changed");
        }
        result
    }

    pub fn join_game(
        &self,
        game_id: GameId,
        display_name: impl Into<String>,
        role: Role,
        budget_override: Option<Cash>,
    ) -> Result<ParticipantId, EngineError> {
        let name = display_name.into();
        self.mutate(None, |engine| {
            engine.join_game(game_id, name, role, budget_override)
        })
    }

    pub fn create_venture(
        &self,
        game_id: GameId,
        name: impl Into<String>,
        founder: ParticipantId,
        total_shares: u64,
    ) -> Result<VentureId, EngineError> {
        let name = name.into();
        self.mutate(None, |engine| {
            engine.create_venture(game_id, name, founder, total_shares)
        })
    }

    // --- trading surface ---

    pub fn submit_primary_order(
        &self,
        buyer: ParticipantId,
        venture: VentureId,
        qty: u64,
        price: Price,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderId, EngineError> {
        let result = self.mutate(Some(venture), |engine| {
            engine.submit_primary_order(buyer, venture, qty, price, idempotency_key)
        });
        match &result {
            Ok(order) => tracing::debug!(
                venture = venture.0,
                buyer = buyer.0,
                qty,
                order = order.0,
                "primary order submitted"
            ),
            Err(err) => tracing::debug!(venture = venture.0, %err, "primary order refused"),
        }
        result
    }

    pub fn decide_primary_order(
        &self,
        caller: ParticipantId,
        order_id: OrderId,
        decision: Decision,
    ) -> Result<Option<Trade>, EngineError> {
        let venture = {
            let engine = self.engine.read();
            engine
                .primary_order(order_id)
                .ok_or(EngineError::OrderNotFound(order_id))?
                .venture
        };
        let result = self.mutate(Some(venture), |engine| {
            engine.decide_primary_order(caller, order_id, decision)
        });
        match &result {
            Ok(Some(trade)) => tracing::info!(
                venture = venture.0,
                order = order_id.0,
                trade = trade.id.0,
                qty = trade.qty,
                price = %trade.price_per_share,
                "primary order settled"
            ),
            Ok(None) => tracing::info!(order = order_id.0, "primary order rejected"),
            Err(err) => tracing::debug!(order = order_id.0, %err, "decision refused"),
        }
        result
    }

    pub fn submit_secondary_listing(
        &self,
        seller: ParticipantId,
        venture: VentureId,
        qty: u64,
        price: Price,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderId, EngineError> {
        self.mutate(Some(venture), |engine| {
            engine.submit_secondary_listing(seller, venture, qty, price, idempotency_key)
        })
    }

    pub fn take_secondary_listing(
        &self,
        buyer: ParticipantId,
        order_id: OrderId,
        qty: u64,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<Trade, EngineError> {
        let venture = {
            let engine = self.engine.read();
            engine
                .listing(order_id)
                .ok_or(EngineError::OrderNotFound(order_id))?
                .venture
        };
        self.mutate(Some(venture), |engine| {
            engine.take_secondary_listing(buyer, order_id, qty, idempotency_key)
        })
    }

    pub fn cancel_secondary_listing(
        &self,
        caller: ParticipantId,
        order_id: OrderId,
    ) -> Result<(), EngineError> {
        let venture = {
            let engine = self.engine.read();
            engine
                .listing(order_id)
                .ok_or(EngineError::OrderNotFound(order_id))?
                .venture
        };
        self.mutate(Some(venture), |engine| {
            engine.cancel_secondary_listing(caller, order_id)
        })
    }

    // --- read-only surface ---

    pub fn list_pending_orders(&self, venture: VentureId) -> Vec<PrimaryOrder> {
        let engine = self.engine.read();
        engine
            .list_pending_orders(venture)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn open_listings(&self, venture: VentureId) -> Vec<SecondaryListing> {
        let engine = self.engine.read();
        engine.open_listings(venture).into_iter().cloned().collect()
    }

    pub fn venture_price(&self, venture: VentureId) -> Option<Price> {
        let engine = self.engine.read();
        engine.venture(venture).and_then(|v| v.last_vwap_price)
    }

    pub fn venture_leaderboard(&self, game_id: GameId) -> Result<Vec<VentureRank>, EngineError> {
        self.engine.read().venture_leaderboard(game_id)
    }

    pub fn angel_leaderboard(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        self.engine.read().angel_leaderboard(game_id)
    }

    pub fn vc_leaderboard(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        self.engine.read().vc_leaderboard(game_id)
    }

    pub fn portfolio_data(&self, game_id: GameId) -> Result<Vec<PortfolioRow>, EngineError> {
        self.engine.read().portfolio_data(game_id)
    }

    // --- internals ---

    fn admission_lock(&self, venture: VentureId) -> Arc<Mutex<()>> {
        self.admission_locks
            .entry(venture)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run a mutating operation: venture admission lock first (when the
    /// operation targets one), then a short exclusive store lock, then
    /// publish whatever the operation committed.
    fn mutate<T>(
        &self,
        venture: Option<VentureId>,
        op: impl FnOnce(&mut Engine) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let lock = venture.map(|v| self.admission_lock(v));
        let _serialized = lock.as_ref().map(|l| l.lock());

        let (result, committed) = {
            let mut engine = self.engine.write();
            engine.set_time(Timestamp::now());
            let mark = engine.events_len();
            let result = op(&mut engine);
            let committed: Vec<Event> = engine.events_since(mark).to_vec();
            (result, committed)
        };

        // Notify-after-commit. A failed op may still have committed events
        // (e.g. an auto-rejected stale order); those go out too.
        self.bus.publish(&committed);
        result
    }
}
