//! Matching & settlement: the single atomic operation of the engine.
//!
//! `settle` validates everything up front and only then mutates, so a failure
//! leaves no partial state behind and a success applies cash, shares, the
//! trade record, the VWAP, and the breaker check as one unit. Replaying a
//! settlement with the same idempotency key returns the original trade.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{
    BreakerTrippedEvent, EventPayload, PriceUpdatedEvent, TradeSettledEvent,
};
use crate::position::Position;
use crate::trade::{MarketType, Trade};
use crate::types::{IdempotencyKey, ParticipantId, Price, VentureId};

impl Engine {
    /// Exchange `qty` shares of `venture_id` at `price`. `seller` absent means
    /// primary issuance: supply is drawn down and proceeds go to the venture's
    /// founder. `seller` present means a secondary transfer between positions.
    pub fn settle(
        &mut self,
        venture_id: VentureId,
        qty: u64,
        price: Price,
        buyer: ParticipantId,
        seller: Option<ParticipantId>,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<Trade, EngineError> {
        if let Some(key) = &idempotency_key {
            if let Some(trade_id) = self.settle_keys.get(key) {
                if let Some(index) = self.trade_index.get(trade_id) {
                    return Ok(self.trades[*index].clone());
                }
            }
        }

        if qty == 0 {
            return Err(EngineError::InvalidQuantity { qty, available: 0 });
        }

        // --- validate: nothing below this block may fail ---

        let venture = self
            .ventures
            .get(&venture_id)
            .ok_or(EngineError::VentureNotFound(venture_id))?;
        let game_id = venture.game_id;
        let founder = venture.founder;
        let remaining = venture.primary_shares_remaining;

        let cost = price.notional(qty);
        let buyer_record = self
            .participants
            .get(&buyer)
            .ok_or(EngineError::ParticipantNotFound(buyer))?;
        if !buyer_record.can_afford(cost) {
            return Err(EngineError::InsufficientFunds {
                required: cost,
                available: buyer_record.current_cash,
            });
        }

        match seller {
            Some(seller_id) => {
                if !self.participants.contains_key(&seller_id) {
                    return Err(EngineError::ParticipantNotFound(seller_id));
                }
                let held = self
                    .positions
                    .get(&(seller_id, venture_id))
                    .map(|p| p.qty_total)
                    .unwrap_or(0);
                if held < qty {
                    return Err(EngineError::InsufficientShares {
                        requested: qty,
                        held,
                    });
                }
            }
            None => {
                if remaining < qty {
                    return Err(EngineError::InsufficientSupply {
                        requested: qty,
                        remaining,
                    });
                }
            }
        }

        // --- commit: infallible from here ---

        let now = self.current_time;

        if let Some(b) = self.participants.get_mut(&buyer) {
            // Checked above; debit cannot fail.
            let _ = b.debit(cost);
        }

        let market_type = match seller {
            Some(seller_id) => {
                if let Some(s) = self.participants.get_mut(&seller_id) {
                    s.credit(cost);
                }
                if let Some(pos) = self.positions.get_mut(&(seller_id, venture_id)) {
                    let _ = pos.apply_sell(qty, now);
                }
                MarketType::Secondary
            }
            None => {
                if let Some(v) = self.ventures.get_mut(&venture_id) {
                    let _ = v.take_primary(qty);
                }
                if let Some(f) = self.participants.get_mut(&founder) {
                    f.credit(cost);
                }
                MarketType::Primary
            }
        };

        self.positions
            .entry((buyer, venture_id))
            .or_insert_with(|| Position::new(buyer, venture_id, now))
            .apply_buy(qty, price, now);

        let trade_id = self.next_trade_id();
        let trade = Trade {
            id: trade_id,
            game_id,
            venture: venture_id,
            qty,
            price_per_share: price,
            buyer,
            seller,
            market_type,
            executed_at: now,
        };
        self.trade_index.insert(trade_id, self.trades.len());
        self.trades.push(trade.clone());
        if let Some(key) = idempotency_key {
            self.settle_keys.insert(key, trade_id);
        }

        self.emit_event(EventPayload::TradeSettled(TradeSettledEvent {
            trade: trade.clone(),
        }));

        self.recompute_price(venture_id, qty, price);

        Ok(trade)
    }

    // Price discovery and the breaker check ride on the back of every
    // settlement; nothing else may touch last_vwap_price.
    fn recompute_price(&mut self, venture_id: VentureId, qty: u64, price: Price) {
        let new_price = self
            .vwap_windows
            .entry(venture_id)
            .or_default()
            .record(qty, price);

        let (game_id, previous) = match self.ventures.get_mut(&venture_id) {
            Some(venture) => {
                let previous = venture.last_vwap_price;
                venture.last_vwap_price = Some(new_price);
                (venture.game_id, previous)
            }
            None => return,
        };

        self.emit_event(EventPayload::PriceUpdated(PriceUpdatedEvent {
            game_id,
            venture: venture_id,
            previous,
            new: new_price,
        }));

        // Breaker only evaluates real moves: game opted in and a previous
        // price exists.
        let params = match self.games.get(&game_id) {
            Some(game) if game.config.circuit_breaker => crate::breaker::BreakerParams {
                percent: game.config.circuit_breaker_percent,
                duration_secs: game.config.circuit_breaker_duration_secs,
            },
            _ => return,
        };
        let previous = match previous {
            Some(p) => p,
            None => return,
        };

        let now = self.current_time;
        let trip = self
            .breakers
            .entry(venture_id)
            .or_default()
            .record_swing(previous.value(), new_price.value(), &params, now);
        if let Some(trip) = trip {
            self.emit_event(EventPayload::BreakerTripped(BreakerTrippedEvent {
                game_id,
                venture: venture_id,
                swing_percent: trip.swing_percent,
                paused_until: trip.paused_until,
            }));
        }
    }
}
