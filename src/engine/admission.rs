//! Order admission: validation and recording of primary orders and secondary
//! listings, and the founder decision path.
//!
//! Funds are never reserved at submission. Every check is re-run inside
//! settlement, so an order that was valid when submitted can still come back
//! `StaleOrder` at decision time. That is the expected shape of the race, not
//! an error in the engine.

use super::core::Engine;
use super::results::{EngineError, MarketClosedReason};
use crate::events::{
    EventPayload, ListingCancelledEvent, ListingPostedEvent, OrderDecidedEvent,
    OrderSubmittedEvent,
};
use crate::events::BreakerClearedEvent;
use crate::order::{
    Decision, ListingStatus, PrimaryOrder, PrimaryOrderStatus, SecondaryListing,
};
use crate::trade::Trade;
use crate::types::{GameId, IdempotencyKey, OrderId, ParticipantId, Price, VentureId};

impl Engine {
    /// Gate shared by every mutating order operation: the game must be open and
    /// the venture must not be paused by its circuit breaker. An expired pause
    /// is cleared here, which is what makes the breaker auto-resume on the
    /// engine clock.
    fn admission_gate(&mut self, venture_id: VentureId) -> Result<GameId, EngineError> {
        let venture = self
            .ventures
            .get(&venture_id)
            .ok_or(EngineError::VentureNotFound(venture_id))?;
        let game_id = venture.game_id;
        let game = self
            .games
            .get(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        if !game.is_open() {
            return Err(EngineError::MarketClosed {
                venture: venture_id,
                reason: MarketClosedReason::GameNotOpen {
                    status: game.status,
                },
            });
        }

        let now = self.current_time;
        let cleared = self
            .breakers
            .get_mut(&venture_id)
            .map(|b| b.clear_if_expired(now))
            .unwrap_or(false);
        if cleared {
            self.emit_event(EventPayload::BreakerCleared(BreakerClearedEvent {
                game_id,
                venture: venture_id,
            }));
        }

        if let Some(breaker) = self.breakers.get(&venture_id) {
            if breaker.is_paused(now) {
                // paused_until is Some whenever is_paused holds.
                let until = breaker.paused_until().unwrap_or(now);
                return Err(EngineError::MarketClosed {
                    venture: venture_id,
                    reason: MarketClosedReason::BreakerPaused { until },
                });
            }
        }
        Ok(game_id)
    }

    fn check_price_cap(&self, game_id: GameId, price: Price) -> Result<(), EngineError> {
        if let Some(game) = self.games.get(&game_id) {
            if let Some(max) = game.config.max_price_per_share {
                if price > max {
                    return Err(EngineError::PriceOutOfBounds { price, max });
                }
            }
        }
        Ok(())
    }

    /// Record an investment request against unissued shares. Returns the order
    /// id; on an idempotency-key replay the original id comes back and nothing
    /// is recorded twice.
    pub fn submit_primary_order(
        &mut self,
        buyer: ParticipantId,
        venture_id: VentureId,
        qty: u64,
        price: Price,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderId, EngineError> {
        if let Some(key) = &idempotency_key {
            if let Some(existing) = self.submit_keys.get(key) {
                return Ok(*existing);
            }
        }

        let game_id = self.admission_gate(venture_id)?;
        self.check_price_cap(game_id, price)?;

        let venture = self
            .ventures
            .get(&venture_id)
            .ok_or(EngineError::VentureNotFound(venture_id))?;
        if qty == 0 || qty > venture.primary_shares_remaining {
            return Err(EngineError::InvalidQuantity {
                qty,
                available: venture.primary_shares_remaining,
            });
        }

        let buyer_record = self
            .participants
            .get(&buyer)
            .ok_or(EngineError::ParticipantNotFound(buyer))?;
        if buyer_record.game_id != game_id {
            return Err(EngineError::NotAuthorized {
                participant: buyer,
                action: "trade in this game",
            });
        }
        let cost = price.notional(qty);
        if !buyer_record.can_afford(cost) {
            return Err(EngineError::InsufficientFunds {
                required: cost,
                available: buyer_record.current_cash,
            });
        }

        let order_id = self.next_order_id();
        let order = PrimaryOrder {
            id: order_id,
            game_id,
            venture: venture_id,
            buyer,
            qty,
            price_per_share: price,
            status: PrimaryOrderStatus::Pending,
            submitted_at: self.current_time,
            decided_at: None,
        };
        self.primary_orders.insert(order_id, order);
        if let Some(key) = idempotency_key {
            self.submit_keys.insert(key, order_id);
        }

        self.emit_event(EventPayload::OrderSubmitted(OrderSubmittedEvent {
            game_id,
            venture: venture_id,
            order_id,
            buyer,
            qty,
            price,
        }));
        Ok(order_id)
    }

    /// Founder decision on a pending primary order. Accept re-validates funds
    /// and supply against current state; when that re-validation fails the
    /// order is auto-rejected and the caller gets `StaleOrder`.
    pub fn decide_primary_order(
        &mut self,
        caller: ParticipantId,
        order_id: OrderId,
        decision: Decision,
    ) -> Result<Option<Trade>, EngineError> {
        let order = self
            .primary_orders
            .get(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if !order.is_pending() {
            return Err(EngineError::OrderAlreadyDecided {
                order: order_id,
                status: order.status,
            });
        }
        let (game_id, venture_id, buyer, qty, price) = (
            order.game_id,
            order.venture,
            order.buyer,
            order.qty,
            order.price_per_share,
        );

        let venture = self
            .ventures
            .get(&venture_id)
            .ok_or(EngineError::VentureNotFound(venture_id))?;
        if venture.founder != caller {
            return Err(EngineError::NotAuthorized {
                participant: caller,
                action: "decide orders for this venture",
            });
        }

        match decision {
            Decision::Reject => {
                self.mark_order(order_id, PrimaryOrderStatus::Rejected);
                self.emit_event(EventPayload::OrderDecided(OrderDecidedEvent {
                    game_id,
                    venture: venture_id,
                    order_id,
                    decided_by: caller,
                    decision,
                    outcome: PrimaryOrderStatus::Rejected,
                    stale: false,
                }));
                Ok(None)
            }
            Decision::Accept => {
                // Accepting settles a trade, so it passes the same gate as any
                // other trading operation: a paused breaker blocks it (and an
                // expired pause is cleared here).
                self.admission_gate(venture_id)?;
                match self.settle(venture_id, qty, price, buyer, None, None) {
                    Ok(trade) => {
                        self.mark_order(order_id, PrimaryOrderStatus::Accepted);
                        self.emit_event(EventPayload::OrderDecided(OrderDecidedEvent {
                            game_id,
                            venture: venture_id,
                            order_id,
                            decided_by: caller,
                            decision,
                            outcome: PrimaryOrderStatus::Accepted,
                            stale: false,
                        }));
                        Ok(Some(trade))
                    }
                    Err(cause) if cause.is_stale_cause() => {
                        // Supply or funds moved since submission. Auto-reject
                        // instead of leaving the order dangling.
                        self.mark_order(order_id, PrimaryOrderStatus::Rejected);
                        self.emit_event(EventPayload::OrderDecided(OrderDecidedEvent {
                            game_id,
                            venture: venture_id,
                            order_id,
                            decided_by: caller,
                            decision,
                            outcome: PrimaryOrderStatus::Rejected,
                            stale: true,
                        }));
                        Err(EngineError::StaleOrder {
                            order: order_id,
                            cause: Box::new(cause),
                        })
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    fn mark_order(&mut self, order_id: OrderId, status: PrimaryOrderStatus) {
        let now = self.current_time;
        if let Some(order) = self.primary_orders.get_mut(&order_id) {
            order.mark_decided(status, now);
        }
    }

    /// Pending primary orders for a venture, oldest first.
    pub fn list_pending_orders(&self, venture_id: VentureId) -> Vec<&PrimaryOrder> {
        let mut pending: Vec<&PrimaryOrder> = self
            .primary_orders
            .values()
            .filter(|o| o.venture == venture_id && o.is_pending())
            .collect();
        pending.sort_by_key(|o| (o.submitted_at, o.id));
        pending
    }

    /// Post a resale offer. Shares are not escrowed; the seller's position is
    /// re-validated when the listing is taken, mirroring the unreserved-funds
    /// model on the buy side.
    pub fn submit_secondary_listing(
        &mut self,
        seller: ParticipantId,
        venture_id: VentureId,
        qty: u64,
        price: Price,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderId, EngineError> {
        if let Some(key) = &idempotency_key {
            if let Some(existing) = self.submit_keys.get(key) {
                return Ok(*existing);
            }
        }

        let game_id = self.require_secondary(venture_id)?;
        self.check_price_cap(game_id, price)?;

        let seller_record = self
            .participants
            .get(&seller)
            .ok_or(EngineError::ParticipantNotFound(seller))?;
        if seller_record.game_id != game_id {
            return Err(EngineError::NotAuthorized {
                participant: seller,
                action: "trade in this game",
            });
        }
        let held = self
            .positions
            .get(&(seller, venture_id))
            .map(|p| p.qty_total)
            .unwrap_or(0);
        if qty == 0 || qty > held {
            return Err(EngineError::InvalidQuantity {
                qty,
                available: held,
            });
        }

        let order_id = self.next_order_id();
        let listing = SecondaryListing {
            id: order_id,
            game_id,
            venture: venture_id,
            seller,
            qty_listed: qty,
            qty_remaining: qty,
            price_per_share: price,
            status: ListingStatus::Pending,
            submitted_at: self.current_time,
            updated_at: self.current_time,
        };
        self.listings.insert(order_id, listing);
        if let Some(key) = idempotency_key {
            self.submit_keys.insert(key, order_id);
        }

        self.emit_event(EventPayload::ListingPosted(ListingPostedEvent {
            game_id,
            venture: venture_id,
            order_id,
            seller,
            qty,
            price,
        }));
        Ok(order_id)
    }

    /// Buy from a resting listing, fully or partially, at the listed price.
    pub fn take_secondary_listing(
        &mut self,
        buyer: ParticipantId,
        order_id: OrderId,
        qty: u64,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<Trade, EngineError> {
        if let Some(key) = &idempotency_key {
            if let Some(trade_id) = self.settle_keys.get(key) {
                if let Some(index) = self.trade_index.get(trade_id) {
                    return Ok(self.trades[*index].clone());
                }
            }
        }

        let listing = self
            .listings
            .get(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if !listing.is_open() {
            return Err(EngineError::ListingNotOpen {
                order: order_id,
                status: listing.status,
            });
        }
        let (venture_id, seller, price, remaining) = (
            listing.venture,
            listing.seller,
            listing.price_per_share,
            listing.qty_remaining,
        );

        let game_id = self.require_secondary(venture_id)?;

        let buyer_record = self
            .participants
            .get(&buyer)
            .ok_or(EngineError::ParticipantNotFound(buyer))?;
        if buyer_record.game_id != game_id {
            return Err(EngineError::NotAuthorized {
                participant: buyer,
                action: "trade in this game",
            });
        }
        if buyer == seller {
            return Err(EngineError::NotAuthorized {
                participant: buyer,
                action: "take their own listing",
            });
        }
        if qty == 0 || qty > remaining {
            return Err(EngineError::InvalidQuantity {
                qty,
                available: remaining,
            });
        }

        let trade = self.settle(venture_id, qty, price, buyer, Some(seller), idempotency_key)?;

        let now = self.current_time;
        if let Some(listing) = self.listings.get_mut(&order_id) {
            listing.take(qty, now);
        }
        Ok(trade)
    }

    /// Seller-side withdrawal of a resting listing.
    pub fn cancel_secondary_listing(
        &mut self,
        caller: ParticipantId,
        order_id: OrderId,
    ) -> Result<(), EngineError> {
        let listing = self
            .listings
            .get(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if listing.seller != caller {
            return Err(EngineError::NotAuthorized {
                participant: caller,
                action: "cancel this listing",
            });
        }
        if listing.status != ListingStatus::Pending {
            return Err(EngineError::ListingNotOpen {
                order: order_id,
                status: listing.status,
            });
        }
        let (game_id, venture_id, seller, qty_unsold) = (
            listing.game_id,
            listing.venture,
            listing.seller,
            listing.qty_remaining,
        );

        let now = self.current_time;
        if let Some(listing) = self.listings.get_mut(&order_id) {
            listing.cancel(now);
        }
        self.emit_event(EventPayload::ListingCancelled(ListingCancelledEvent {
            game_id,
            venture: venture_id,
            order_id,
            seller,
            qty_unsold,
        }));
        Ok(())
    }

    /// Open listings for a venture, oldest first.
    pub fn open_listings(&self, venture_id: VentureId) -> Vec<&SecondaryListing> {
        let mut open: Vec<&SecondaryListing> = self
            .listings
            .values()
            .filter(|l| l.venture == venture_id && l.is_open())
            .collect();
        open.sort_by_key(|l| (l.submitted_at, l.id));
        open
    }

    fn require_secondary(&mut self, venture_id: VentureId) -> Result<GameId, EngineError> {
        let game_id = self.admission_gate(venture_id)?;
        let game = self
            .games
            .get(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        if !game.config.allow_secondary {
            return Err(EngineError::MarketClosed {
                venture: venture_id,
                reason: MarketClosedReason::SecondaryDisabled,
            });
        }
        Ok(game_id)
    }
}
