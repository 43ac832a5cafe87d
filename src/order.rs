// 5.0: orders. primary orders are founder-gated investment requests; secondary
// listings are peer-to-peer resale offers that rest until taken, cancelled, or
// the market closes. a decided primary order is terminal and immutable.

use crate::types::{GameId, OrderId, ParticipantId, Price, Timestamp, VentureId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryOrderStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for PrimaryOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimaryOrderStatus::Pending => "pending",
            PrimaryOrderStatus::Accepted => "accepted",
            PrimaryOrderStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Founder decision on a pending primary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
}

/// A request to buy unissued shares, awaiting the venture founder's decision.
/// No funds are reserved at submission; everything is re-validated at decision
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryOrder {
    pub id: OrderId,
    pub game_id: GameId,
    pub venture: VentureId,
    pub buyer: ParticipantId,
    pub qty: u64,
    pub price_per_share: Price,
    pub status: PrimaryOrderStatus,
    pub submitted_at: Timestamp,
    pub decided_at: Option<Timestamp>,
}

impl PrimaryOrder {
    pub fn is_pending(&self) -> bool {
        self.status == PrimaryOrderStatus::Pending
    }

    pub(crate) fn mark_decided(&mut self, status: PrimaryOrderStatus, timestamp: Timestamp) {
        debug_assert!(self.is_pending());
        debug_assert!(status != PrimaryOrderStatus::Pending);
        self.status = status;
        self.decided_at = Some(timestamp);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Pending,
    Filled,
    Cancelled,
    Expired,
}

/// A resting offer to sell already-issued shares. Buyers take it fully or
/// partially at the listed price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryListing {
    pub id: OrderId,
    pub game_id: GameId,
    pub venture: VentureId,
    pub seller: ParticipantId,
    pub qty_listed: u64,
    pub qty_remaining: u64,
    pub price_per_share: Price,
    pub status: ListingStatus,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SecondaryListing {
    pub fn is_open(&self) -> bool {
        self.status == ListingStatus::Pending && self.qty_remaining > 0
    }

    /// Consume quantity from the listing. Caller validates qty beforehand.
    pub(crate) fn take(&mut self, qty: u64, timestamp: Timestamp) {
        debug_assert!(self.is_open() && qty <= self.qty_remaining);
        self.qty_remaining -= qty;
        self.updated_at = timestamp;
        if self.qty_remaining == 0 {
            self.status = ListingStatus::Filled;
        }
    }

    pub(crate) fn cancel(&mut self, timestamp: Timestamp) {
        debug_assert!(self.status == ListingStatus::Pending);
        self.status = ListingStatus::Cancelled;
        self.updated_at = timestamp;
    }

    pub(crate) fn expire(&mut self, timestamp: Timestamp) {
        debug_assert!(self.status == ListingStatus::Pending);
        self.status = ListingStatus::Expired;
        self.updated_at = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn listing() -> SecondaryListing {
        SecondaryListing {
            id: OrderId(1),
            game_id: GameId(1),
            venture: VentureId(1),
            seller: ParticipantId(2),
            qty_listed: 100,
            qty_remaining: 100,
            price_per_share: Price::new_unchecked(dec!(15)),
            status: ListingStatus::Pending,
            submitted_at: Timestamp::from_millis(0),
            updated_at: Timestamp::from_millis(0),
        }
    }

    #[test]
    fn partial_take_keeps_listing_open() {
        let mut l = listing();
        l.take(40, Timestamp::from_millis(1));
        assert!(l.is_open());
        assert_eq!(l.qty_remaining, 60);
        assert_eq!(l.status, ListingStatus::Pending);
    }

    #[test]
    fn full_take_fills_listing() {
        let mut l = listing();
        l.take(100, Timestamp::from_millis(1));
        assert!(!l.is_open());
        assert_eq!(l.status, ListingStatus::Filled);
    }

    #[test]
    fn cancelled_listing_is_closed() {
        let mut l = listing();
        l.cancel(Timestamp::from_millis(1));
        assert!(!l.is_open());
        assert_eq!(l.status, ListingStatus::Cancelled);
    }

    #[test]
    fn primary_order_decision_is_terminal() {
        let mut order = PrimaryOrder {
            id: OrderId(1),
            game_id: GameId(1),
            venture: VentureId(1),
            buyer: ParticipantId(3),
            qty: 10,
            price_per_share: Price::new_unchecked(dec!(20)),
            status: PrimaryOrderStatus::Pending,
            submitted_at: Timestamp::from_millis(0),
            decided_at: None,
        };
        assert!(order.is_pending());
        order.mark_decided(PrimaryOrderStatus::Accepted, Timestamp::from_millis(5));
        assert!(!order.is_pending());
        assert_eq!(order.decided_at, Some(Timestamp::from_millis(5)));
    }
}
