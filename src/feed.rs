//! Post-commit event feed.
//!
//! One broadcast channel per game. The service layer publishes committed events
//! here after releasing its write lock, so delivery can never block or roll
//! back a settlement. Semantics are at-least-once for live subscribers: a slow
//! receiver sees `RecvError::Lagged` rather than stalling the publisher, and
//! consumers are expected to dedupe by trade id.

use crate::events::Event;
use crate::types::{GameId, VentureId};
use dashmap::DashMap;
use tokio::sync::broadcast;

pub struct EventBus {
    capacity: usize,
    channels: DashMap<GameId, broadcast::Sender<Event>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Subscribe to every event of one game.
    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<Event> {
        self.channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish committed events, routed by game. Games nobody listens to are
    /// skipped; send errors (no receivers) are ignored by design of the feed.
    pub fn publish(&self, events: &[Event]) {
        for event in events {
            if let Some(sender) = self.channels.get(&event.game_id()) {
                let _ = sender.send(event.clone());
            }
        }
    }
}

/// Keep only one venture's events from a game subscription.
pub fn venture_filter(venture: VentureId) -> impl Fn(&Event) -> bool {
    move |event| event.payload.venture_id() == Some(venture)
}
