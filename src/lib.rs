// venture-core: trading engine for a simulated startup stock market.
// settlement-first architecture: order admission, atomic settlement, and
// price discovery take priority. all core computation is deterministic with
// no external I/O; the service layer adds the concurrent boundary.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: ids, Price, Cash, Role, Timestamp
//   2.x  venture.rs: venture ledger: share supply, last VWAP price
//   3.x  participant.rs: per-game membership, budget, cash invariants
//   4.x  position.rs: holdings and weighted average cost basis
//   5.x  order.rs: primary orders and secondary listings
//   6.x  trade.rs: append-only trade records
//   7.x  pricing.rs: 3-trade VWAP window and rounding policy
//   7.1  breaker.rs: per-venture volatility pause state machine
//   8.x  events.rs: state transition events for audit and the feed
//   9.x  engine/: core engine: admission, settlement, valuation
//   10.x game.rs: game lifecycle, flags, role budget table
//   11.x feed.rs: post-commit broadcast feed (per game)
//   12.x service.rs: thread-safe RPC boundary with per-venture locks

// core trading modules
pub mod breaker;
pub mod engine;
pub mod events;
pub mod game;
pub mod order;
pub mod participant;
pub mod position;
pub mod pricing;
pub mod trade;
pub mod types;
pub mod venture;

// integration modules
pub mod feed;
pub mod service;

// re exports for convenience
pub use breaker::*;
pub use engine::*;
pub use events::*;
pub use game::*;
pub use order::*;
pub use participant::*;
pub use position::*;
pub use pricing::*;
pub use trade::*;
pub use types::*;
pub use venture::*;

pub use feed::EventBus;
pub use service::Exchange;
