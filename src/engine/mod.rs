// 9.0: core trading engine. coordinates order admission, settlement, price
// discovery, breaker checks, and valuation projections.
// deterministic and event-driven with no external I/O.

mod admission;
mod config;
mod core;
mod results;
mod settlement;
mod valuation;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{EngineError, MarketClosedReason};
pub use valuation::{PortfolioRow, VentureRank};
