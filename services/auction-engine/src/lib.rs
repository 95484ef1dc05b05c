//! Continuous double-auction matching engine
//!
//! Accepts orders per market, rests the unfilled ones in a price-time
//! priority book, and crosses incoming orders against the opposite side
//! to produce an append-only sequence of trades.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price, then earliest
//!   submission; partial fills keep their original priority)
//! - Execution price is always the resting (maker) order's price
//! - Deterministic: replaying a submission script yields the identical
//!   trade sequence
//! - `filled ≤ size` after every operation; quantity is conserved
//!   between takers, makers, and the trades that join them
//! - One logical writer per market; books of different markets are
//!   independent

pub mod book;
pub mod depth;
pub mod engine;
pub mod events;
pub mod matching;
pub mod queue;
pub mod service;

pub use depth::{BookTop, DepthLevel};
pub use engine::{DrainReport, Exchange, Execution, MarketEngine};
pub use events::EngineEvent;
pub use queue::QueueConfig;
pub use service::{ExchangeService, ServiceConfig, ServiceError};
