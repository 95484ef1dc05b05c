//! Single-writer market workers
//!
//! Book state is only safe to mutate from one logical thread per market,
//! so each market gets a dedicated task that owns its `MarketEngine`
//! outright and consumes commands from a bounded channel. Exclusion is
//! ownership; no lock guards any book. Depth reads answered by the
//! worker observe a consistent snapshot; concurrent callers simply queue
//! behind writes.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use exchange_types::errors::{EngineError, SubmitError};
use exchange_types::ids::{MarketId, OrderId};
use exchange_types::order::{OrderDraft, Side};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

use crate::depth::{BookTop, DepthLevel};
use crate::engine::{DrainReport, MarketEngine};
use crate::events::{self, EngineEvent};
use crate::queue::QueueConfig;

/// Failures crossing the service boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("order rejected: {0}")]
    Rejected(#[from] SubmitError),

    #[error("matching failed: {0}")]
    Engine(#[from] EngineError),

    #[error("market worker unavailable")]
    WorkerUnavailable,
}

/// Buffer sizes for the per-market workers.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Commands in flight per market before submitters are backpressured.
    pub command_buffer: usize,
    /// Events retained for slow subscribers before they lag.
    pub event_buffer: usize,
    /// Submission queue bounds handed to each market engine.
    pub queue: QueueConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_buffer: 1_024,
            event_buffer: 4_096,
            queue: QueueConfig::default(),
        }
    }
}

enum MarketCommand {
    Submit {
        draft: OrderDraft,
        reply: oneshot::Sender<Result<OrderId, SubmitError>>,
    },
    Drain {
        reply: oneshot::Sender<Result<DrainReport, EngineError>>,
    },
    Depth {
        side: Side,
        reply: oneshot::Sender<Vec<DepthLevel>>,
    },
    BestPrices {
        reply: oneshot::Sender<BookTop>,
    },
}

/// Routes commands to per-market single-writer workers, spawning each
/// worker on the market's first submission.
pub struct ExchangeService {
    workers: DashMap<MarketId, mpsc::Sender<MarketCommand>>,
    events: broadcast::Sender<EngineEvent>,
    config: ServiceConfig,
}

impl ExchangeService {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer);
        Self {
            workers: DashMap::new(),
            events,
            config,
        }
    }

    /// Subscribe to the engine event stream across all markets.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Accept a draft into its market's `WAITING` queue.
    pub async fn submit(&self, draft: OrderDraft) -> Result<OrderId, ServiceError> {
        let sender = self.sender_for(&draft.market);
        let (reply, response) = oneshot::channel();
        sender
            .send(MarketCommand::Submit { draft, reply })
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        let accepted = response
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        Ok(accepted?)
    }

    /// Run one queue drain on the market's worker.
    pub async fn drain(&self, market: &MarketId) -> Result<DrainReport, ServiceError> {
        let sender = self.sender_for(market);
        let (reply, response) = oneshot::channel();
        sender
            .send(MarketCommand::Drain { reply })
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        let report = response
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        Ok(report?)
    }

    /// Level-2 depth for one side, as the worker sees it.
    pub async fn depth(&self, market: &MarketId, side: Side) -> Result<Vec<DepthLevel>, ServiceError> {
        let sender = self.sender_for(market);
        let (reply, response) = oneshot::channel();
        sender
            .send(MarketCommand::Depth { side, reply })
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        response.await.map_err(|_| ServiceError::WorkerUnavailable)
    }

    /// Best bid and ask, as the worker sees them.
    pub async fn best_prices(&self, market: &MarketId) -> Result<BookTop, ServiceError> {
        let sender = self.sender_for(market);
        let (reply, response) = oneshot::channel();
        sender
            .send(MarketCommand::BestPrices { reply })
            .await
            .map_err(|_| ServiceError::WorkerUnavailable)?;
        response.await.map_err(|_| ServiceError::WorkerUnavailable)
    }

    fn sender_for(&self, market: &MarketId) -> mpsc::Sender<MarketCommand> {
        match self.workers.entry(market.clone()) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                let (sender, receiver) = mpsc::channel(self.config.command_buffer);
                let engine =
                    MarketEngine::with_config(market.clone(), self.config.queue.clone());
                tokio::spawn(market_worker(engine, receiver, self.events.clone()));
                vacant.insert(sender.clone());
                sender
            }
        }
    }
}

impl Default for ExchangeService {
    fn default() -> Self {
        Self::new()
    }
}

/// The single writer for one market. Owns the engine until every command
/// sender is dropped.
async fn market_worker(
    mut engine: MarketEngine,
    mut commands: mpsc::Receiver<MarketCommand>,
    events: broadcast::Sender<EngineEvent>,
) {
    info!(market = %engine.market(), "market worker started");
    while let Some(command) = commands.recv().await {
        match command {
            MarketCommand::Submit { draft, reply } => {
                let _ = reply.send(engine.submit(draft));
            }
            MarketCommand::Drain { reply } => {
                let executed_at = Utc::now().timestamp_nanos_opt().unwrap_or_default();
                let result = engine.drain(executed_at);
                match &result {
                    Ok(report) => {
                        for execution in &report.executions {
                            for event in events::events_for(execution) {
                                // A send only fails with no subscribers.
                                let _ = events.send(event);
                            }
                        }
                    }
                    Err(error) => {
                        warn!(market = %engine.market(), %error, "drain failed");
                    }
                }
                let _ = reply.send(result);
            }
            MarketCommand::Depth { side, reply } => {
                let _ = reply.send(engine.depth(side));
            }
            MarketCommand::BestPrices { reply } => {
                let _ = reply.send(engine.top());
            }
        }
    }
    info!(market = %engine.market(), "market worker stopped");
}
