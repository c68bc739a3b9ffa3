//! Trading account - concurrent order intake and fill simulation
//!
//! Orders enter through a bounded intake queue and are consumed by a single
//! dispatcher task. Each dequeued order gets its own fill task, capped by a
//! semaphore, which sleeps out the configured settlement delay, resolves the
//! order against the broker, and applies the resulting transaction to the
//! shared portfolio. Every submitted order resolves to exactly one outcome,
//! delivered on the ticket returned at submission; the ledger write always
//! happens before the outcome is sent.
//!
//! Validation runs twice: an advisory check at submission against the current
//! portfolio, and an authoritative one under the portfolio lock when the fill
//! applies. An order that passes the first but loses a race to a concurrent
//! fill resolves to `Rejected` rather than corrupting the ledger.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hashbrown::HashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Notify, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{PapertradeError, Result};
use crate::execution::{ExecutionResult, SimulatedBroker};
use crate::finance::{SharedPortfolio, Transaction};
use crate::order::Order;
use crate::types::{OrderId, Timestamp};

/// Configuration for a trading account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Intake queue capacity; submission waits when the queue is full
    pub queue_capacity: usize,
    /// Maximum number of fill tasks running at once
    pub max_inflight_fills: usize,
    /// Fixed settlement delay applied to every order
    pub fill_delay: Duration,
    /// Upper bound on the random per-order settlement jitter
    pub max_fill_jitter: Duration,
    /// Master seed for per-order randomness
    pub seed: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_inflight_fills: 32,
            fill_delay: Duration::ZERO,
            max_fill_jitter: Duration::from_millis(50),
            seed: rand::random(),
        }
    }
}

/// How a submitted order resolved.
///
/// Exactly one of these is delivered per order, after any ledger write it
/// implies has completed.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// The order filled and this transaction was recorded
    Filled(Transaction),
    /// Settlement landed after the order's expiration
    Expired { at: Timestamp },
    /// Cancellation was requested before the fill committed
    Cancelled { at: Timestamp },
    /// The fill lost a race: valid at submission, invalid at settlement
    Rejected { at: Timestamp, reason: String },
}

impl OrderOutcome {
    /// Whether the order filled
    pub fn is_filled(&self) -> bool {
        matches!(self, OrderOutcome::Filled(_))
    }

    /// The recorded transaction, if the order filled
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            OrderOutcome::Filled(transaction) => Some(transaction),
            _ => None,
        }
    }
}

/// Receipt for a submitted order
#[derive(Debug)]
pub struct OrderTicket {
    order_id: OrderId,
    outcome: oneshot::Receiver<OrderOutcome>,
}

impl OrderTicket {
    /// Identity of the submitted order, usable with `try_cancel`
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Wait for the order's outcome
    pub async fn outcome(self) -> Result<OrderOutcome> {
        self.outcome
            .await
            .map_err(|_| PapertradeError::EngineStopped)
    }
}

/// One-shot cancellation flag shared between `try_cancel` and a fill task
#[derive(Debug, Clone)]
struct CancelToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // notify_one leaves a permit behind if the fill task has not
        // started waiting yet
        self.notify.notify_one();
    }

    fn is_signalled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        if self.is_signalled() {
            return;
        }
        self.notify.notified().await;
    }
}

/// An order in flight between submission and its fill task
struct QueuedOrder {
    order: Order,
    seq: u64,
    token: CancelToken,
    outcome: oneshot::Sender<OrderOutcome>,
}

type CancelTokens = Arc<Mutex<HashMap<OrderId, CancelToken>>>;

/// A simulated trading account: order intake, fill simulation, and the
/// ledger they settle into
pub struct TradingAccount {
    /// Account configuration
    config: TradingConfig,
    /// Ledger shared with the fill tasks
    portfolio: SharedPortfolio,
    /// Pricing for fills
    broker: Arc<SimulatedBroker>,
    /// Producer side of the intake queue
    intake: mpsc::Sender<QueuedOrder>,
    /// Cancellation tokens for orders not yet resolved
    tokens: CancelTokens,
    /// Caps concurrent fill tasks; drained fully at shutdown
    fill_permits: Arc<Semaphore>,
    /// Total permits behind `fill_permits`
    permit_count: u32,
    /// The dispatcher draining the intake queue
    dispatcher: JoinHandle<()>,
    /// Per-order sequence used to derive fill randomness from the seed
    next_seq: AtomicU64,
}

impl TradingAccount {
    /// Start a trading account over a shared portfolio.
    ///
    /// Spawns the dispatcher task, so this must be called from within a
    /// tokio runtime. Zero queue or fill capacities are bumped to one.
    pub fn new(config: TradingConfig, broker: SimulatedBroker, portfolio: SharedPortfolio) -> Self {
        let queue_capacity = config.queue_capacity.max(1);
        let permit_count = config.max_inflight_fills.max(1) as u32;

        let (intake, intake_rx) = mpsc::channel(queue_capacity);
        let tokens: CancelTokens = Arc::new(Mutex::new(HashMap::new()));
        let fill_permits = Arc::new(Semaphore::new(permit_count as usize));
        let broker = Arc::new(broker);

        let dispatcher = tokio::spawn(run_dispatcher(
            intake_rx,
            fill_permits.clone(),
            broker.clone(),
            portfolio.clone(),
            tokens.clone(),
            config.clone(),
        ));
        info!(
            "trading account started: queue capacity {}, max in-flight fills {}",
            queue_capacity, permit_count
        );

        Self {
            config,
            portfolio,
            broker,
            intake,
            tokens,
            fill_permits,
            permit_count,
            dispatcher,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Start an account with default configuration and a frictionless broker
    pub fn default_account(portfolio: SharedPortfolio) -> Self {
        Self::new(
            TradingConfig::default(),
            SimulatedBroker::default_broker(),
            portfolio,
        )
    }

    /// The account's configuration
    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// The ledger this account settles into
    pub fn portfolio(&self) -> &SharedPortfolio {
        &self.portfolio
    }

    /// Submit an order for asynchronous execution.
    ///
    /// The order is validated against the current portfolio at its requested
    /// price plus scheduled commission; an order that cannot fill now is
    /// rejected here rather than queued. Acceptance is advisory: the
    /// authoritative check happens again when the fill applies. Waits when
    /// the intake queue is full.
    pub async fn submit(&self, order: Order) -> Result<OrderTicket> {
        let commission = self.broker.commission(&order);
        let probe = order.to_transaction(order.issued_at(), order.price(), commission);
        if let Err(reason) = self.portfolio.lock().check(&probe) {
            debug!("order {} rejected at submission: {reason}", order.id());
            return Err(PapertradeError::InvalidOrder(reason.to_string()));
        }

        let order_id = order.id();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let token = CancelToken::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        self.tokens.lock().insert(order_id, token.clone());

        let queued = QueuedOrder {
            order,
            seq,
            token,
            outcome: outcome_tx,
        };
        if self.intake.send(queued).await.is_err() {
            self.tokens.lock().remove(&order_id);
            return Err(PapertradeError::EngineStopped);
        }

        debug!("order {order_id} queued");
        Ok(OrderTicket {
            order_id,
            outcome: outcome_rx,
        })
    }

    /// Request cancellation of an order by identity.
    ///
    /// Returns whether a token was found and signalled. Cancellation is
    /// cooperative: it prevents a fill that has not committed yet and does
    /// nothing to one that has.
    pub fn try_cancel(&self, order_id: OrderId) -> bool {
        match self.tokens.lock().remove(&order_id) {
            Some(token) => {
                token.signal();
                info!("cancellation requested for order {order_id}");
                true
            }
            None => {
                debug!("no cancellable order {order_id}");
                false
            }
        }
    }

    /// Stop the account: close intake, drain orders already queued, and wait
    /// for every in-flight fill to settle. All tickets resolve before this
    /// returns.
    pub async fn shutdown(self) -> Result<()> {
        info!("trading account shutting down");
        drop(self.intake);
        self.dispatcher
            .await
            .map_err(|_| PapertradeError::EngineStopped)?;
        // every permit free means every fill task has finished
        self.fill_permits
            .acquire_many(self.permit_count)
            .await
            .map_err(|_| PapertradeError::EngineStopped)?;
        info!("trading account stopped");
        Ok(())
    }
}

/// Drain the intake queue, spawning one capped fill task per order
async fn run_dispatcher(
    mut intake: mpsc::Receiver<QueuedOrder>,
    fill_permits: Arc<Semaphore>,
    broker: Arc<SimulatedBroker>,
    portfolio: SharedPortfolio,
    tokens: CancelTokens,
    config: TradingConfig,
) {
    while let Some(queued) = intake.recv().await {
        let Ok(permit) = fill_permits.clone().acquire_owned().await else {
            // the semaphore is never closed
            break;
        };
        debug!("dispatching order {}", queued.order.id());

        let broker = broker.clone();
        let portfolio = portfolio.clone();
        let tokens = tokens.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let _permit = permit;
            run_fill(queued, &config, &broker, &portfolio, &tokens).await;
        });
    }
    debug!("intake closed, dispatcher exiting");
}

/// Sleep out the settlement delay, resolve the order, and apply the result
async fn run_fill(
    queued: QueuedOrder,
    config: &TradingConfig,
    broker: &SimulatedBroker,
    portfolio: &SharedPortfolio,
    tokens: &Mutex<HashMap<OrderId, CancelToken>>,
) {
    let QueuedOrder {
        order,
        seq,
        token,
        outcome,
    } = queued;
    let order_id = order.id();

    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(seq));
    let jitter_ms = config.max_fill_jitter.as_millis() as u64;
    let delay = config.fill_delay + Duration::from_millis(rng.gen_range(0..=jitter_ms));
    let settles_at = order.issued_at() + chrono::Duration::milliseconds(delay.as_millis() as i64);

    let resolved = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        _ = tokio::time::sleep(delay) => Some(broker.resolve(&order, settles_at, &mut rng)),
    };

    let outcome_value = match resolved {
        None => {
            debug!("order {order_id} cancelled before it filled");
            OrderOutcome::Cancelled { at: Utc::now() }
        }
        Some(ExecutionResult::Expired) => {
            debug!("order {order_id} expired at {settles_at}");
            OrderOutcome::Expired { at: settles_at }
        }
        Some(ExecutionResult::Filled(transaction)) => {
            // authoritative validation and the write, atomically
            let applied = portfolio.lock().add_transaction(transaction.clone());
            match applied {
                Ok(()) => {
                    debug!("order {order_id} filled: {transaction}");
                    OrderOutcome::Filled(transaction)
                }
                Err(reason) => {
                    warn!("order {order_id} rejected at settlement: {reason}");
                    OrderOutcome::Rejected {
                        at: settles_at,
                        reason: reason.to_string(),
                    }
                }
            }
        }
    };

    tokens.lock().remove(&order_id);
    if outcome.send(outcome_value).is_err() {
        debug!("outcome for order {order_id} dropped by caller");
    }
}
