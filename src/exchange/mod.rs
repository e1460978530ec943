//! Multi-market service layer.
//!
//! `Exchange` routes each request to the [`MatchingEngine`] of its market and
//! drives the outside collaborators once the book lock is released:
//!
//! ```text
//! request -> route by market -> engine (book write lock) -> unlock
//!         -> Settlement::transfer per fill -> BookListener::book_changed
//! ```
//!
//! Settlement failures are logged and counted in the response. They never
//! roll back the book: the match already happened.

pub mod notify;
pub mod settlement;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::ExchangeConfig;
use crate::engine::MatchingEngine;
use crate::error::{BookError, ExchangeError};
use crate::orderbook::BookSnapshot;
use crate::types::{IdGenerator, Market, MatchEvent, OrderId, OrderType, Side, UserId};

pub use notify::{BookListener, ChannelNotifier, NoopListener};
pub use settlement::{LoggingSettlement, Settlement};

/// Inbound order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderRequest {
    pub market: Market,
    pub user_id: UserId,
    pub side: Side,
    pub order_type: OrderType,
    pub size: u64,
    /// Required for limit orders, ignored for market orders
    pub price: Option<u64>,
}

impl PlaceOrderRequest {
    pub fn limit(market: impl Into<Market>, user_id: UserId, side: Side, price: u64, size: u64) -> Self {
        Self {
            market: market.into(),
            user_id,
            side,
            order_type: OrderType::Limit,
            size,
            price: Some(price),
        }
    }

    pub fn market(market: impl Into<Market>, user_id: UserId, side: Side, size: u64) -> Self {
        Self {
            market: market.into(),
            user_id,
            side,
            order_type: OrderType::Market,
            size,
            price: None,
        }
    }
}

/// Outcome of a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,

    /// Fills produced (always empty for limit orders)
    pub matches: Vec<MatchEvent>,

    /// Fills the settlement collaborator rejected
    pub settlement_failures: usize,
}

/// Routes requests across per-market engines.
pub struct Exchange {
    engines: HashMap<Market, Arc<MatchingEngine>>,
    /// Market of every order that may still be resting
    order_markets: RwLock<HashMap<OrderId, Market>>,
    ids: Arc<IdGenerator>,
    settlement: Arc<dyn Settlement>,
    listener: Arc<dyn BookListener>,
}

impl Exchange {
    /// Create an exchange with no markets
    pub fn new(settlement: Arc<dyn Settlement>, listener: Arc<dyn BookListener>) -> Self {
        Self {
            engines: HashMap::new(),
            order_markets: RwLock::new(HashMap::new()),
            ids: Arc::new(IdGenerator::new()),
            settlement,
            listener,
        }
    }

    /// Create an exchange with every market named in `config`
    pub fn from_config(
        config: &ExchangeConfig,
        settlement: Arc<dyn Settlement>,
        listener: Arc<dyn BookListener>,
    ) -> Result<Self, ExchangeError> {
        let mut exchange = Self::new(settlement, listener);
        for market in &config.markets {
            exchange.add_market(market.symbol.clone(), market.order_capacity)?;
        }
        Ok(exchange)
    }

    /// Open a book for `market`
    pub fn add_market(&mut self, market: impl Into<Market>, order_capacity: usize) -> Result<(), ExchangeError> {
        let market = market.into();
        if self.engines.contains_key(&market) {
            return Err(ExchangeError::DuplicateMarket(market));
        }

        let engine = MatchingEngine::with_capacity(market.clone(), order_capacity, Arc::clone(&self.ids));
        info!(%market, order_capacity, "market opened");
        self.engines.insert(market, Arc::new(engine));
        Ok(())
    }

    /// Registered markets, in no particular order
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.engines.keys()
    }

    /// Engine serving `market`
    pub fn engine(&self, market: &Market) -> Result<&Arc<MatchingEngine>, ExchangeError> {
        self.engines
            .get(market)
            .ok_or_else(|| ExchangeError::MarketNotFound(market.clone()))
    }

    /// Place a limit or market order.
    ///
    /// Settlement and the change signal run after the engine call returns,
    /// i.e. with no book lock held.
    pub fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse, ExchangeError> {
        let engine = self.engine(&request.market)?;

        let response = match request.order_type {
            OrderType::Limit => {
                let price = request.price.ok_or(BookError::MissingPrice)?;
                let order_id = engine
                    .place_limit(request.side, price, request.size, request.user_id)
                    .map_err(|err| reject(&request, err))?;
                self.route(engine, order_id, &request.market);

                debug!(market = %request.market, order_id, side = ?request.side, price, size = request.size, "new LIMIT order");
                PlaceOrderResponse {
                    order_id,
                    matches: Vec::new(),
                    settlement_failures: 0,
                }
            }
            OrderType::Market => {
                let fill = engine
                    .place_market(request.side, request.size, request.user_id)
                    .map_err(|err| reject(&request, err))?;
                self.forget_filled(engine, &fill.events);

                debug!(market = %request.market, order_id = fill.order_id, side = ?request.side, size = request.size, fills = fill.events.len(), "new MARKET order");
                let settlement_failures = self.settle(&request.market, &fill.events);
                PlaceOrderResponse {
                    order_id: fill.order_id,
                    matches: fill.events,
                    settlement_failures,
                }
            }
        };

        self.listener.book_changed(&request.market);
        Ok(response)
    }

    /// Cancel a resting order by id alone; returns the market it rested in.
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Market, ExchangeError> {
        let market = self
            .order_markets
            .read()
            .get(&order_id)
            .cloned()
            .ok_or(BookError::OrderNotFound(order_id))?;

        let engine = self.engine(&market)?;
        let result = engine.cancel(order_id);
        // Either cancelled now or already gone from the book
        self.order_markets.write().remove(&order_id);

        let order = result?;
        info!(%market, order_id, remaining = order.remaining(), "order cancelled");
        self.listener.book_changed(&market);
        Ok(market)
    }

    /// Current state of one market's book
    pub fn book(&self, market: &Market) -> Result<BookSnapshot, ExchangeError> {
        Ok(self.engine(market)?.snapshot())
    }

    /// Resting orders the exchange can still route a cancel for
    pub fn routed_orders(&self) -> usize {
        self.order_markets.read().len()
    }

    /// Record where `order_id` rests.
    ///
    /// The book lock is already released here, so a sweep on another thread
    /// may have consumed the order before the entry exists. Re-checking after
    /// the insert means whichever side runs second removes the entry.
    fn route(&self, engine: &MatchingEngine, order_id: OrderId, market: &Market) {
        self.order_markets.write().insert(order_id, market.clone());
        if !engine.contains_order(order_id) {
            self.order_markets.write().remove(&order_id);
        }
    }

    fn settle(&self, market: &Market, events: &[MatchEvent]) -> usize {
        events
            .iter()
            .filter(|event| match self.settlement.transfer(market, event) {
                Ok(()) => false,
                Err(err) => {
                    warn!(
                        %market,
                        resting_order_id = event.resting_order_id,
                        aggressor_order_id = event.aggressor_order_id,
                        %err,
                        "settlement failed"
                    );
                    true
                }
            })
            .count()
    }

    /// Drop routing entries for resting orders the sweep fully consumed.
    fn forget_filled(&self, engine: &MatchingEngine, events: &[MatchEvent]) {
        let gone: Vec<OrderId> = events
            .iter()
            .map(|event| event.resting_order_id)
            .filter(|id| !engine.contains_order(*id))
            .collect();
        if gone.is_empty() {
            return;
        }

        let mut order_markets = self.order_markets.write();
        for id in gone {
            order_markets.remove(&id);
        }
    }
}

fn reject(request: &PlaceOrderRequest, err: BookError) -> BookError {
    warn!(market = %request.market, user_id = request.user_id, side = ?request.side, %err, "order rejected");
    err
}
