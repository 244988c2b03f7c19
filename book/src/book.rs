// Price-time priority order book
//
// Two price-ordered maps (bids descending, asks ascending), each value a
// pool index into the level arena; a global order-id index for O(log P)
// cancellation; pooled allocation for both orders and levels so the hot
// path never touches the heap after construction.

use std::collections::{BTreeMap, HashMap};

use common::mem_pool::MemPool;
use common::logging::{LogLevel, Logger};
use common::log_debug;
use common::{OrderId, Price, Priority, Qty, Side};

use crate::config::BookConfig;
use crate::error::{BookError, PoolKind};
use crate::level::{self, PriceLevel};
use crate::order::Order;
use crate::snapshot::Snapshot;
use crate::trade::Trade;

/// Capacity of the order pool. Orders beyond this many resting at once
/// exhaust the pool and surface `BookError::AllocationFailure`.
pub const ORDER_POOL_CAPACITY: usize = 65_536;

/// Capacity of the price-level pool.
pub const LEVEL_POOL_CAPACITY: usize = 8_192;

/// Non-owning lookup entry: where in the book a resting order lives.
pub(crate) struct OrderLocation {
    pub(crate) side: Side,
    pub(crate) price: Price,
    pub(crate) pool_idx: usize,
}

/// A single-symbol limit order book.
pub struct Book {
    pub(crate) bids: BTreeMap<Price, usize>,
    pub(crate) asks: BTreeMap<Price, usize>,
    pub(crate) index: HashMap<OrderId, OrderLocation>,
    pub(crate) orders: Box<MemPool<Order, ORDER_POOL_CAPACITY>>,
    pub(crate) levels: Box<MemPool<PriceLevel, LEVEL_POOL_CAPACITY>>,
    next_id: OrderId,
    pub(crate) next_priority: Priority,
    pub(crate) trade_sink: Box<dyn FnMut(&Trade)>,
    logger: Option<Logger>,
    config: BookConfig,
}

impl Book {
    /// Creates an empty book with default configuration and no logger.
    pub fn new() -> Self {
        Self::with_config(BookConfig::default())
    }

    pub fn with_config(config: BookConfig) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            orders: MemPool::new_boxed(),
            levels: MemPool::new_boxed(),
            next_id: 1,
            next_priority: 1,
            trade_sink: Box::new(|_trade: &Trade| {}),
            logger: None,
            config,
        }
    }

    /// Attaches a `Logger` for pool-exhaustion, level churn, and trade
    /// logging. The book owns no logger by default, since one is a
    /// background thread a library constructor should not spin up
    /// silently.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Installs the trade sink. Invoked synchronously during matching;
    /// must not re-enter the book.
    pub fn set_trade_sink<F: FnMut(&Trade) + 'static>(&mut self, sink: F) {
        self.trade_sink = Box::new(sink);
    }

    /// Submits a limit order. Matches against the opposite side first,
    /// then rests any residual quantity at `price`.
    pub fn submit_limit(&mut self, side: Side, price: Price, qty: Qty) -> Result<OrderId, BookError> {
        if qty == 0 {
            return Err(BookError::InvalidQuantity);
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut remaining = qty;
        self.run_match(side, price, id, &mut remaining);

        if remaining > 0 {
            self.rest(id, side, price, remaining)?;
        }

        Ok(id)
    }

    /// Submits a market order. Never rests; returns the filled quantity.
    pub fn submit_market(&mut self, side: Side, qty: Qty) -> Result<Qty, BookError> {
        if qty == 0 {
            return Err(BookError::InvalidQuantity);
        }

        let taker_price = match side {
            Side::Buy => Price::MAX,
            Side::Sell => 0,
        };

        let mut remaining = qty;
        self.run_match(side, taker_price, 0, &mut remaining);

        Ok(qty - remaining)
    }

    /// Cancels a resting order. No-op if `id` is unknown.
    pub fn cancel(&mut self, id: OrderId) {
        let Some(loc) = self.index.remove(&id) else {
            return;
        };

        let levels_map = self.side_levels_mut(loc.side);
        let level_idx = *levels_map
            .get(&loc.price)
            .expect("cancel: indexed order must have a live level");

        let residual = self
            .orders
            .get_by_index(loc.pool_idx)
            .expect("cancel: indexed order must be allocated")
            .qty;

        {
            let level = self
                .levels
                .get_by_index(level_idx)
                .expect("cancel: level must be allocated");
            level.sub_total_qty(residual);
            level::unlink(level, &self.orders, loc.pool_idx);
        }

        // SAFETY: loc.pool_idx was removed from `index` above, so this is
        // the single point that ever frees this slot.
        unsafe { self.orders.deallocate_by_index(loc.pool_idx) };

        let level_is_empty = self
            .levels
            .get_by_index(level_idx)
            .expect("cancel: level must be allocated")
            .is_empty();

        if level_is_empty {
            self.side_levels_mut(loc.side).remove(&loc.price);
            // SAFETY: just removed from the side-map, no other reference survives.
            unsafe { self.levels.deallocate_by_index(level_idx) };
            self.log_level_removed(loc.price);
        }
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Whether a level exists at `price` on `side`.
    pub fn has_level(&self, side: Side, price: Price) -> bool {
        self.side_levels(side).contains_key(&price)
    }

    /// `total_qty` at `(side, price)`, or 0 if no such level exists.
    pub fn volume_at(&self, side: Side, price: Price) -> Qty {
        self.side_levels(side)
            .get(&price)
            .and_then(|&idx| self.levels.get_by_index(idx))
            .map(|level| level.total_qty())
            .unwrap_or(0)
    }

    /// Top `depth` levels of each side: bids descending, asks ascending.
    pub fn snapshot(&self, depth: usize) -> Snapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(&price, &idx)| (price, self.level_total_qty(idx)))
            .collect();

        let asks = self
            .asks
            .iter()
            .take(depth)
            .map(|(&price, &idx)| (price, self.level_total_qty(idx)))
            .collect();

        Snapshot { bids, asks }
    }

    /// Snapshot using the configured default depth.
    pub fn snapshot_default(&self) -> Snapshot {
        self.snapshot(self.config.default_snapshot_depth)
    }

    fn level_total_qty(&self, idx: usize) -> Qty {
        self.levels
            .get_by_index(idx)
            .expect("snapshot: level must be allocated")
            .total_qty()
    }

    fn side_levels(&self, side: Side) -> &BTreeMap<Price, usize> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, usize> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rests `qty` of order `id` at `price`, allocating a level if needed.
    fn rest(&mut self, id: OrderId, side: Side, price: Price, qty: Qty) -> Result<(), BookError> {
        let order_ptr = self.orders.allocate().ok_or_else(|| {
            self.log_allocation_failure(PoolKind::Order);
            BookError::AllocationFailure(PoolKind::Order)
        })?;
        let order_idx = order_ptr.index();
        let priority = self.next_priority;
        self.next_priority += 1;
        *self.orders.get_mut(&order_ptr) = Order::new(id, side, price, qty, priority);

        let existing = self.side_levels(side).get(&price).copied();
        let level_idx = match existing {
            Some(idx) => idx,
            None => {
                let level_ptr = match self.levels.allocate() {
                    Some(ptr) => ptr,
                    None => {
                        self.log_allocation_failure(PoolKind::Level);
                        // The order slot above already succeeded; undo it so
                        // this failure leaves no trace rather than leaking it.
                        // SAFETY: order_idx was just allocated and is not yet
                        // reachable from `index` or any level, so nothing
                        // else references it.
                        unsafe { self.orders.deallocate_by_index(order_idx) };
                        return Err(BookError::AllocationFailure(PoolKind::Level));
                    }
                };
                let level_idx = level_ptr.index();
                *self.levels.get_mut(&level_ptr) = PriceLevel::new(price);
                self.side_levels_mut(side).insert(price, level_idx);
                self.log_level_created(price);
                level_idx
            }
        };

        let level = self
            .levels
            .get_by_index(level_idx)
            .expect("rest: level must be allocated");
        level::append(level, &self.orders, order_idx);

        self.index.insert(
            id,
            OrderLocation {
                side,
                price,
                pool_idx: order_idx,
            },
        );

        Ok(())
    }

    pub(crate) fn log_allocation_failure(&self, kind: PoolKind) {
        if let Some(logger) = &self.logger {
            match kind {
                PoolKind::Order => logger.log(LogLevel::Error, "order pool exhausted"),
                PoolKind::Level => logger.log(LogLevel::Error, "level pool exhausted"),
            }
        }
    }

    pub(crate) fn log_level_created(&self, price: Price) {
        if let Some(logger) = &self.logger {
            log_debug!(logger, "level created", price);
        }
    }

    pub(crate) fn log_level_removed(&self, price: Price) {
        if let Some(logger) = &self.logger {
            log_debug!(logger, "level removed", price);
        }
    }

    pub(crate) fn log_trade(&self, trade: &Trade) {
        if let Some(logger) = &self.logger {
            log_debug!(logger, "trade qty", trade.qty);
        }
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}
