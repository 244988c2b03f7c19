// The match loop: crosses a taker against the resting side, emitting
// trades through the sink as fills occur.
//
// Split out from `book.rs` since this is the one piece of `Book` that
// is really an algorithm rather than a data structure operation.

use common::{OrderId, Price, Qty, Side};

use crate::book::Book;
use crate::level;
use crate::trade::Trade;

impl Book {
    /// Crosses `taker_id` (side `taker_side`, limit `taker_price`) against
    /// the opposite side, decrementing `remaining` in place as fills
    /// occur. Stops when `remaining` reaches zero or the book no longer
    /// crosses.
    pub(crate) fn run_match(&mut self, taker_side: Side, taker_price: Price, taker_id: OrderId, remaining: &mut Qty) {
        loop {
            if *remaining == 0 {
                break;
            }

            let opposite_is_asks = taker_side == Side::Buy;
            let best_price = if opposite_is_asks {
                self.asks.keys().next().copied()
            } else {
                self.bids.keys().next_back().copied()
            };
            let Some(level_price) = best_price else {
                break;
            };

            let crosses = if opposite_is_asks {
                taker_price >= level_price
            } else {
                taker_price <= level_price
            };
            if !crosses {
                break;
            }

            let level_idx = if opposite_is_asks {
                *self.asks.get(&level_price).expect("best ask must exist")
            } else {
                *self.bids.get(&level_price).expect("best bid must exist")
            };

            self.drain_level(level_idx, level_price, taker_id, taker_side, remaining);

            let level_is_empty = self
                .levels
                .get_by_index(level_idx)
                .expect("match: level must be allocated")
                .is_empty();
            if level_is_empty {
                if opposite_is_asks {
                    self.asks.remove(&level_price);
                } else {
                    self.bids.remove(&level_price);
                }
                // SAFETY: just removed from the side-map, no other reference survives.
                unsafe { self.levels.deallocate_by_index(level_idx) };
                self.log_level_removed(level_price);
            }
        }
    }

    /// Walks one level's FIFO queue from the head, filling `remaining`
    /// against each maker until either the level or the taker is
    /// exhausted. Fills always execute at the resting maker's price.
    fn drain_level(
        &mut self,
        level_idx: usize,
        level_price: Price,
        taker_id: OrderId,
        taker_side: Side,
        remaining: &mut Qty,
    ) {
        loop {
            if *remaining == 0 {
                break;
            }

            let head_idx = {
                let level = self
                    .levels
                    .get_by_index(level_idx)
                    .expect("drain_level: level must be allocated");
                match level.head() {
                    Some(h) => h,
                    None => break,
                }
            };

            let (maker_id, fill_qty, maker_exhausted) = {
                let maker = self
                    .orders
                    .get_by_index(head_idx)
                    .expect("drain_level: maker order must be allocated");
                let fill_qty = (*remaining).min(maker.qty);
                maker.qty -= fill_qty;
                (maker.id, fill_qty, maker.qty == 0)
            };

            *remaining -= fill_qty;
            self.levels
                .get_by_index(level_idx)
                .expect("drain_level: level must be allocated")
                .sub_total_qty(fill_qty);

            let trade = Trade {
                maker_id,
                taker_id,
                price: level_price,
                qty: fill_qty,
                aggressor: taker_side,
            };
            (self.trade_sink)(&trade);
            self.log_trade(&trade);

            if maker_exhausted {
                let level = self
                    .levels
                    .get_by_index(level_idx)
                    .expect("drain_level: level must be allocated");
                level::unlink(level, &self.orders, head_idx);
                self.index.remove(&maker_id);
                // SAFETY: maker_id was just removed from `index`, the sole owner.
                unsafe { self.orders.deallocate_by_index(head_idx) };
            } else {
                // maker.qty > 0 implies the taker was fully consumed this fill.
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;

    #[test]
    fn crossing_limit_fills_partially_and_leaves_maker_resting() {
        let mut book = Book::new();
        book.submit_limit(Side::Sell, 100, 10).unwrap();

        let id = book.submit_limit(Side::Buy, 100, 4).unwrap();

        assert_eq!(book.volume_at(Side::Sell, 100), 6);
        assert!(book.has_level(Side::Sell, 100));
        assert!(!book.has_level(Side::Buy, 100));
        assert!(id > 0);
    }

    #[test]
    fn market_order_never_rests() {
        let mut book = Book::new();
        book.submit_limit(Side::Sell, 100, 5).unwrap();
        let filled = book.submit_market(Side::Buy, 20).unwrap();

        assert_eq!(filled, 5);
        assert!(!book.has_level(Side::Sell, 100));
        assert!(!book.has_level(Side::Buy, 0));
    }

    #[test]
    fn price_improvement_executes_at_maker_price() {
        let mut book = Book::new();
        book.submit_limit(Side::Sell, 95, 10).unwrap();

        let last_price = std::rc::Rc::new(std::cell::Cell::new(0i64));
        let sink_price = last_price.clone();
        book.set_trade_sink(move |t: &Trade| sink_price.set(t.price));
        book.submit_limit(Side::Buy, 100, 10).unwrap();

        assert_eq!(last_price.get(), 95);
    }
}
