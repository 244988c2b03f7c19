//! End-to-end scenarios for the order book, replaying concrete
//! submit/match/cancel sequences and checking the resulting book state
//! and emitted trades.

use std::cell::RefCell;

use book::{Book, Trade};
use common::{Price, Qty, Side};

fn collect_trades(book: &mut Book) -> std::rc::Rc<RefCell<Vec<Trade>>> {
    let trades = std::rc::Rc::new(RefCell::new(Vec::new()));
    let sink = trades.clone();
    book.set_trade_sink(move |t: &Trade| sink.borrow_mut().push(*t));
    trades
}

#[test]
fn s1_full_match_book_empties() {
    let mut book = Book::new();
    let trades = collect_trades(&mut book);

    let maker = book.submit_limit(Side::Sell, 100, 10).unwrap();
    let taker = book.submit_limit(Side::Buy, 100, 10).unwrap();

    let recorded = trades.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].maker_id, maker);
    assert_eq!(recorded[0].taker_id, taker);
    assert_eq!(recorded[0].price, 100);
    assert_eq!(recorded[0].qty, 10);
    assert_eq!(recorded[0].aggressor, Side::Buy);

    assert_eq!(book.order_count(), 0);
    assert!(!book.has_level(Side::Sell, 100));
}

#[test]
fn s2_partial_match_maker_residual() {
    let mut book = Book::new();
    let trades = collect_trades(&mut book);

    let maker = book.submit_limit(Side::Sell, 100, 10).unwrap();
    let taker = book.submit_limit(Side::Buy, 100, 4).unwrap();

    let recorded = trades.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].maker_id, maker);
    assert_eq!(recorded[0].taker_id, taker);
    assert_eq!(recorded[0].qty, 4);

    assert_eq!(book.order_count(), 1);
    assert_eq!(book.volume_at(Side::Sell, 100), 6);
}

#[test]
fn s3_snapshot_after_mixed_limits() {
    let mut book = Book::new();

    book.submit_limit(Side::Sell, 105, 10).unwrap();
    book.submit_limit(Side::Sell, 101, 10).unwrap();
    book.submit_limit(Side::Sell, 103, 10).unwrap();
    book.submit_limit(Side::Buy, 98, 5).unwrap();
    book.submit_limit(Side::Buy, 99, 5).unwrap();

    let snap = book.snapshot(5);

    assert_eq!(snap.asks, vec![(101, 10), (103, 10), (105, 10)]);
    assert_eq!(snap.bids, vec![(99, 5), (98, 5)]);
}

#[test]
fn s4_market_order_sweeps_two_levels() {
    let mut book = Book::new();
    let trades = collect_trades(&mut book);

    book.submit_limit(Side::Sell, 100, 10).unwrap();
    book.submit_limit(Side::Sell, 101, 10).unwrap();

    let filled = book.submit_market(Side::Buy, 15).unwrap();
    assert_eq!(filled, 15);

    let recorded = trades.borrow();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].price, 100);
    assert_eq!(recorded[0].qty, 10);
    assert_eq!(recorded[1].price, 101);
    assert_eq!(recorded[1].qty, 5);

    assert_eq!(book.order_count(), 1);
    assert_eq!(book.volume_at(Side::Sell, 101), 5);
}

#[test]
fn s5_price_improvement_executes_at_maker_price() {
    let mut book = Book::new();
    let trades = collect_trades(&mut book);

    book.submit_limit(Side::Sell, 100, 10).unwrap();
    book.submit_limit(Side::Buy, 105, 10).unwrap();

    let recorded = trades.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].price, 100);

    assert_eq!(book.order_count(), 0);
}

#[test]
fn s6_cancel_preserves_aggregates() {
    let mut book = Book::new();

    let first = book.submit_limit(Side::Sell, 100, 10).unwrap();
    let second = book.submit_limit(Side::Sell, 100, 7).unwrap();
    assert_eq!(book.volume_at(Side::Sell, 100), 17);

    book.cancel(first);
    assert_eq!(book.volume_at(Side::Sell, 100), 7);
    assert_eq!(book.order_count(), 1);

    book.cancel(second);
    assert!(!book.has_level(Side::Sell, 100));
}

#[test]
fn fifo_within_a_level_fills_earliest_order_first() {
    let mut book = Book::new();
    let trades = collect_trades(&mut book);

    let a = book.submit_limit(Side::Sell, 100, 5).unwrap();
    let _b = book.submit_limit(Side::Sell, 100, 5).unwrap();

    book.submit_limit(Side::Buy, 100, 5).unwrap();

    let recorded = trades.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].maker_id, a);
}

#[test]
fn cancel_is_idempotent() {
    let mut book = Book::new();
    let id = book.submit_limit(Side::Buy, 100, 10).unwrap();

    book.cancel(id);
    book.cancel(id);

    assert_eq!(book.order_count(), 0);
}

#[test]
fn conservation_of_quantity_across_a_partial_fill() {
    let mut book = Book::new();
    let maker_original: Qty = 10;
    book.submit_limit(Side::Sell, 100, maker_original).unwrap();

    let taker_qty: Qty = 4;
    book.submit_limit(Side::Buy, 100, taker_qty).unwrap();

    let maker_residual = book.volume_at(Side::Sell, 100);
    assert_eq!(maker_residual + taker_qty, maker_original);
}

#[test]
fn no_cross_after_resting_orders_on_both_sides() {
    let mut book = Book::new();
    book.submit_limit(Side::Buy, 98, 10).unwrap();
    book.submit_limit(Side::Sell, 102, 10).unwrap();

    let snap = book.snapshot(1);
    let best_bid: Price = snap.bids[0].0;
    let best_ask: Price = snap.asks[0].0;
    assert!(best_bid < best_ask);
}
