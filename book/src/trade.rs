// Trade report emitted synchronously to the book's trade sink.

use common::{OrderId, Price, Qty, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub maker_id: OrderId,
    pub taker_id: OrderId,
    pub price: Price,
    pub qty: Qty,
    pub aggressor: Side,
}
