// Resting order record
//
// Orders live in the book's order pool and are addressed by pool index
// rather than pointer. `prev`/`next` are the intrusive FIFO links within
// whichever PriceLevel currently owns the order.

use common::{OrderId, Price, Priority, Qty, Side};

/// A single order resting in (or about to be inserted into) a price level.
#[derive(Clone, Copy, Debug)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub priority: Priority,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl Order {
    pub(crate) fn new(id: OrderId, side: Side, price: Price, qty: Qty, priority: Priority) -> Self {
        Self {
            id,
            side,
            price,
            qty,
            priority,
            prev: None,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_has_no_links() {
        let order = Order::new(1, Side::Buy, 100, 10, 1);
        assert_eq!(order.prev, None);
        assert_eq!(order.next, None);
        assert_eq!(order.id, 1);
        assert_eq!(order.qty, 10);
    }
}
