// Top-of-book snapshot record.

use common::{Price, Qty};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Descending by price.
    pub bids: Vec<(Price, Qty)>,
    /// Ascending by price.
    pub asks: Vec<(Price, Qty)>,
}
