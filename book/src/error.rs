// Error taxonomy for the book's public operations.
//
// `InvalidQuantity` never leaves a partial mutation behind. A cancel for
// an unknown order id is simply a no-op rather than an error.
// `AllocationFailure` is the one case that can leave trades already
// emitted before it standing, since a pool that cannot grow is effectively
// end-of-life for the book.

use std::error::Error;
use std::fmt;

/// Which pool was exhausted when a resting allocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Order,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookError {
    /// `submit_limit`/`submit_market` called with `qty == 0`.
    InvalidQuantity,
    /// The order or level pool could not provide a slot.
    AllocationFailure(PoolKind),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::InvalidQuantity => write!(f, "order quantity must be greater than zero"),
            BookError::AllocationFailure(PoolKind::Order) => write!(f, "order pool exhausted"),
            BookError::AllocationFailure(PoolKind::Level) => write!(f, "price level pool exhausted"),
        }
    }
}

impl Error for BookError {}
