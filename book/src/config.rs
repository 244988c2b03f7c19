// Book construction parameters.
//
// Order/level pool capacities are fixed at compile time (see
// `book::ORDER_POOL_CAPACITY`/`book::LEVEL_POOL_CAPACITY`); `BookConfig`
// carries the parameters that make sense to vary per instance instead.
#[derive(Debug, Clone, Copy)]
pub struct BookConfig {
    /// Depth used by callers of `Book::snapshot_default` / logging.
    pub default_snapshot_depth: usize,
}

impl BookConfig {
    pub fn new(default_snapshot_depth: usize) -> Self {
        Self {
            default_snapshot_depth,
        }
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            default_snapshot_depth: 10,
        }
    }
}
