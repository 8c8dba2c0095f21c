/// Default maximum number of entries the shared byte cache will hold.
pub const CACHE_COUNT_LIMIT: usize = 100;

/// Default maximum aggregate payload size (in bytes) for the shared byte cache.
pub const CACHE_TOTAL_COST_LIMIT: usize = 50 * 1024 * 1024;
