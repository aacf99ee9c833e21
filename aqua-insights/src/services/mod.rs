//! Service modules for aqua-insights

pub mod result_cache;

pub use result_cache::{CacheSettings, CacheStats, ResultCacheService};
