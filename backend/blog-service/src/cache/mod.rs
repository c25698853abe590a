/// Caching layer for blog-service
///
/// Only the global feed is cached. Entries expire by time; writes never
/// invalidate them.
pub mod feed_cache;

pub use feed_cache::GlobalFeedCache;
