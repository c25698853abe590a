use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Duration of feed requests by scope (global, group, profile, follow).
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_feed_request_duration_seconds",
        "Feed request duration segmented by feed scope",
        &["scope"]
    )
    .expect("failed to register blog_feed_request_duration_seconds");

    /// Total feed pages composed by scope.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_feed_request_total",
        "Total feed requests segmented by feed scope",
        &["scope"]
    )
    .expect("failed to register blog_feed_request_total");

    /// Global feed cache events (hit/miss).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_feed_cache_events_total",
        "Global feed cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register blog_feed_cache_events_total");
}
