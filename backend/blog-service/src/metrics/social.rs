use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Follow graph mutations by action (follow/unfollow) and outcome (created/noop).
    pub static ref FOLLOW_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_follow_actions_total",
        "Follow and unfollow requests segmented by outcome",
        &["action", "outcome"]
    )
    .expect("failed to register blog_follow_actions_total");

    /// Content writes by kind (post/comment/group) and result (created/updated/rejected).
    pub static ref CONTENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_content_writes_total",
        "Content writes segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register blog_content_writes_total");
}
