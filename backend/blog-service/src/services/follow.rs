use std::sync::Arc;
use tracing::debug;

use super::resolve_author;
use crate::db::ContentStore;
use crate::error::Result;
use crate::metrics::social::FOLLOW_ACTIONS_TOTAL;
use crate::models::User;

/// Follow relation with idempotent mutations.
#[derive(Clone)]
pub struct FollowGraph {
    store: Arc<dyn ContentStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Follow `author_username`; returns true if a new edge was created.
    /// Following yourself or someone already followed is a no-op.
    pub async fn follow(&self, follower: &User, author_username: &str) -> Result<bool> {
        let author = resolve_author(self.store.as_ref(), author_username).await?;

        if follower.id == author.id {
            debug!(user_id = follower.id, "self-follow ignored");
            FOLLOW_ACTIONS_TOTAL.with_label_values(&["follow", "noop"]).inc();
            return Ok(false);
        }

        let created = self.store.insert_follow(follower.id, author.id).await?;
        let outcome = if created { "created" } else { "noop" };
        FOLLOW_ACTIONS_TOTAL.with_label_values(&["follow", outcome]).inc();
        debug!(follower_id = follower.id, author_id = author.id, created, "follow");
        Ok(created)
    }

    /// Returns true if an edge was removed.
    pub async fn unfollow(&self, follower: &User, author_username: &str) -> Result<bool> {
        let author = resolve_author(self.store.as_ref(), author_username).await?;

        let removed = self.store.delete_follow(follower.id, author.id).await?;
        let outcome = if removed { "removed" } else { "noop" };
        FOLLOW_ACTIONS_TOTAL.with_label_values(&["unfollow", outcome]).inc();
        debug!(follower_id = follower.id, author_id = author.id, removed, "unfollow");
        Ok(removed)
    }

    pub async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        self.store.is_following(follower_id, author_id).await
    }

    pub async fn follower_count(&self, author_id: i64) -> Result<i64> {
        self.store.count_followers(author_id).await
    }

    pub async fn following_count(&self, user_id: i64) -> Result<i64> {
        self.store.count_following(user_id).await
    }

    pub async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.store.followed_author_ids(user_id).await
    }
}
