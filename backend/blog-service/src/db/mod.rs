/// Content Store: durable storage for users, groups, posts, comments and follows.
///
/// Queries return materialized, already ordered results. Posts are always
/// ordered `pub_date DESC, id DESC`; comments `created ASC, id ASC`.
mod memory_store;
mod postgres_store;

pub use memory_store::MemoryContentStore;
pub use postgres_store::PgContentStore;

use crate::error::Result;
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, User};

/// Placeholder prefix for a stale user row whose username was reassigned.
/// `~` is outside the identity service's username alphabet, so the parked
/// name `~released-{id}` can never collide with a real account.
pub const RELEASED_USERNAME_PREFIX: &str = "~released-";

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by any author the given user follows
    FollowedBy(i64),
}

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert or refresh the synced copy of an identity-service user. Another
    /// row still holding `username` is renamed to a released placeholder first.
    async fn upsert_user(&self, id: i64, username: &str) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn find_group(&self, id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// Returns `None` when the slug is already taken.
    async fn insert_group(&self, group: NewGroup) -> Result<Option<Group>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    async fn fetch_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>>;

    /// A post only matches when it belongs to `author_id`.
    async fn find_post(&self, author_id: i64, post_id: i64) -> Result<Option<Post>>;

    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Atomic insert-if-absent; true when a new edge was created.
    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// True when an edge was removed.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool>;

    async fn count_followers(&self, author_id: i64) -> Result<i64>;

    async fn count_following(&self, user_id: i64) -> Result<i64>;

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
