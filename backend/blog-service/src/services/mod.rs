/// Business logic layer for blog-service
///
/// Each service owns a handle to the content store. Protected operations take
/// the acting user already returned by [`AuthorizationGuard::require_user`].
pub mod authorization;
pub mod comments;
pub mod feed;
pub mod follow;
pub mod groups;
pub mod posts;

pub use authorization::AuthorizationGuard;
pub use comments::CommentService;
pub use feed::{FeedComposer, FeedScope};
pub use follow::FollowGraph;
pub use groups::GroupService;
pub use posts::PostService;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{Post, User};

pub(crate) async fn resolve_author(store: &dyn ContentStore, username: &str) -> Result<User> {
    store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {username}")))
}

/// Resolve a post by `(author username, id)`. A post that exists but belongs
/// to someone else is not found.
pub(crate) async fn resolve_post(
    store: &dyn ContentStore,
    username: &str,
    post_id: i64,
) -> Result<(User, Post)> {
    let author = resolve_author(store, username).await?;
    let post = store
        .find_post(author.id, post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {post_id} by {username}")))?;
    Ok((author, post))
}
