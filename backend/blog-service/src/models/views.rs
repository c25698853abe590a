/// View documents: what each page shows, serialized as JSON.
use serde::Serialize;

use super::{Comment, CommentForm, Group, Page, Post, PostForm, User};

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

/// Author page: posts plus the follow counters shown next to them.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<Post>,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    /// Whether the viewer follows the author; false for anonymous viewers
    pub following: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowFeed {
    pub page: Page<Post>,
    pub followed_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub author: User,
    pub post: Post,
    pub post_count: i64,
    pub comments: Vec<Comment>,
    pub form: CommentForm,
}

/// Context of the create/edit post form.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormView {
    pub form: PostForm,
    pub groups: Vec<Group>,
    /// Present when editing
    pub post: Option<Post>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentFormView {
    pub post: Post,
    pub form: CommentForm,
}
