/// Data models for blog-service
///
/// - Entities mirrored from the store: User, Group, Post, Comment, Follow
/// - Write payloads handed to the store: NewPost, PostChanges, NewComment, NewGroup
/// - `forms`: submitted form bodies and their validation rules
/// - `page`: page request parsing and page windows
/// - `views`: documents returned by the HTTP layer
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod forms;
pub mod page;
pub mod views;

pub use forms::{CommentForm, GroupForm, PostForm};
pub use page::{Page, PageRequest, PageWindow};

/// Synced copy of an identity-service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as listed: the row plus the author's username and group slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
}

impl Post {
    pub fn detail_url(&self) -> String {
        format!("/{}/{}/", self.author, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Follow edge; the pair is its whole identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Editable fields of a post. Author and pub_date are not among them.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}
