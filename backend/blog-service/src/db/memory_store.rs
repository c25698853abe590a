use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ContentStore, PostFilter, RELEASED_USERNAME_PREFIX};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, Post, PostChanges, User,
};

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    author_id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, String>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRecord>,
    comments: Vec<CommentRecord>,
    follows: BTreeSet<Follow>,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Inner {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn hydrate(&self, record: &PostRecord) -> Post {
        Post {
            id: record.id,
            author_id: record.author_id,
            author: self.users.get(&record.author_id).cloned().unwrap_or_default(),
            text: record.text.clone(),
            pub_date: record.pub_date,
            group_id: record.group_id,
            group_slug: record
                .group_id
                .and_then(|id| self.groups.get(&id))
                .map(|g| g.slug.clone()),
            image: record.image.clone(),
        }
    }

    fn hydrate_comment(&self, record: &CommentRecord) -> Comment {
        Comment {
            id: record.id,
            post_id: record.post_id,
            author_id: record.author_id,
            author: self.users.get(&record.author_id).cloned().unwrap_or_default(),
            text: record.text.clone(),
            created: record.created,
        }
    }

    fn matches(&self, record: &PostRecord, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => record.group_id == Some(group_id),
            PostFilter::Author(author_id) => record.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&Follow {
                user_id,
                author_id: record.author_id,
            }),
        }
    }

    fn insert_post(&mut self, post: NewPost, pub_date: DateTime<Utc>) -> Result<Post> {
        if !self.users.contains_key(&post.author_id) {
            return Err(AppError::Internal(format!(
                "author {} is not synced",
                post.author_id
            )));
        }

        let id = Self::next_id(&mut self.next_post_id);
        let record = PostRecord {
            id,
            author_id: post.author_id,
            text: post.text,
            pub_date,
            group_id: post.group_id.filter(|gid| self.groups.contains_key(gid)),
            image: post.image,
        };
        let created = self.hydrate(&record);
        self.posts.insert(id, record);
        Ok(created)
    }

    /// Filtered posts, newest first.
    fn select(&self, filter: PostFilter) -> Vec<&PostRecord> {
        let mut selected: Vec<&PostRecord> = self
            .posts
            .values()
            .filter(|record| self.matches(record, filter))
            .collect();
        selected.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        selected
    }
}

/// In-process content store.
///
/// Used by tests and by `STORE_BACKEND=memory` local runs. Every check-then-
/// mutate sequence runs under a single write guard, so follow inserts and
/// group slug checks are atomic the same way the database constraints are.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    inner: RwLock<Inner>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a post with a fixed publication time.
    #[cfg(test)]
    pub(crate) async fn insert_post_at(
        &self,
        post: NewPost,
        pub_date: DateTime<Utc>,
    ) -> Result<Post> {
        let mut inner = self.inner.write().await;
        inner.insert_post(post, pub_date)
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryContentStore {
    async fn upsert_user(&self, id: i64, username: &str) -> Result<User> {
        let mut inner = self.inner.write().await;
        for (other_id, name) in inner.users.iter_mut() {
            if *other_id != id && name.as_str() == username {
                *name = format!("{RELEASED_USERNAME_PREFIX}{other_id}");
            }
        }

        inner.users.insert(id, username.to_string());
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|(_, name)| name.as_str() == username)
            .map(|(id, name)| User {
                id: *id,
                username: name.clone(),
            }))
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let inner = self.inner.read().await;
        let mut groups: Vec<Group> = inner.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>> {
        Ok(self.inner.read().await.groups.get(&id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let inner = self.inner.read().await;
        Ok(inner.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Option<Group>> {
        let mut inner = self.inner.write().await;
        if inner.groups.values().any(|g| g.slug == group.slug) {
            return Ok(None);
        }

        let id = Inner::next_id(&mut inner.next_group_id);
        let created = Group {
            id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        inner.groups.insert(id, created.clone());
        Ok(Some(created))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.select(filter).len() as i64)
    }

    async fn fetch_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(inner
            .select(filter)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|record| inner.hydrate(record))
            .collect())
    }

    async fn find_post(&self, author_id: i64, post_id: i64) -> Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .get(&post_id)
            .filter(|record| record.author_id == author_id)
            .map(|record| inner.hydrate(record)))
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut inner = self.inner.write().await;
        inner.insert_post(post, Utc::now())
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut inner = self.inner.write().await;
        let group_id = changes
            .group_id
            .filter(|gid| inner.groups.contains_key(gid));

        let Some(record) = inner.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        record.text = changes.text;
        record.group_id = group_id;
        record.image = changes.image;

        let record = record.clone();
        Ok(Some(inner.hydrate(&record)))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<&CommentRecord> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .map(|c| inner.hydrate_comment(c))
            .collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&comment.post_id) {
            return Err(AppError::not_found(format!("post {}", comment.post_id)));
        }

        let id = Inner::next_id(&mut inner.next_comment_id);
        let record = CommentRecord {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        let created = inner.hydrate_comment(&record);
        inner.comments.push(record);
        Ok(created)
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        if user_id == author_id {
            return Ok(false);
        }
        let mut inner = self.inner.write().await;
        Ok(inner.follows.insert(Follow { user_id, author_id }))
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.follows.remove(&Follow { user_id, author_id }))
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.follows.contains(&Follow { user_id, author_id }))
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .filter(|f| f.author_id == author_id)
            .count() as i64)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.follows.iter().filter(|f| f.user_id == user_id).count() as i64)
    }

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect())
    }
}
