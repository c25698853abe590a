use std::sync::Arc;
use tracing::debug;

use super::{resolve_author, resolve_post};
use crate::cache::GlobalFeedCache;
use crate::db::{ContentStore, PostFilter};
use crate::error::{AppError, Result};
use crate::metrics::feed::{FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL};
use crate::models::views::{FollowFeed, GroupFeed, PostDetail, ProfileFeed};
use crate::models::{CommentForm, Page, PageRequest, PageWindow, Post, User};

pub const GLOBAL_PAGE_SIZE: i64 = 10;
pub const GROUP_PAGE_SIZE: i64 = 12;
pub const PROFILE_PAGE_SIZE: i64 = 5;
pub const FOLLOW_PAGE_SIZE: i64 = 10;

/// Which feed to compose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    ByGroup(String),
    ByAuthor(String),
    /// Posts of every author the viewer follows
    ByFollowed(i64),
}

impl FeedScope {
    fn label(&self) -> &'static str {
        match self {
            FeedScope::Global => "global",
            FeedScope::ByGroup(_) => "group",
            FeedScope::ByAuthor(_) => "profile",
            FeedScope::ByFollowed(_) => "follow",
        }
    }

    pub fn page_size(&self) -> i64 {
        match self {
            FeedScope::Global => GLOBAL_PAGE_SIZE,
            FeedScope::ByGroup(_) => GROUP_PAGE_SIZE,
            FeedScope::ByAuthor(_) => PROFILE_PAGE_SIZE,
            FeedScope::ByFollowed(_) => FOLLOW_PAGE_SIZE,
        }
    }
}

/// Builds ordered, paginated post listings and the post detail view.
///
/// Only the global listing goes through [`GlobalFeedCache`]; every other view
/// reads the store on each request, so edits show up there immediately.
#[derive(Clone)]
pub struct FeedComposer {
    store: Arc<dyn ContentStore>,
    cache: GlobalFeedCache,
}

impl FeedComposer {
    pub fn new(store: Arc<dyn ContentStore>, cache: GlobalFeedCache) -> Self {
        Self { store, cache }
    }

    /// One page of posts for `scope`.
    pub async fn list_posts(&self, scope: &FeedScope, request: PageRequest) -> Result<Page<Post>> {
        match scope {
            FeedScope::Global => {
                let page = self.global_feed(request).await?;
                Ok(Page::clone(&page))
            }
            FeedScope::ByGroup(slug) => Ok(self.group_feed(slug, request).await?.page),
            FeedScope::ByAuthor(username) => {
                let author = resolve_author(self.store.as_ref(), username).await?;
                self.paginate(scope, PostFilter::Author(author.id), request)
                    .await
            }
            FeedScope::ByFollowed(user_id) => {
                self.paginate(scope, PostFilter::FollowedBy(*user_id), request)
                    .await
            }
        }
    }

    /// Global listing, served from the cache while the entry is fresh.
    pub async fn global_feed(&self, request: PageRequest) -> Result<Arc<Page<Post>>> {
        if let Some(page) = self.cache.get(request).await {
            FEED_REQUEST_TOTAL.with_label_values(&["global_cached"]).inc();
            return Ok(page);
        }

        let page = Arc::new(
            self.paginate(&FeedScope::Global, PostFilter::All, request)
                .await?,
        );
        self.cache.insert(request, page.clone()).await;
        Ok(page)
    }

    pub async fn group_feed(&self, slug: &str, request: PageRequest) -> Result<GroupFeed> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group {slug}")))?;

        let scope = FeedScope::ByGroup(slug.to_string());
        let page = self
            .paginate(&scope, PostFilter::Group(group.id), request)
            .await?;
        Ok(GroupFeed { group, page })
    }

    /// Author page. Follow state is false for anonymous viewers.
    pub async fn profile(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        request: PageRequest,
    ) -> Result<ProfileFeed> {
        let author = resolve_author(self.store.as_ref(), username).await?;
        let scope = FeedScope::ByAuthor(author.username.clone());
        let page = self
            .paginate(&scope, PostFilter::Author(author.id), request)
            .await?;

        let follower_count = self.store.count_followers(author.id).await?;
        let following_count = self.store.count_following(author.id).await?;
        let following = match viewer_id {
            Some(viewer_id) => self.store.is_following(viewer_id, author.id).await?,
            None => false,
        };

        Ok(ProfileFeed {
            post_count: page.count,
            author,
            page,
            follower_count,
            following_count,
            following,
        })
    }

    pub async fn follow_feed(&self, viewer: &User, request: PageRequest) -> Result<FollowFeed> {
        let scope = FeedScope::ByFollowed(viewer.id);
        let page = self
            .paginate(&scope, PostFilter::FollowedBy(viewer.id), request)
            .await?;
        let followed_count = self.store.count_following(viewer.id).await?;

        Ok(FollowFeed {
            page,
            followed_count,
        })
    }

    pub async fn post_detail(&self, username: &str, post_id: i64) -> Result<PostDetail> {
        let (author, post) = resolve_post(self.store.as_ref(), username, post_id).await?;
        let post_count = self.store.count_posts(PostFilter::Author(author.id)).await?;
        let comments = self.store.list_comments(post.id).await?;

        Ok(PostDetail {
            author,
            post,
            post_count,
            comments,
            form: CommentForm::default(),
        })
    }

    async fn paginate(
        &self,
        scope: &FeedScope,
        filter: PostFilter,
        request: PageRequest,
    ) -> Result<Page<Post>> {
        let label = scope.label();
        let _timer = FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[label])
            .start_timer();
        FEED_REQUEST_TOTAL.with_label_values(&[label]).inc();

        let count = self.store.count_posts(filter).await?;
        let window = PageWindow::resolve(request, count, scope.page_size());
        let posts = self
            .store
            .fetch_posts(filter, window.limit(), window.offset())
            .await?;

        debug!(
            scope = label,
            requested = request.number(),
            page = window.number,
            total_pages = window.total_pages,
            returned = posts.len(),
            "feed page composed"
        );
        Ok(Page::new(posts, window))
    }
}
