/// Blog Service Library
///
/// Posts, groups, comments and the follow graph, plus the feeds built from
/// them: global, per-group, per-author and followed-authors.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Entities, forms, pages and view documents
/// - `services`: Feed composition, follow graph, posts, comments, groups, authorization
/// - `db`: Content store trait with PostgreSQL and in-memory implementations
/// - `cache`: Global feed cache
/// - `middleware`: Viewer identity and request timing
/// - `error`: Error types and their HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use cache::GlobalFeedCache;
use db::ContentStore;
use middleware::TokenDecoder;
use services::{
    AuthorizationGuard, CommentService, FeedComposer, FollowGraph, GroupService, PostService,
};

/// Everything a handler needs, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub guard: AuthorizationGuard,
    pub feeds: FeedComposer,
    pub follows: FollowGraph,
    pub posts: PostService,
    pub comments: CommentService,
    pub groups: GroupService,
    pub tokens: Arc<TokenDecoder>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, config: &Config) -> Self {
        let cache = GlobalFeedCache::new(
            config.feed.global_cache_ttl(),
            config.feed.global_cache_max_pages,
        );
        let guard = AuthorizationGuard::new(store.clone(), config.auth.login_url.clone());

        Self {
            feeds: FeedComposer::new(store.clone(), cache),
            follows: FollowGraph::new(store.clone()),
            posts: PostService::new(store.clone(), guard.clone()),
            comments: CommentService::new(store.clone()),
            groups: GroupService::new(store.clone()),
            tokens: Arc::new(TokenDecoder::new(&config.auth.jwt_secret)),
            guard,
            store,
        }
    }
}
