/// Feed handlers - read-only listings and the post detail view
use actix_web::{web, HttpRequest, HttpResponse};

use super::page_request;
use crate::error::Result;
use crate::middleware::{return_path, Viewer};
use crate::AppState;

/// GET / - global feed, cached
pub async fn index(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let page = state.feeds.global_feed(page_request(&req)).await?;
    Ok(HttpResponse::Ok().json(page.as_ref()))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let feed = state.feeds.group_feed(&slug, page_request(&req)).await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let viewer_id = viewer.user().map(|u| u.id);
    let feed = state
        .feeds
        .profile(&username, viewer_id, page_request(&req))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let detail = state.feeds.post_detail(&username, post_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// GET /follow/ - posts of every followed author
pub async fn follow_index(
    state: web::Data<AppState>,
    viewer: Viewer,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let feed = state.feeds.follow_feed(&user, page_request(&req)).await?;
    Ok(HttpResponse::Ok().json(feed))
}
