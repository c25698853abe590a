/// Follow handlers - both mutations are idempotent and always redirect
use actix_web::{web, HttpRequest, HttpResponse};

use super::redirect;
use crate::error::Result;
use crate::middleware::{return_path, Viewer};
use crate::AppState;

/// GET /{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let follower = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    state.follows.follow(&follower, &username).await?;
    Ok(redirect("/follow/"))
}

/// GET /{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let follower = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    state.follows.unfollow(&follower, &username).await?;
    Ok(redirect(format!("/{}/", username.as_str())))
}
