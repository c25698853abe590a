/// HTTP handlers for blog-service
///
/// - `feed`: global, group, profile and followed-authors feeds, post detail
/// - `posts`: create and edit posts
/// - `comments`: comment form and submission
/// - `follow`: follow / unfollow an author
/// - `groups`: list and create groups
///
/// Literal routes are registered before the `/{username}/...` catch-alls, so
/// the usernames `new`, `follow`, `groups` and `group` are shadowed.
pub mod comments;
pub mod feed;
pub mod follow;
pub mod groups;
pub mod posts;

use actix_web::http::header;
use actix_web::{error, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, FieldErrors};
use crate::models::PageRequest;
use crate::AppState;

/// Register every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .route("/api/v1/health", web::get().to(health))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .route("/", web::get().to(feed::index))
        .service(
            web::resource("/new/")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/follow/", web::get().to(feed::follow_index))
        .service(
            web::resource("/groups/")
                .route(web::get().to(groups::list_groups))
                .route(web::post().to(groups::create_group)),
        )
        .route("/group/{slug}/", web::get().to(feed::group_posts))
        .route("/{username}/", web::get().to(feed::profile))
        .route("/{username}/follow/", web::get().to(follow::profile_follow))
        .route("/{username}/unfollow/", web::get().to(follow::profile_unfollow))
        .route(r"/{username}/{post_id:\d+}/", web::get().to(feed::post_view))
        .service(
            web::resource(r"/{username}/{post_id:\d+}/edit/")
                .route(web::get().to(posts::edit_post_form))
                .route(web::post().to(posts::update_post)),
        )
        .service(
            web::resource(r"/{username}/{post_id:\d+}/comment")
                .route(web::get().to(comments::comment_form))
                .route(web::post().to(comments::add_comment)),
        );
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::not_found(req.path().to_string()))
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "blog-service"
            }))
        }
    }
}

/// A body that is not a valid form is treated like a form that failed validation.
fn form_error(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    let mut errors = FieldErrors::new();
    errors.insert("__all__".to_string(), vec![err.to_string()]);
    AppError::Validation {
        form: serde_json::Value::Null,
        errors,
    }
    .into()
}

/// Form bodies are extracted as a `Result` so the login check runs before a
/// malformed body is reported.
pub(crate) type FormResult<T> = std::result::Result<web::Form<T>, actix_web::Error>;

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// The `page` query parameter. Never fails: anything unusable means page 1.
pub(crate) fn page_request(req: &HttpRequest) -> PageRequest {
    web::Query::<PageQuery>::from_query(req.query_string())
        .map(|q| PageRequest::parse(q.page.as_deref()))
        .unwrap_or_default()
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location.as_ref()))
        .finish()
}
