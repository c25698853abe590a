/// Group handlers
use actix_web::{web, HttpRequest, HttpResponse};

use super::FormResult;
use crate::error::Result;
use crate::middleware::{return_path, Viewer};
use crate::models::GroupForm;
use crate::AppState;

/// GET /groups/
pub async fn list_groups(state: web::Data<AppState>) -> Result<HttpResponse> {
    let groups = state.groups.list_groups().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "groups": groups })))
}

/// POST /groups/ - 201 with the created group
pub async fn create_group(
    state: web::Data<AppState>,
    viewer: Viewer,
    req: HttpRequest,
    form: FormResult<GroupForm>,
) -> actix_web::Result<HttpResponse> {
    state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let form = form?;
    let group = state.groups.create_group(&form).await?;
    Ok(HttpResponse::Created().json(group))
}
