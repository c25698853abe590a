use std::sync::Arc;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Post, User};

/// Explicit access check run at the top of every protected operation.
#[derive(Clone)]
pub struct AuthorizationGuard {
    store: Arc<dyn ContentStore>,
    login_url: String,
}

impl AuthorizationGuard {
    pub fn new(store: Arc<dyn ContentStore>, login_url: impl Into<String>) -> Self {
        Self {
            store,
            login_url: login_url.into(),
        }
    }

    /// `<login_url>?next=<return_to>`, keeping path slashes readable.
    pub fn login_redirect(&self, return_to: &str) -> String {
        let next = urlencoding::encode(return_to).replace("%2F", "/");
        format!("{}?next={}", self.login_url, next)
    }

    /// Reject anonymous viewers; otherwise sync the viewer into the store and
    /// return the stored user.
    pub async fn require_user(&self, viewer: Option<&AuthUser>, return_to: &str) -> Result<User> {
        let Some(user) = viewer else {
            tracing::debug!(return_to, "anonymous access to protected action");
            return Err(AppError::Unauthorized {
                redirect_to: self.login_redirect(return_to),
            });
        };

        self.store.upsert_user(user.id, &user.username).await
    }

    pub fn can_edit(acting_user_id: i64, post: &Post) -> bool {
        post.author_id == acting_user_id
    }

    /// Non-owners are sent back to the post's detail view.
    pub fn ensure_can_edit(&self, acting: &User, post: &Post) -> Result<()> {
        if Self::can_edit(acting.id, post) {
            return Ok(());
        }

        tracing::warn!(
            user_id = acting.id,
            post_id = post.id,
            "edit attempt by non-owner"
        );
        Err(AppError::Forbidden {
            redirect_to: post.detail_url(),
        })
    }
}
