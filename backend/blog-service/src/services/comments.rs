use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use super::resolve_post;
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::social::CONTENT_WRITES_TOTAL;
use crate::models::views::CommentFormView;
use crate::models::{Comment, CommentForm, NewComment, User};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn ContentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn comment_form(&self, username: &str, post_id: i64) -> Result<CommentFormView> {
        let (_, post) = resolve_post(self.store.as_ref(), username, post_id).await?;
        Ok(CommentFormView {
            post,
            form: CommentForm::default(),
        })
    }

    /// Append a comment by `acting` to the post `(username, post_id)`.
    /// Any authenticated user may comment on any post.
    pub async fn add_comment(
        &self,
        acting: &User,
        username: &str,
        post_id: i64,
        form: &CommentForm,
    ) -> Result<Comment> {
        let (_, post) = resolve_post(self.store.as_ref(), username, post_id).await?;

        let cleaned = form.cleaned();
        if let Err(report) = cleaned.validate() {
            CONTENT_WRITES_TOTAL
                .with_label_values(&["comment", "rejected"])
                .inc();
            return Err(AppError::from_validation(form, report));
        }

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id: post.id,
                author_id: acting.id,
                text: cleaned.text,
            })
            .await?;

        CONTENT_WRITES_TOTAL
            .with_label_values(&["comment", "created"])
            .inc();
        debug!(comment_id = comment.id, post_id = post.id, author_id = acting.id, "comment added");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContentStore;
    use crate::models::NewPost;

    async fn setup() -> (CommentService, Arc<dyn ContentStore>, User, i64) {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        store.upsert_user(1, "sarah").await.unwrap();
        let reader = store.upsert_user(2, "dj").await.unwrap();
        let post = store
            .insert_post(NewPost {
                author_id: 1,
                text: "hello".into(),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        (CommentService::new(store.clone()), store, reader, post.id)
    }

    #[tokio::test]
    async fn comment_is_appended_with_trimmed_text() {
        let (service, store, reader, post_id) = setup().await;
        let form = CommentForm {
            text: "  nice post ".into(),
        };

        let comment = service.add_comment(&reader, "sarah", post_id, &form).await.unwrap();
        assert_eq!(comment.text, "nice post");
        assert_eq!(comment.author, "dj");
        assert_eq!(store.list_comments(post_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_comment_persists_nothing() {
        let (service, store, reader, post_id) = setup().await;
        let form = CommentForm { text: "   ".into() };

        let err = service
            .add_comment(&reader, "sarah", post_id, &form)
            .await
            .unwrap_err();
        match err {
            AppError::Validation { errors, .. } => assert!(errors.contains_key("text")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.list_comments(post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn post_must_belong_to_the_named_author() {
        let (service, _, reader, post_id) = setup().await;
        let form = CommentForm { text: "hi".into() };

        let err = service
            .add_comment(&reader, "dj", post_id, &form)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
