use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use super::{resolve_post, AuthorizationGuard};
use crate::db::ContentStore;
use crate::error::{field_errors, AppError, FieldErrors, Result};
use crate::metrics::social::CONTENT_WRITES_TOTAL;
use crate::models::forms::INVALID_CHOICE;
use crate::models::views::PostFormView;
use crate::models::{NewPost, Post, PostChanges, PostForm, User};

/// Creates and edits posts.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn ContentStore>,
    guard: AuthorizationGuard,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>, guard: AuthorizationGuard) -> Self {
        Self { store, guard }
    }

    pub async fn new_post_form(&self) -> Result<PostFormView> {
        Ok(PostFormView {
            form: PostForm::default(),
            groups: self.store.list_groups().await?,
            post: None,
        })
    }

    pub async fn create_post(&self, author: &User, form: &PostForm) -> Result<Post> {
        let changes = self.clean(form).await?;

        let post = self
            .store
            .insert_post(NewPost {
                author_id: author.id,
                text: changes.text,
                group_id: changes.group_id,
                image: changes.image,
            })
            .await?;

        CONTENT_WRITES_TOTAL.with_label_values(&["post", "created"]).inc();
        info!(post_id = post.id, author_id = author.id, "post created");
        Ok(post)
    }

    /// Edit form prefilled from the post. Non-owners get `Forbidden`.
    pub async fn edit_post_form(
        &self,
        acting: &User,
        username: &str,
        post_id: i64,
    ) -> Result<PostFormView> {
        let (_, post) = resolve_post(self.store.as_ref(), username, post_id).await?;
        self.guard.ensure_can_edit(acting, &post)?;

        Ok(PostFormView {
            form: PostForm::from_post(&post),
            groups: self.store.list_groups().await?,
            post: Some(post),
        })
    }

    /// Replace text, group and image. Author and pub_date never change.
    pub async fn update_post(
        &self,
        acting: &User,
        username: &str,
        post_id: i64,
        form: &PostForm,
    ) -> Result<Post> {
        let (_, post) = resolve_post(self.store.as_ref(), username, post_id).await?;
        if let Err(e) = self.guard.ensure_can_edit(acting, &post) {
            CONTENT_WRITES_TOTAL.with_label_values(&["post", "forbidden"]).inc();
            return Err(e);
        }

        let changes = self.clean(form).await?;
        let updated = self
            .store
            .update_post(post.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {post_id}")))?;

        CONTENT_WRITES_TOTAL.with_label_values(&["post", "updated"]).inc();
        debug!(post_id = updated.id, "post updated");
        Ok(updated)
    }

    /// Validate the submitted form and resolve its group.
    async fn clean(&self, form: &PostForm) -> Result<PostChanges> {
        let cleaned = form.cleaned();
        let mut errors = match cleaned.validate() {
            Ok(()) => FieldErrors::new(),
            Err(report) => field_errors(&report),
        };

        let group_id = match cleaned.group_id() {
            Ok(None) => None,
            Ok(Some(id)) => match self.store.find_group(id).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.insert("group".into(), vec![INVALID_CHOICE.into()]);
                    None
                }
            },
            Err(()) => {
                errors.insert("group".into(), vec![INVALID_CHOICE.into()]);
                None
            }
        };

        if !errors.is_empty() {
            CONTENT_WRITES_TOTAL.with_label_values(&["post", "rejected"]).inc();
            return Err(AppError::invalid_form(form, errors));
        }

        Ok(PostChanges {
            text: cleaned.text,
            group_id,
            image: cleaned.image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContentStore;
    use crate::models::NewGroup;

    struct Fixture {
        service: PostService,
        store: Arc<dyn ContentStore>,
        sarah: User,
        dj: User,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        let sarah = store.upsert_user(1, "sarah").await.unwrap();
        let dj = store.upsert_user(2, "dj").await.unwrap();
        let guard = AuthorizationGuard::new(store.clone(), "/auth/login/");
        Fixture {
            service: PostService::new(store.clone(), guard),
            store,
            sarah,
            dj,
        }
    }

    fn form(text: &str) -> PostForm {
        PostForm {
            text: text.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_with_group() {
        let f = fixture().await;
        let group = f
            .store
            .insert_group(NewGroup {
                title: "S group".into(),
                slug: "sgroup".into(),
                description: "desc".into(),
            })
            .await
            .unwrap()
            .unwrap();

        let mut submitted = form(" hello ");
        submitted.group = Some(group.id.to_string());
        let post = f.service.create_post(&f.sarah, &submitted).await.unwrap();

        assert_eq!(post.text, "hello");
        assert_eq!(post.group_slug.as_deref(), Some("sgroup"));
    }

    #[tokio::test]
    async fn unknown_group_is_an_invalid_choice() {
        let f = fixture().await;
        let mut submitted = form("hello");
        submitted.group = Some("99".into());

        match f.service.create_post(&f.sarah, &submitted).await {
            Err(AppError::Validation { errors, .. }) => {
                assert_eq!(errors["group"], vec![INVALID_CHOICE.to_string()])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_owner_edit_changes_nothing() {
        let f = fixture().await;
        let post = f.service.create_post(&f.sarah, &form("original")).await.unwrap();

        let err = f
            .service
            .update_post(&f.dj, "sarah", post.id, &form("hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));

        let stored = f.store.find_post(f.sarah.id, post.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "original");
    }

    #[tokio::test]
    async fn owner_edit_keeps_pub_date() {
        let f = fixture().await;
        let post = f.service.create_post(&f.sarah, &form("original")).await.unwrap();

        let updated = f
            .service
            .update_post(&f.sarah, "sarah", post.id, &form("edited"))
            .await
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.pub_date, post.pub_date);

        let view = f
            .service
            .edit_post_form(&f.sarah, "sarah", post.id)
            .await
            .unwrap();
        assert_eq!(view.form.text, "edited");
    }
}
