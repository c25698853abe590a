use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::db::ContentStore;
use crate::error::{field_errors, AppError, FieldErrors, Result};
use crate::metrics::social::CONTENT_WRITES_TOTAL;
use crate::models::forms::is_valid_slug;
use crate::models::{Group, GroupForm, NewGroup};

pub const INVALID_SLUG: &str =
    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.";
pub const DUPLICATE_SLUG: &str = "Group with this slug already exists.";

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn ContentStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// All groups ordered by title
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }

    pub async fn create_group(&self, form: &GroupForm) -> Result<Group> {
        let cleaned = form.cleaned();
        let mut errors = match cleaned.validate() {
            Ok(()) => FieldErrors::new(),
            Err(report) => field_errors(&report),
        };
        if !cleaned.slug.is_empty() && !is_valid_slug(&cleaned.slug) {
            errors
                .entry("slug".into())
                .or_default()
                .push(INVALID_SLUG.into());
        }
        if !errors.is_empty() {
            CONTENT_WRITES_TOTAL.with_label_values(&["group", "rejected"]).inc();
            return Err(AppError::invalid_form(form, errors));
        }

        let slug = cleaned.slug.clone();
        let group = self
            .store
            .insert_group(NewGroup {
                title: cleaned.title,
                slug: cleaned.slug,
                description: cleaned.description,
            })
            .await?;

        match group {
            Some(group) => {
                CONTENT_WRITES_TOTAL.with_label_values(&["group", "created"]).inc();
                info!(group_id = group.id, slug = %group.slug, "group created");
                Ok(group)
            }
            None => {
                CONTENT_WRITES_TOTAL.with_label_values(&["group", "rejected"]).inc();
                tracing::debug!(slug = %slug, "duplicate group slug");
                let mut errors = FieldErrors::new();
                errors.insert("slug".into(), vec![DUPLICATE_SLUG.into()]);
                Err(AppError::invalid_form(form, errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContentStore;

    fn service() -> GroupService {
        GroupService::new(Arc::new(MemoryContentStore::new()))
    }

    fn form(title: &str, slug: &str) -> GroupForm {
        GroupForm {
            title: title.into(),
            slug: slug.into(),
            description: "about".into(),
        }
    }

    fn slug_errors(result: Result<Group>) -> Vec<String> {
        match result {
            Err(AppError::Validation { errors, .. }) => errors.get("slug").cloned().unwrap_or_default(),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn groups_are_listed_by_title() {
        let service = service();
        service.create_group(&form("Zebras", "zebras")).await.unwrap();
        service.create_group(&form("Cats", "cats")).await.unwrap();

        let titles: Vec<_> = service
            .list_groups()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["Cats", "Zebras"]);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let service = service();
        service.create_group(&form("Cats", "cats")).await.unwrap();

        let errors = slug_errors(service.create_group(&form("More cats", "cats")).await);
        assert_eq!(errors, vec![DUPLICATE_SLUG.to_string()]);
        assert_eq!(service.list_groups().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slug_syntax_is_checked() {
        let errors = slug_errors(service().create_group(&form("Cats", "cats & dogs")).await);
        assert_eq!(errors, vec![INVALID_SLUG.to_string()]);
    }
}
