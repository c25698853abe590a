/// Submitted form bodies.
///
/// Handlers receive these straight from `application/x-www-form-urlencoded`
/// bodies. Services call `cleaned()` (whitespace trimmed, blanks dropped) and
/// validate the cleaned copy, so a whitespace-only text counts as missing.
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Post;

pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Group id as submitted by the select box; empty means no group.
    #[serde(default)]
    pub group: Option<String>,
    /// Opaque key of an image already stored by the media service.
    #[serde(default)]
    pub image: Option<String>,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
        }
    }

    pub fn cleaned(&self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            group: non_blank(&self.group),
            image: non_blank(&self.image),
        }
    }

    /// `Ok(None)` for no group, `Err(())` when the value is not an id at all.
    pub fn group_id(&self) -> Result<Option<i64>, ()> {
        match non_blank(&self.group) {
            None => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| ()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn cleaned(&self) -> Self {
        Self {
            text: self.text.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GroupForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Enter a title of at most 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Enter a slug of at most 100 characters."))]
    pub slug: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub description: String,
}

impl GroupForm {
    pub fn cleaned(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            slug: self.slug.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Letters, digits, underscores and hyphens only.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
