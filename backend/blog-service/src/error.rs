/// Error types for the blog service
///
/// Every failure a request can end in is one of these variants. The HTTP
/// mapping lives in the `ResponseError` impl so handlers only propagate with `?`.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Field name -> messages, in the shape a form re-render needs.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown user, group, post or route
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anonymous access to a protected action; carries the login redirect
    #[error("Authentication required")]
    Unauthorized { redirect_to: String },

    /// Authenticated but not allowed; the mutation is dropped and the client
    /// is sent to the public view of the resource
    #[error("Forbidden")]
    Forbidden { redirect_to: String },

    /// Form input rejected; the submitted form travels back with the messages
    #[error("Validation failed")]
    Validation {
        form: serde_json::Value,
        errors: FieldErrors,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Single-field validation failure.
    pub fn invalid_field(
        form: serde_json::Value,
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation { form, errors }
    }

    /// Validation failure for a whole form.
    pub fn invalid_form<F: serde::Serialize>(form: &F, errors: FieldErrors) -> Self {
        AppError::Validation {
            form: serde_json::to_value(form).unwrap_or(serde_json::Value::Null),
            errors,
        }
    }

    /// Convert `validator` output into field errors.
    pub fn from_validation<F: serde::Serialize>(
        form: &F,
        report: validator::ValidationErrors,
    ) -> Self {
        Self::invalid_form(form, field_errors(&report))
    }
}

/// Flatten a `validator` report to field -> messages, falling back to the
/// error code when a rule carries no message.
pub fn field_errors(report: &validator::ValidationErrors) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field, messages) in report.field_errors() {
        let messages = messages
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        errors.insert(field.to_string(), messages);
    }
    errors
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } | AppError::Forbidden { .. } => StatusCode::FOUND,
            AppError::Validation { .. } => StatusCode::OK,
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::Unauthorized { redirect_to } | AppError::Forbidden { redirect_to } => {
                HttpResponse::Found()
                    .append_header((header::LOCATION, redirect_to.as_str()))
                    .finish()
            }
            AppError::Validation { form, errors } => HttpResponse::Ok().json(serde_json::json!({
                "form": form,
                "errors": errors,
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Not found: {}", msg),
                "status": status.as_u16(),
            })),
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                HttpResponse::InternalServerError()
                    .insert_header((header::CACHE_CONTROL, "no-store"))
                    .json(serde_json::json!({
                        "error": "Internal server error",
                        "status": status.as_u16(),
                    }))
            }
        }
    }
}
