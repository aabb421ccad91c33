use crate::security::auth::AuthError;
use crate::security::guards::GuardError;
use crate::security::resource::ResourceGuardError;
use crate::server::state::ApiStateError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fhub_derive::api_model;
use fhub_domain::blocks::TreeError;
use std::borrow::Cow;
use tracing::error;

/// The one error type handlers return. Every variant maps to a fixed HTTP
/// status; feature-slice errors convert into it at the handler boundary.
#[fhub_derive::fhub_error]
pub enum ApiError {
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Forbidden{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unauthorized{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Validation failed{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Wire shape for all error responses.
#[api_model]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for the most common rejection.
    pub fn not_found(what: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: what.into(), context: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internals are logged with full detail and returned opaque.
        let body = if matches!(self, Self::Internal { .. }) {
            error!(error = %self, "Unhandled API error");
            ErrorBody { error: "Internal server error".to_owned() }
        } else {
            ErrorBody { error: self.to_string() }
        };

        (status, Json(body)).into_response()
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Forbidden { message, context } => Self::Forbidden { message, context },
        }
    }
}

impl From<ResourceGuardError> for ApiError {
    fn from(err: ResourceGuardError) -> Self {
        match err {
            ResourceGuardError::Validation { message, context } => {
                Self::Validation { message, context }
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        Self::Unauthorized { message: "Invalid bearer token".into(), context: None }
    }
}

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        Self::Validation { message: err.to_string().into(), context: Some("Page tree".into()) }
    }
}

impl From<ApiStateError> for ApiError {
    fn from(err: ApiStateError) -> Self {
        Self::Internal { message: err.to_string().into(), context: Some("Slice registry".into()) }
    }
}

impl From<fhub_database::DatabaseError> for ApiError {
    fn from(err: fhub_database::DatabaseError) -> Self {
        Self::Internal { message: err.to_string().into(), context: Some("Datastore".into()) }
    }
}
