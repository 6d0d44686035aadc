use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::drive::BlobError;
use crate::store::StoreError;

/// Error taxonomy shared by every view. Authentication errors block the
/// attempted action; data errors leave state unchanged and surface as a
/// transient notification; the partial-provisioning case is reported with
/// its own machine code because it leaves an orphaned identity behind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("file storage error: {0}")]
    Blob(#[from] BlobError),
    #[error("account created, role assignment failed")]
    PartialProvision,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) | Self::Blob(_) | Self::PartialProvision => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
            Self::Blob(_) => "blob",
            Self::PartialProvision => "partial_provision",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => Self::Validation("email is already registered".to_string()),
            AuthError::InvalidCredentials => Self::Unauthenticated,
            AuthError::Backend(msg) => Self::Store(StoreError::Query(msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {self}");
        }
        let body = Json(serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_provision_is_distinct_from_generic_failures() {
        let err = AppError::PartialProvision;
        assert_eq!(err.code(), "partial_provision");
        assert_eq!(
            err.to_string(),
            "account created, role assignment failed"
        );
        assert_ne!(err.code(), AppError::Store(StoreError::Query("x".into())).code());
    }

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
