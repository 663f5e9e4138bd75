//! Error types for the administration core

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::report::PartialFailure;

/// Result type alias for administration operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Message shown to users when a collaborator call failed unexpectedly
pub const GENERIC_FAILURE_MESSAGE: &str = "The operation failed. Please try again.";

/// Administration error types
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Area not found: {0}")]
    AreaNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// A role-transition rule rejected the candidate
    #[error("{reason}")]
    RoleRejected { reason: String },

    #[error("Company '{company}' still owns {count} area(s) and cannot be deleted")]
    CompanyHasAreas { company: String, count: usize },

    #[error("Users cannot be moved from company '{from}' to '{to}' directly; reset them to NoAccess first")]
    CrossCompanyMove { from: String, to: String },

    #[error("Permission denied: {action}")]
    PermissionDenied { action: String },

    #[error("An operation on {key} is already running")]
    OperationInProgress { key: String },

    /// The store refused a create because the item already exists (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Operation '{}' failed at step '{}'", .0.operation, .0.failed_step)]
    PartialFailure(Box<PartialFailure>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Serialization(err.to_string())
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AdminError {
    pub fn role_rejected(reason: impl Into<String>) -> Self {
        AdminError::RoleRejected {
            reason: reason.into(),
        }
    }

    /// Convert to API error code
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            AdminError::AreaNotFound(_) => "AREA_NOT_FOUND",
            AdminError::UserNotFound(_) => "USER_NOT_FOUND",
            AdminError::FolderNotFound(_) => "FOLDER_NOT_FOUND",
            AdminError::RoleRejected { .. } => "ROLE_REJECTED",
            AdminError::CompanyHasAreas { .. } => "COMPANY_HAS_AREAS",
            AdminError::CrossCompanyMove { .. } => "CROSS_COMPANY_MOVE",
            AdminError::PermissionDenied { .. } => "PERMISSION_DENIED",
            AdminError::OperationInProgress { .. } => "OPERATION_IN_PROGRESS",
            AdminError::Conflict(_) => "CONFLICT",
            AdminError::PartialFailure(_) => "PARTIAL_FAILURE",
            AdminError::Validation(_) => "VALIDATION_ERROR",
            AdminError::Unauthorized => "UNAUTHORIZED",
            AdminError::Transport(_) => "TRANSPORT_ERROR",
            AdminError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AdminError::Serialization(_) => "SERIALIZATION_ERROR",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::CompanyNotFound(_)
            | AdminError::AreaNotFound(_)
            | AdminError::UserNotFound(_)
            | AdminError::FolderNotFound(_) => StatusCode::NOT_FOUND,

            AdminError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            AdminError::Unauthorized => StatusCode::UNAUTHORIZED,

            AdminError::Conflict(_) | AdminError::OperationInProgress { .. } => {
                StatusCode::CONFLICT
            }

            AdminError::RoleRejected { .. }
            | AdminError::CompanyHasAreas { .. }
            | AdminError::CrossCompanyMove { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            AdminError::Validation(_) => StatusCode::BAD_REQUEST,

            AdminError::Transport(_) | AdminError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,

            AdminError::PartialFailure(_)
            | AdminError::Serialization(_)
            | AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is meant to be shown to the user verbatim
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            AdminError::Transport(_)
                | AdminError::MalformedResponse(_)
                | AdminError::Serialization(_)
                | AdminError::Internal(_)
                | AdminError::Conflict(_)
        )
    }

    /// Message suitable for the UI. Transport and unexpected failures collapse
    /// into a generic message; the detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            AdminError::PartialFailure(failure) => failure.user_message(),
            err if err.is_user_facing() => err.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if !self.is_user_facing() || matches!(self, AdminError::PartialFailure(_)) {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let details = match &self {
            AdminError::PartialFailure(failure) => serde_json::to_value(failure.as_ref()).ok(),
            _ => None,
        };
        let body = ApiError {
            code: self.code().to_string(),
            message: self.user_message(),
            details,
        };

        (status, axum::Json(body)).into_response()
    }
}
