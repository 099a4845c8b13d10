use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(
        "Impossible to create a database entry for entity '{entity}' \
         (entity_data='{data}', reason='{reason}')"
    )]
    CreationFailure {
        entity: &'static str,
        data: String,
        reason: String,
    },

    #[error("Impossible to obtain entity '{entity}' (reason='{reason}')")]
    EntityNotFound { entity: &'static str, reason: String },

    #[error("User not authorized to access data related with organization {0}")]
    ForbiddenOrganization(i32),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    #[error("Missing required role: {0}")]
    RoleMissing(String),

    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// TMF-standard error body. Only `code` and `reason` are mandatory;
/// the remaining keys are emitted when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "referenceError", skip_serializing_if = "Option::is_none")]
    pub reference_error: Option<String>,
    #[serde(rename = "@baseType", skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(rename = "@schemaLocation", skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            reason: reason.into(),
            message: None,
            status: None,
            reference_error: None,
            base_type: None,
            schema_location: None,
            schema_type: None,
        }
    }
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::CreationFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::EntityNotFound { .. } => StatusCode::BAD_REQUEST,
            ServerError::ForbiddenOrganization(_) => StatusCode::FORBIDDEN,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::AuthRequired => StatusCode::UNAUTHORIZED,
            ServerError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ServerError::RoleMissing(_) => StatusCode::FORBIDDEN,
            ServerError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        let status = self.status_code();
        let envelope = ErrorEnvelope::new(status, self.to_string());
        (status, Json(envelope)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ServerError::EntityNotFound {
            entity: "Organization",
            reason: "Organization with id=3 doesn't exist".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("id=3"));

        assert_eq!(
            ServerError::ForbiddenOrganization(7).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::AuthRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_envelope_skips_unset_keys() {
        let envelope = ErrorEnvelope::new(StatusCode::BAD_REQUEST, "bad input");
        let json = serde_json::to_value(&envelope).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["code"], 400);
        assert_eq!(obj["reason"], "bad input");
    }
}
