use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::export::ExportError;
use crate::repo::RepoError;
use crate::storage::BlobStoreError;
use crate::validate::FieldErrors;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("not found")] NotFound,
    #[error("bad request: {0}")] BadRequest(String),
    #[error("validation failed")] Validation(FieldErrors),
    #[error("payload too large")] PayloadTooLarge,
    #[error("export unavailable: {0}")] ExportUnavailable(String),
    #[error("internal error")] Internal,
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::NotFound,
            RepoError::Poisoned => {
                error!("repository lock poisoned");
                ApiError::Internal
            }
        }
    }
}

impl From<BlobStoreError> for ApiError {
    fn from(e: BlobStoreError) -> Self {
        match e {
            BlobStoreError::NotFound => ApiError::NotFound,
            BlobStoreError::Other(msg) => {
                error!("blob store error: {msg}");
                ApiError::Internal
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Font { .. } => ApiError::ExportUnavailable(e.to_string()),
            other => {
                error!("export failed: {other}");
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ExportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let fields = match self {
            ApiError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };
        HttpResponse::build(status).json(ApiErrorBody { error: self.to_string(), fields })
    }
}
