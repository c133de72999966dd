use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use offer_core::OfferError;
use offer_types::ErrorResponse;
use thiserror::Error;

/// Handler error. Every variant renders as `{ "success": false, "message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Offer(#[from] OfferError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Offer(e) => match e {
                OfferError::Validation(_) | OfferError::CandidateData(_) => StatusCode::BAD_REQUEST,
                OfferError::NotFound(_)
                | OfferError::ProfileNotFound { .. }
                | OfferError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected ({}): {}", status, self);
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
