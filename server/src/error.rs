use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("You are not signed in!")]
    Unauthenticated,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    InvalidInput(String),

    #[error("No donation code is available right now.")]
    PoolExhausted,

    #[error("internal error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthenticated | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::PoolExhausted | AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage detail stays in the logs, never in the response body.
        let message = match &self {
            AppError::Store(err) => {
                error!("storage failure: {err}");
                "An internal server error occurred.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
