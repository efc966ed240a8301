use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bankroll::application::LedgerError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// エラーレスポンスのボディ `{ "error": "<message>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::CustomerNotFound
            | LedgerError::DuplicateCustomer
            | LedgerError::InsufficientFunds
            | LedgerError::AmountOutOfRange => Self::bad_request(value.to_string()),
            LedgerError::Customer(_) | LedgerError::DataAccess(_) => {
                error!("台帳エラー: {}", value);
                Self::internal_error()
            }
        }
    }
}
