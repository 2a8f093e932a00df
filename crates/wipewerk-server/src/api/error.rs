// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping from domain errors to JSON error responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use wipewerk_core::WipewerkError;

/// Error returned by every handler; renders as
/// `{"success": false, "error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub WipewerkError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            WipewerkError::Validation(_) | WipewerkError::Conflict(_) => StatusCode::BAD_REQUEST,
            WipewerkError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WipewerkError> for ApiError {
    fn from(err: WipewerkError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WipewerkError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(WipewerkError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_error_kind() {
        let status = |e: WipewerkError| ApiError(e).status();
        assert_eq!(status(WipewerkError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(WipewerkError::Conflict("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(WipewerkError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(WipewerkError::Integrity("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
