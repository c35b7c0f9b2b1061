//! HTTP error mapping

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use crate::{Error, FieldIssue};

/// Body of every JSON error: `{"detail": "..."}`, or a list of field issues for 422.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: Value,
}

/// Error returned by handlers; wraps the crate error and extractor rejections.
#[derive(Debug)]
pub struct ApiError(pub Error);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(vec![malformed("body", rejection.body_text())]))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError(Error::Validation(vec![malformed("form", rejection.body_text())]))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::Validation(vec![malformed("query", rejection.body_text())]))
    }
}

fn malformed(location: &str, msg: String) -> FieldIssue {
    FieldIssue {
        kind: "value_error",
        loc: vec![location.to_string()],
        msg,
        input: None,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Storage(_) | Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            Error::Validation(issues) => json!(issues),
            Error::Storage(_) | Error::Io(_) | Error::Json(_) => {
                tracing::error!(error = %self.0, "Request failed");
                json!("Internal server error")
            }
            other => json!(other.to_string()),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
