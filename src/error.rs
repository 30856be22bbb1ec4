use actix_web::{
    HttpResponse,
    body::BoxBody,
    http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::calc::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Turns a unique-key violation into `duplicate()`; other errors stay database errors.
    pub fn on_unique_violation(err: sqlx::Error, duplicate: impl FnOnce() -> ApiError) -> Self {
        if err.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            duplicate()
        } else {
            err.into()
        }
    }
}

/// A driver error as MySQL reports it, for handler tests without a database.
#[cfg(test)]
pub(crate) mod test_db_error {
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{error::Error as StdError, fmt};

    #[derive(Debug)]
    pub struct FakeDbError {
        pub unique: bool,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            if self.unique { "Duplicate entry" } else { "Deadlock found" }
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique { ErrorKind::UniqueViolation } else { ErrorKind::Other }
        }
    }

    pub fn unique_violation() -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { unique: true }))
    }

    pub fn other_db_error() -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { unique: false }))
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();

        let message = match self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .json(json!({
                "success": false,
                "statusCode": status.as_u16(),
                "message": message,
            }))
    }
}

/// Success envelope shared by every handler.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub success: bool,
    pub success_code: u16,
    pub message: String,
}

pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
    respond(StatusCode::OK, data, message)
}

pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
    respond(StatusCode::CREATED, data, message)
}

fn respond<T: Serialize>(status: StatusCode, data: T, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        data,
        success: true,
        success_code: status.as_u16(),
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, body::MessageBody};

    fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().try_into_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = ApiError::from(ValidationError::MissingCategories);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = body_json(err.error_response());
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "rating categories are required");
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(err.error_response());
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn unique_violations_map_to_the_given_error() {
        use super::test_db_error::{other_db_error, unique_violation};

        let err = ApiError::on_unique_violation(unique_violation(), || ApiError::bad_request("taken"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "taken");

        let err = ApiError::on_unique_violation(other_db_error(), || ApiError::bad_request("taken"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_keeps_message() {
        let body = body_json(ApiError::not_found("Employee not found").error_response());
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Employee not found");
    }

    #[test]
    fn success_envelope() {
        let body = body_json(created(json!({"id": 7}), "Saved"));
        assert_eq!(body["success"], true);
        assert_eq!(body["successCode"], 201);
        assert_eq!(body["message"], "Saved");
        assert_eq!(body["data"]["id"], 7);
    }
}
