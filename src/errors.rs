use actix_web::{
    error,
    http::StatusCode,
    HttpResponse,
};
use derive_more::{Display, Error};
use log::error;
use serde::Serialize;

#[derive(Debug, Display, Error, Serialize, PartialEq, Eq, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    #[display(fmt = "internal error")]
    InternalError,

    #[display(fmt = "bad request")]
    BadClientData,

    #[display(fmt = "validation error: {}", reason)]
    Validation { reason: String },

    #[display(fmt = "{} not found", entity)]
    NotFound { entity: String },

    #[display(fmt = "permission denied")]
    PermissionDenied,

    #[display(fmt = "conflict: {}", reason)]
    Conflict { reason: String },

    #[display(fmt = "authentication error")]
    AuthError,

    #[display(fmt = "token decoding error")]
    DecodeError,

    #[display(fmt = "unauthorized")]
    Unauthorized,
}

impl ApiError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ApiError::Validation { reason: reason.into() }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        ApiError::NotFound { entity: entity.into() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        ApiError::Conflict { reason: reason.into() }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadClientData => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::AuthError => StatusCode::UNAUTHORIZED,
            ApiError::DecodeError => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("record"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::conflict("a record with this name already exists")
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ApiError::conflict("the record is referenced by other records")
            }
            _ => {
                error!("[{} : {}] database error: {:?}", file!(), line!(), err);
                ApiError::InternalError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, ResponseError};

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("event").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::not_found("record")
        );
    }

    #[actix_rt::test]
    async fn error_body_is_json_message() {
        let resp = ApiError::not_found("event").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "event not found");
    }
}
