use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::token::{InvalidToken, IssueError};

#[derive(Debug)]
pub enum AppError {
    Sqlx(sqlx::Error),
    PasswordHash(argon2::password_hash::Error),
    TokenIssue(IssueError),
    Join(tokio::task::JoinError),
    InvalidToken(InvalidToken),
    Unauthorized,
    LoginFail,
    Forbidden,
    NotFound(String),
    Conflict(String),
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(inner: sqlx::Error) -> Self {
        AppError::Sqlx(inner)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(inner)
    }
}

impl From<IssueError> for AppError {
    fn from(inner: IssueError) -> Self {
        AppError::TokenIssue(inner)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(inner: tokio::task::JoinError) -> Self {
        AppError::Join(inner)
    }
}

impl From<InvalidToken> for AppError {
    fn from(inner: InvalidToken) -> Self {
        AppError::InvalidToken(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Sqlx(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            AppError::Sqlx(_)
            | AppError::PasswordHash(_)
            | AppError::TokenIssue(_)
            | AppError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidToken(_) | AppError::Unauthorized | AppError::LoginFail => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            AppError::Sqlx(e) => {
                if is_unique_violation(&e) {
                    "Resource already exists".to_string()
                } else {
                    tracing::error!("Database error: {}", e);
                    "Internal server error".to_string()
                }
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                "Internal server error".to_string()
            }
            AppError::TokenIssue(e) => {
                tracing::error!("Token issue error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Join(e) => {
                tracing::error!("Blocking task failed: {}", e);
                "Internal server error".to_string()
            }
            AppError::InvalidToken(reason) => {
                tracing::debug!("Rejected token: {}", reason);
                "Could not validate credentials".to_string()
            }
            AppError::Unauthorized => "Could not validate credentials".to_string(),
            AppError::LoginFail => "Invalid credentials".to_string(),
            AppError::Forbidden => "Not allowed to access this resource".to_string(),
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => msg,
        };

        let body = Json(json!({
            "detail": detail,
        }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn login_fail_and_expired_token_are_401() {
        assert_eq!(AppError::LoginFail.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidToken(InvalidToken::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn store_errors_are_500_without_challenge() {
        let response = AppError::Sqlx(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn token_issue_failure_is_500() {
        assert_eq!(
            AppError::TokenIssue(IssueError::TtlOutOfRange).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ownership_errors_map_to_403_and_404() {
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("Todo with ID: 3 not found".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
