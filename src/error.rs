use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::repositories::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー")]
    Authentication,

    #[error("アクセスが拒否されました")]
    Forbidden,

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("このメールアドレスは既に登録されています")]
    AlreadyRegistered,

    #[error("登録されていないメールアドレスです")]
    UnknownEmail,

    #[error("無効なリセットトークンです")]
    InvalidResetToken,

    /// ログイン検証後にユーザーが消えている（内部整合性エラー）
    #[error("ユーザーが存在しません")]
    NoSuchUser,
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => Self::Database(e),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Authentication => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            Self::AlreadyRegistered => {
                (StatusCode::CONFLICT, "email already registered".to_string())
            }
            Self::UnknownEmail => (StatusCode::FORBIDDEN, "email not registered".to_string()),
            Self::InvalidResetToken => (StatusCode::FORBIDDEN, "invalid reset token".to_string()),
            Self::NoSuchUser => {
                tracing::error!("セッション作成時にユーザーが存在しない");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Authentication, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (
                AppError::Validation("email missing".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::AlreadyRegistered, StatusCode::CONFLICT),
            (AppError::UnknownEmail, StatusCode::FORBIDDEN),
            (AppError::InvalidResetToken, StatusCode::FORBIDDEN),
            (AppError::NoSuchUser, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_store_error_conversion() {
        let error = AppError::from(StoreError::MultipleMatches {
            column: "session_token",
        });
        assert!(matches!(error, AppError::Internal(_)));

        let error = AppError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(error, AppError::Database(_)));
    }
}
