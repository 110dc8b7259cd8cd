use axum::{Form, Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::validate_request;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub message: &'static str,
}

/// ユーザー登録ハンドラー
///
/// POST /users
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Form(request): Form<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    // バリデーション
    validate_request(&request)?;

    // 重複メールアドレスは AppError::AlreadyRegistered (409)
    let user = state
        .auth_service
        .register(&request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            message: "user created",
        }),
    ))
}
