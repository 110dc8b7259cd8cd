use axum::{Form, Json, extract::State};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::validate_request;
use crate::state::AppState;

// === リセットトークン発行 ===

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequestResponse {
    pub email: String,
    pub reset_token: String,
}

/// POST /reset_password
///
/// 空のメールアドレスは 400、未登録メールアドレスは 403（AppError::UnknownEmail）
pub async fn request_password_reset(
    State(state): State<AppState>,
    Form(request): Form<ResetRequestRequest>,
) -> Result<Json<ResetRequestResponse>, AppError> {
    validate_request(&request)?;

    let reset_token = state
        .auth_service
        .issue_reset_token(&request.email)
        .await?;

    Ok(Json(ResetRequestResponse {
        email: request.email,
        reset_token,
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[garde(skip)]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub reset_token: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub email: String,
    pub message: &'static str,
}

/// PUT /reset_password
///
/// # Security
/// - reset_token, new_password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Form(request): Form<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_request(&request)?;

    state
        .auth_service
        .redeem_reset_token(&request.reset_token, &request.new_password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        email: request.email,
        message: "Password updated",
    }))
}
