use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::scheme::session_cookie;
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// ユーザーのメールアドレス
    #[serde(default)]
    pub email: String,
    /// ユーザーのパスワード
    #[serde(default)]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

/// ログインハンドラー
///
/// POST /sessions
///
/// 処理フロー:
/// 1. メールアドレス・パスワード検証（不一致は 401）
/// 2. セッション作成（既存セッションは無効化）
/// 3. セッショントークンを Cookie に設定
pub async fn login(
    State(state): State<AppState>,
    Form(request): Form<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .auth_service
        .validate_login(&request.email, &request.password)
        .await
    {
        return Err(AppError::Authentication);
    }

    let token = state.auth_service.create_session(&request.email).await?;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        state.config.session_name, token
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            email: request.email,
            message: "logged in",
        }),
    ))
}

/// ログアウトハンドラー
///
/// DELETE /sessions
///
/// 有効なセッション Cookie がなければ 403
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = session_cookie(&headers, &state.config.session_name);
    let user = state
        .auth_service
        .resolve_session(token.as_deref())
        .await?
        .ok_or(AppError::Forbidden)?;

    state.auth_service.destroy_session(user.id).await?;

    // Cookie も失効させる
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        state.config.session_name
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LogoutResponse {
            message: "Bienvenue",
        }),
    ))
}
