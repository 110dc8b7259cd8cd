use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::services::scheme::session_cookie;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// GET /profile
///
/// セッション Cookie からユーザーを解決し、メールアドレスを返す
pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, AppError> {
    let token = session_cookie(&headers, &state.config.session_name);
    let user = state
        .auth_service
        .resolve_session(token.as_deref())
        .await?
        .ok_or(AppError::Forbidden)?;

    Ok(Json(ProfileResponse { email: user.email }))
}

/// GET /users/me
///
/// 認証ゲート（require_identity）が設定した User を返す
pub async fn current_user(Extension(user): Extension<User>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        created_at: user.created_at,
    })
}
