use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::require_auth;
use crate::services::scheme::{authorization_header, session_cookie};
use crate::state::AppState;

/// 認証ゲートミドルウェア
///
/// 除外パス以外では設定された認証方式でユーザーを解決する。
/// - Authorization ヘッダーもセッション Cookie もない: 401
/// - いずれかがあるがユーザーを解決できない: 403（方式違いの資格情報を含む）
/// - 成功: リクエスト拡張に User を格納
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    if !require_auth(Some(path), &state.config.excluded_paths) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    if authorization_header(headers).is_none()
        && session_cookie(headers, &state.config.session_name).is_none()
    {
        tracing::debug!(path = %request.uri().path(), "資格情報なし");
        return Err(AppError::Authentication);
    }

    let user = state
        .auth_scheme
        .resolve_identity(&state.auth_service, request.headers())
        .await?
        .ok_or_else(|| {
            tracing::warn!(path = %request.uri().path(), "資格情報が無効");
            AppError::Forbidden
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
