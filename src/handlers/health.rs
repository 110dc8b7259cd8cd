use axum::Json;
use serde::Serialize;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
///
/// サービスの稼働状況を返す。
/// ロードバランサーやモニタリングツールから呼び出される。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Bienvenue",
    })
}
