use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserRepository;
use crate::services::{AuthScheme, AuthService, PasswordHasher};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// 起動時に一度だけ構築し、グローバル変数は使わない。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 認証サービス
    pub auth_service: AuthService,
    /// 保護ルートで使う認証方式
    pub auth_scheme: AuthScheme,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: SqlitePool, config: Config) -> Result<Self, AppError> {
        let hasher = PasswordHasher::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )?;
        Self::with_hasher(db_pool, config, hasher)
    }

    /// ハッシュ機能を指定して作成
    pub fn with_hasher(
        db_pool: SqlitePool,
        config: Config,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool);
        let auth_service = AuthService::new(user_repo, hasher)?;
        let auth_scheme = AuthScheme::new(config.auth_type, &config.session_name);

        tracing::info!(auth_scheme = ?auth_scheme, "認証方式を初期化");

        Ok(Self {
            config,
            auth_service,
            auth_scheme,
        })
    }
}
