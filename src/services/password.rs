use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version};

use crate::error::AppError;

/// パスワードハッシュ機能（argon2id）
///
/// ソルト付き・意図的に低速なハッシュ。コストパラメータは設定から与える
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// コストパラメータを指定して作成
    ///
    /// # Arguments
    /// * `memory_kib` - メモリコスト（KiB）
    /// * `iterations` - 反復回数
    /// * `parallelism` - 並列度
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            tracing::error!(error = ?e, "argon2 パラメータが不正");
            AppError::Internal(anyhow::anyhow!("invalid argon2 params"))
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// パスワードをハッシュ化（PHC文字列）
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
                AppError::Internal(anyhow::anyhow!("password hash error"))
            })?;
        Ok(hash.to_string())
    }

    /// パスワードを検証
    ///
    /// ハッシュ文字列自体が壊れている場合のみエラー
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
            AppError::Internal(anyhow::anyhow!("password hash parse error"))
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
