use uuid::Uuid;

use crate::error::AppError;
use crate::models::{LookupField, User, UserUpdate};
use crate::repositories::{StoreError, UserRepository};
use crate::services::password::PasswordHasher;
use crate::services::token::{generate_token, hash_token};

/// 認証サービス
///
/// 登録・ログイン検証・セッション・パスワードリセットの状態遷移を扱う。
/// 状態はすべて UserRepository 側に保存し、このサービス自体は状態を持たない。
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    hasher: PasswordHasher,
    /// タイミング攻撃対策用のダミーハッシュ
    dummy_hash: String,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(user_repo: UserRepository, hasher: PasswordHasher) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(&generate_token())?;
        Ok(Self {
            user_repo,
            hasher,
            dummy_hash,
        })
    }

    /// ユーザー登録
    ///
    /// # Errors
    /// - 既存メールアドレス: `AppError::AlreadyRegistered`
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        let password_hash = self.hasher.hash(password)?;

        let user = self
            .user_repo
            .add(email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail => AppError::AlreadyRegistered,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, email = %email, "ユーザー登録成功");
        Ok(user)
    }

    /// ログイン情報を検証
    ///
    /// ユーザー不在・パスワード不一致・内部エラーのいずれも `false` を返す。
    /// ユーザー不在時もダミー検証を行い、応答時間から存在有無を推測させない
    pub async fn validate_login(&self, email: &str, password: &str) -> bool {
        let user = match self.user_repo.find_by(LookupField::Email, email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                let _ = self.hasher.verify(password, &self.dummy_hash);
                tracing::warn!(email = %email, "認証失敗: ユーザー不在");
                return false;
            }
            Err(e) => {
                tracing::error!(error = ?e, email = %email, "ログイン検証中のユーザー検索エラー");
                return false;
            }
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => {
                tracing::info!(user_id = %user.id, "認証成功");
                true
            }
            Ok(false) => {
                tracing::warn!(user_id = %user.id, "認証失敗: パスワード不一致");
                false
            }
            Err(_) => false,
        }
    }

    /// セッションを作成し、平文のセッショントークンを返す
    ///
    /// 既存セッションは上書きされる（1ユーザー1セッション）
    ///
    /// # Errors
    /// - ユーザー不在: `AppError::NoSuchUser`（validate_login 成功後のため内部不整合）
    pub async fn create_session(&self, email: &str) -> Result<String, AppError> {
        let user = self.find_user(LookupField::Email, email).await?.ok_or_else(|| {
            tracing::error!(email = %email, "セッション作成対象のユーザーが存在しない");
            AppError::NoSuchUser
        })?;

        let token = generate_token();
        self.user_repo
            .update(user.id, UserUpdate::session_token(Some(hash_token(&token))))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AppError::NoSuchUser,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "セッション作成");
        Ok(token)
    }

    /// セッショントークンからユーザーを取得
    ///
    /// トークンが空・未発行・破棄済みのいずれも `None`
    pub async fn resolve_session(&self, token: Option<&str>) -> Result<Option<User>, AppError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        self.find_user(LookupField::SessionToken, &hash_token(token))
            .await
    }

    /// セッションを破棄
    ///
    /// 既にセッションがない場合やユーザーが存在しない場合もエラーにしない
    pub async fn destroy_session(&self, user_id: Uuid) -> Result<(), AppError> {
        match self
            .user_repo
            .update(user_id, UserUpdate::session_token(None))
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "セッション破棄");
                Ok(())
            }
            Err(StoreError::NotFound) => {
                tracing::debug!(user_id = %user_id, "セッション破棄: ユーザー不在");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// パスワードリセットトークンを発行し、平文トークンを返す
    ///
    /// 既存のリセットトークンは上書きされる
    ///
    /// # Errors
    /// - 未登録メールアドレス: `AppError::UnknownEmail`
    pub async fn issue_reset_token(&self, email: &str) -> Result<String, AppError> {
        let user = self
            .find_user(LookupField::Email, email)
            .await?
            .ok_or_else(|| {
                tracing::info!(email = %email, "パスワードリセット: 未登録メールアドレス");
                AppError::UnknownEmail
            })?;

        let token = generate_token();
        self.user_repo
            .update(user.id, UserUpdate::reset_token(Some(hash_token(&token))))
            .await?;

        tracing::info!(user_id = %user.id, "パスワードリセットトークン発行");
        Ok(token)
    }

    /// リセットトークンを使ってパスワードを更新
    ///
    /// 新しいパスワードハッシュの設定とトークンの消去は同一UPDATEで行い、
    /// トークンが検索時のまま残っている場合のみ適用する（一度だけ成功する）
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    ///
    /// # Errors
    /// - トークン不一致・使用済み: `AppError::InvalidResetToken`
    pub async fn redeem_reset_token(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::InvalidResetToken);
        }

        let token_hash = hash_token(token);
        let user = self
            .find_user(LookupField::ResetToken, &token_hash)
            .await?
            .ok_or_else(|| {
                tracing::warn!("無効なリセットトークン");
                AppError::InvalidResetToken
            })?;

        let password_hash = self.hasher.hash(new_password)?;
        self.user_repo
            .update_if(
                user.id,
                LookupField::ResetToken,
                &token_hash,
                UserUpdate::password_reset(password_hash),
            )
            .await
            .map_err(|e| match e {
                StoreError::NotFound => {
                    tracing::warn!(user_id = %user.id, "リセットトークンは既に使用済み");
                    AppError::InvalidResetToken
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "パスワードリセット完了");
        Ok(())
    }

    /// メールアドレスでユーザーを取得
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_user(LookupField::Email, email).await
    }

    /// 一意カラムで検索し、0件を `None` に畳み込む
    async fn find_user(&self, field: LookupField, value: &str) -> Result<Option<User>, AppError> {
        match self.user_repo.find_by(field, value).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repositories::testing::memory_repo;

    pub(crate) async fn test_service() -> AuthService {
        let hasher = PasswordHasher::new(64, 1, 1).unwrap();
        AuthService::new(memory_repo().await, hasher).unwrap()
    }

    #[tokio::test]
    async fn test_register_distinct_emails() {
        let service = test_service().await;
        let a = service.register("a@x.com", "pw1").await.unwrap();
        let b = service.register("b@x.com", "pw1").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.password_hash, "pw1");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        let result = service.register("a@x.com", "pw2").await;
        assert!(matches!(result, Err(AppError::AlreadyRegistered)));

        // 元のパスワードは変わらない
        assert!(service.validate_login("a@x.com", "pw1").await);
        assert!(!service.validate_login("a@x.com", "pw2").await);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let service = test_service().await;
        let (first, second) = tokio::join!(
            service.register("a@x.com", "pw1"),
            service.register("a@x.com", "pw2"),
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
        assert!(
            matches!(first, Err(AppError::AlreadyRegistered))
                || matches!(second, Err(AppError::AlreadyRegistered))
        );
    }

    #[tokio::test]
    async fn test_concurrent_reset_token_redemption() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();
        let token = service.issue_reset_token("a@x.com").await.unwrap();

        let (first, second) = tokio::join!(
            service.redeem_reset_token(&token, "pw_a"),
            service.redeem_reset_token(&token, "pw_b"),
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);

        let (winner, loser, failed) = if first.is_ok() {
            ("pw_a", "pw_b", second)
        } else {
            ("pw_b", "pw_a", first)
        };
        assert!(matches!(failed, Err(AppError::InvalidResetToken)));
        assert!(service.validate_login("a@x.com", winner).await);
        assert!(!service.validate_login("a@x.com", loser).await);
        assert!(!service.validate_login("a@x.com", "pw1").await);
    }

    #[tokio::test]
    async fn test_validate_login() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        assert!(service.validate_login("a@x.com", "pw1").await);
        assert!(!service.validate_login("a@x.com", "wrong").await);
        assert!(!service.validate_login("nobody@x.com", "pw1").await);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let service = test_service().await;
        let user = service.register("a@x.com", "pw1").await.unwrap();

        let token = service.create_session("a@x.com").await.unwrap();
        let resolved = service.resolve_session(Some(&token)).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "a@x.com");

        service.destroy_session(user.id).await.unwrap();
        assert!(service.resolve_session(Some(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_token_is_not_stored_in_plaintext() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        let token = service.create_session("a@x.com").await.unwrap();
        let user = service.resolve_session(Some(&token)).await.unwrap().unwrap();
        assert_ne!(user.session_token.as_deref(), Some(token.as_str()));
        assert_eq!(user.session_token, Some(hash_token(&token)));
    }

    #[tokio::test]
    async fn test_second_login_invalidates_first_session() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        let first = service.create_session("a@x.com").await.unwrap();
        let second = service.create_session("a@x.com").await.unwrap();
        assert_ne!(first, second);

        assert!(service.resolve_session(Some(&first)).await.unwrap().is_none());
        assert!(service.resolve_session(Some(&second)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_session_unknown_user() {
        let service = test_service().await;
        let result = service.create_session("nobody@x.com").await;
        assert!(matches!(result, Err(AppError::NoSuchUser)));
    }

    #[tokio::test]
    async fn test_resolve_session_missing_or_empty() {
        let service = test_service().await;
        assert!(service.resolve_session(None).await.unwrap().is_none());
        assert!(service.resolve_session(Some("")).await.unwrap().is_none());
        assert!(service.resolve_session(Some("never-issued")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_session_is_idempotent() {
        let service = test_service().await;
        let user = service.register("a@x.com", "pw1").await.unwrap();

        service.destroy_session(user.id).await.unwrap();
        service.destroy_session(user.id).await.unwrap();
        service.destroy_session(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_reset_token_unknown_email() {
        let service = test_service().await;
        let result = service.issue_reset_token("nobody@x.com").await;
        assert!(matches!(result, Err(AppError::UnknownEmail)));
    }

    #[tokio::test]
    async fn test_reset_token_round_trip() {
        let service = test_service().await;
        service.register("a@x.com", "old_pw").await.unwrap();

        let token = service.issue_reset_token("a@x.com").await.unwrap();
        service.redeem_reset_token(&token, "new_pw").await.unwrap();

        let again = service.redeem_reset_token(&token, "other_pw").await;
        assert!(matches!(again, Err(AppError::InvalidResetToken)));

        assert!(service.validate_login("a@x.com", "new_pw").await);
        assert!(!service.validate_login("a@x.com", "old_pw").await);
    }

    #[tokio::test]
    async fn test_reissued_reset_token_replaces_previous() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        let first = service.issue_reset_token("a@x.com").await.unwrap();
        let second = service.issue_reset_token("a@x.com").await.unwrap();

        let result = service.redeem_reset_token(&first, "pw2").await;
        assert!(matches!(result, Err(AppError::InvalidResetToken)));
        service.redeem_reset_token(&second, "pw2").await.unwrap();
    }

    #[tokio::test]
    async fn test_redeem_invalid_reset_token() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();

        for token in ["", "bogus"] {
            let result = service.redeem_reset_token(token, "pw2").await;
            assert!(matches!(result, Err(AppError::InvalidResetToken)));
        }
        assert!(service.validate_login("a@x.com", "pw1").await);
    }

    #[tokio::test]
    async fn test_reset_does_not_touch_session() {
        let service = test_service().await;
        service.register("a@x.com", "pw1").await.unwrap();
        let session = service.create_session("a@x.com").await.unwrap();

        let token = service.issue_reset_token("a@x.com").await.unwrap();
        assert!(service.resolve_session(Some(&session)).await.unwrap().is_some());

        service.redeem_reset_token(&token, "pw2").await.unwrap();
        assert!(service.resolve_session(Some(&session)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_scenario() {
        let service = test_service().await;

        service.register("a@x.com", "pw1").await.unwrap();
        assert!(!service.validate_login("a@x.com", "wrong").await);

        let s1 = service.create_session("a@x.com").await.unwrap();
        let user = service.resolve_session(Some(&s1)).await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");

        service.destroy_session(user.id).await.unwrap();
        assert!(service.resolve_session(Some(&s1)).await.unwrap().is_none());

        let r1 = service.issue_reset_token("a@x.com").await.unwrap();
        service.redeem_reset_token(&r1, "pw2").await.unwrap();

        assert!(!service.validate_login("a@x.com", "pw1").await);
        assert!(service.validate_login("a@x.com", "pw2").await);
    }
}
