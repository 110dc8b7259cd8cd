use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ユーザーレコード
///
/// session_token / reset_token はSHA256ダイジェストで保存される
/// 平文トークンは発行時に呼び出し側へ返すのみ
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub session_token: Option<String>,
    #[serde(skip)]
    pub reset_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// 一意検索に使えるカラム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    Email,
    SessionToken,
    ResetToken,
}

impl LookupField {
    /// 対応するカラム名（SQLに直接埋め込むため固定文字列のみ）
    pub fn column(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::SessionToken => "session_token",
            Self::ResetToken => "reset_token",
        }
    }
}

/// ユーザーの部分更新
///
/// `None` は「変更しない」、`Some(None)` は「NULLにクリア」
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub password_hash: Option<String>,
    pub session_token: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn session_token(token: Option<String>) -> Self {
        Self {
            session_token: Some(token),
            ..Self::default()
        }
    }

    pub fn reset_token(token: Option<String>) -> Self {
        Self {
            reset_token: Some(token),
            ..Self::default()
        }
    }

    /// パスワード更新とリセットトークン消去を同時に行う
    pub fn password_reset(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            reset_token: Some(None),
            ..Self::default()
        }
    }
}
