use base64::{Engine as _, engine::general_purpose::STANDARD};
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::User;
use crate::services::auth::AuthService;

/// 認証方式の種類（設定値 AUTH_TYPE）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Basic,
    #[default]
    Session,
}

/// リクエストの資格情報からユーザーを特定する認証方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Basic base64(email:password)`
    Basic,
    /// Cookie に載せたセッショントークン
    Session { cookie_name: String },
}

impl AuthScheme {
    pub fn new(auth_type: AuthType, cookie_name: &str) -> Self {
        match auth_type {
            AuthType::Basic => Self::Basic,
            AuthType::Session => Self::Session {
                cookie_name: cookie_name.to_string(),
            },
        }
    }

    /// リクエストヘッダーからユーザーを解決
    ///
    /// 資格情報の欠落・形式不正・不一致はすべて `None`
    pub async fn resolve_identity(
        &self,
        auth_service: &AuthService,
        headers: &HeaderMap,
    ) -> Result<Option<User>, AppError> {
        match self {
            Self::Basic => {
                let Some((email, password)) = authorization_header(headers)
                    .and_then(extract_base64_credentials)
                    .and_then(decode_base64_credentials)
                    .and_then(|decoded| split_credentials(&decoded))
                else {
                    return Ok(None);
                };

                if !auth_service.validate_login(&email, &password).await {
                    return Ok(None);
                }
                auth_service.find_by_email(&email).await
            }
            Self::Session { cookie_name } => {
                let token = session_cookie(headers, cookie_name);
                auth_service.resolve_session(token.as_deref()).await
            }
        }
    }
}

/// 認証が必要なパスか判定
///
/// - `excluded_paths` の末尾 `*` は前方一致、それ以外は末尾スラッシュを揃えて完全一致
/// - 除外リストが空なら常に認証必須
pub fn require_auth(path: Option<&str>, excluded_paths: &[String]) -> bool {
    let Some(path) = path else {
        return true;
    };
    if excluded_paths.is_empty() {
        return true;
    }

    let path = with_trailing_slash(path);
    !excluded_paths.iter().any(|excluded| match excluded.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => path == with_trailing_slash(excluded),
    })
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Authorization ヘッダーの値
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// `Basic ` 以降のBase64部分を取り出す
fn extract_base64_credentials(header: &str) -> Option<&str> {
    header.strip_prefix("Basic ")
}

/// Base64をデコードしてUTF-8文字列にする
fn decode_base64_credentials(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// 最初の `:` で email / password に分割（パスワードは `:` を含み得る）
fn split_credentials(decoded: &str) -> Option<(String, String)> {
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

/// Cookie ヘッダーから指定名の値を取り出す
pub fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
}
