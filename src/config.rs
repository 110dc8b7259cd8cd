use secrecy::SecretBox;
use serde::Deserialize;

use crate::services::AuthType;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: SecretBox<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // セッション設定
    /// セッショントークンを載せる Cookie 名
    #[serde(default = "default_session_name")]
    pub session_name: String,
    /// 保護ルートで使う認証方式（basic / session）
    #[serde(default)]
    pub auth_type: AuthType,
    /// 認証不要パス（カンマ区切り、末尾 `*` で前方一致）
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    // パスワードハッシュ設定（argon2id）
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

const DEFAULT_DATABASE_URL: &str = "sqlite://credgate.db?mode=rwc";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SESSION_NAME: &str = "session_id";
const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/",
    "/api/health/",
    "/users/",
    "/sessions/",
    "/profile/",
    "/reset_password/",
];
const DEFAULT_ARGON2_MEMORY_KIB: u32 = argon2::Params::DEFAULT_M_COST;
const DEFAULT_ARGON2_ITERATIONS: u32 = argon2::Params::DEFAULT_T_COST;
const DEFAULT_ARGON2_PARALLELISM: u32 = argon2::Params::DEFAULT_P_COST;

fn default_database_url() -> SecretBox<String> {
    SecretBox::new(Box::new(DEFAULT_DATABASE_URL.to_string()))
}

fn default_db_max_connections() -> u32 {
    DEFAULT_DB_MAX_CONNECTIONS
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

fn default_excluded_paths() -> Vec<String> {
    DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect()
}

fn default_argon2_memory_kib() -> u32 {
    DEFAULT_ARGON2_MEMORY_KIB
}

fn default_argon2_iterations() -> u32 {
    DEFAULT_ARGON2_ITERATIONS
}

fn default_argon2_parallelism() -> u32 {
    DEFAULT_ARGON2_PARALLELISM
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// 環境変数の代わりに任意のキー・値から読み込む
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
