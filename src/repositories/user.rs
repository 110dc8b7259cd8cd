use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{LookupField, User, UserUpdate};

const USER_COLUMNS: &str =
    "id, email, password_hash, session_token, reset_token, created_at, updated_at";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BLOB PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    session_token TEXT UNIQUE,
    reset_token TEXT UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// リポジトリ層のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("このメールアドレスは既に登録されています")]
    DuplicateEmail,

    #[error("ユーザーが見つかりません")]
    NotFound,

    /// 一意であるべきカラムで複数行がヒットした（不変条件違反）
    #[error("{column} が複数のユーザーに一致しました")]
    MultipleMatches { column: &'static str },

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// users テーブルを作成（存在する場合は何もしない）
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// 新しいユーザーを作成
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `StoreError::DuplicateEmail`
    ///   存在確認とINSERTを分けず、制約で原子的に判定する
    pub async fn add(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                    && db_err.message().contains("users.email")
                {
                    return StoreError::DuplicateEmail;
                }
                StoreError::Database(e)
            })
    }

    /// 指定カラムの値でユーザーを一意に検索
    ///
    /// # Errors
    /// - 0件: `StoreError::NotFound`
    /// - 2件以上: `StoreError::MultipleMatches`
    pub async fn find_by(&self, field: LookupField, value: &str) -> Result<User, StoreError> {
        let column = field.column();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ? LIMIT 2");

        let mut users = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        match users.len() {
            0 => Err(StoreError::NotFound),
            1 => Ok(users.remove(0)),
            _ => {
                tracing::error!(column, "一意カラムで複数ユーザーが一致");
                Err(StoreError::MultipleMatches { column })
            }
        }
    }

    /// ユーザーを部分更新
    ///
    /// 単一のUPDATE文で適用するため、途中状態が他の検索から見えることはない
    ///
    /// # Note
    /// password_hash・トークンはログに出力しないこと
    pub async fn update(&self, user_id: Uuid, changes: UserUpdate) -> Result<(), StoreError> {
        self.apply_update(user_id, None, changes).await
    }

    /// 指定カラムが期待値のままの場合のみ部分更新
    ///
    /// 検索と更新の間に値が変わっていれば `StoreError::NotFound`。
    /// リセットトークンの使用など、一度だけ成功すべき更新に使う
    pub async fn update_if(
        &self,
        user_id: Uuid,
        guard: LookupField,
        expected: &str,
        changes: UserUpdate,
    ) -> Result<(), StoreError> {
        self.apply_update(user_id, Some((guard, expected)), changes)
            .await
    }

    async fn apply_update(
        &self,
        user_id: Uuid,
        guard: Option<(LookupField, &str)>,
        changes: UserUpdate,
    ) -> Result<(), StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        builder.push_bind(OffsetDateTime::now_utc());

        if let Some(password_hash) = changes.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(session_token) = changes.session_token {
            builder.push(", session_token = ").push_bind(session_token);
        }
        if let Some(reset_token) = changes.reset_token {
            builder.push(", reset_token = ").push_bind(reset_token);
        }

        builder.push(" WHERE id = ").push_bind(user_id);
        if let Some((field, expected)) = guard {
            builder
                .push(format!(" AND {} = ", field.column()))
                .push_bind(expected.to_string());
        }

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
