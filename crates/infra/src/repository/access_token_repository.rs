//! # AccessTokenRepository
//!
//! ログイン時に発行したアクセストークンを保存する。
//! ログアウトで削除し、ユーザー削除時は外部キーで連鎖削除される。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forum_domain::{
    access_token::{AccessToken, AccessTokenValue},
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    async fn insert(&self, tx: &mut TxContext, token: &AccessToken) -> Result<(), InfraError>;

    /// トークン文字列から発行済みトークンを検索する
    async fn find(&self, token: &AccessTokenValue) -> Result<Option<AccessToken>, InfraError>;

    /// トークンを失効させる（存在しなくてもエラーにしない）
    async fn delete(&self, tx: &mut TxContext, token: &AccessTokenValue)
    -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct AccessTokenRow {
    token:      String,
    user_id:    Uuid,
    created_at: DateTime<Utc>,
}

impl From<AccessTokenRow> for AccessToken {
    fn from(row: AccessTokenRow) -> Self {
        AccessToken::from_db(
            AccessTokenValue::from_string(row.token),
            UserId::from_uuid(row.user_id),
            row.created_at,
        )
    }
}

/// PostgreSQL 実装の AccessTokenRepository
#[derive(Debug, Clone)]
pub struct PostgresAccessTokenRepository {
    pool: PgPool,
}

impl PostgresAccessTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessTokenRepository for PostgresAccessTokenRepository {
    async fn insert(&self, tx: &mut TxContext, token: &AccessToken) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (token, user_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token.token().as_str())
        .bind(token.user_id().as_uuid())
        .bind(token.created_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn find(&self, token: &AccessTokenValue) -> Result<Option<AccessToken>, InfraError> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            SELECT token, user_id, created_at
            FROM access_tokens
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccessToken::from))
    }

    async fn delete(
        &self,
        tx: &mut TxContext,
        token: &AccessTokenValue,
    ) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM access_tokens WHERE token = $1")
            .bind(token.as_str())
            .execute(tx.conn())
            .await?;

        Ok(())
    }
}
