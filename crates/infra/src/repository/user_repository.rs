//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! メールアドレスは `users_email_key` 一意制約で保護され、
//! 重複は `InfraErrorKind::Conflict` として返る。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forum_domain::{
    password::PasswordHash,
    user::{Email, User, UserId, UserName, UserRecord},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 新規ユーザーを作成する
    ///
    /// メールアドレスが重複している場合は `Conflict`。
    async fn insert(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError>;

    /// 表示名・メールアドレス・パスワードハッシュを更新する
    async fn update(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError>;

    /// ID でユーザーを検索
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーを検索
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;
}

/// DB の users テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct UserRow {
    id:            Uuid,
    name:          String,
    email:         String,
    password_hash: String,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::from_db(UserRecord {
            id:            UserId::from_uuid(row.id),
            name:          UserName::new(row.name)?,
            email:         Email::new(row.email)?,
            password_hash: PasswordHash::new(row.password_hash),
            created_at:    row.created_at,
            updated_at:    row.updated_at,
        }))
    }
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn insert(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name().as_str())
        .bind(user.email().as_str())
        .bind(user.password_hash().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_write(e, "User", user.email().as_str()))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user.id()))]
    async fn update(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name().as_str())
        .bind(user.email().as_str())
        .bind(user.password_hash().as_str())
        .bind(user.updated_at())
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_write(e, "User", user.email().as_str()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
