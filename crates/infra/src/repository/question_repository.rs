//! # QuestionRepository
//!
//! 質問の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **スラッグの一意性**: `questions_slug_key` 一意制約違反は `Conflict`
//! - **タグ**: `TEXT[]` 列に保存し、`$1 = ANY(tags)` で検索する
//! - **スコア**: 投票と同じトランザクション内で `score = score + delta` する
//! - **一覧**: すべて新しい順（`created_at DESC`）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forum_domain::{
    question::{
        Question,
        QuestionBody,
        QuestionId,
        QuestionRecord,
        QuestionTitle,
        Slug,
        Tags,
    },
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 質問リポジトリトレイト
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// 新規質問を作成する（スラッグ重複は `Conflict`）
    async fn insert(&self, tx: &mut TxContext, question: &Question) -> Result<(), InfraError>;

    /// タイトル・スラッグ・本文・タグを更新する（スラッグ重複は `Conflict`）
    async fn update(&self, tx: &mut TxContext, question: &Question) -> Result<(), InfraError>;

    /// 質問を削除する
    async fn delete(&self, tx: &mut TxContext, id: &QuestionId) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &QuestionId) -> Result<Option<Question>, InfraError>;

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Question>, InfraError>;

    /// トランザクション内で質問を行ロック付きで取得する
    ///
    /// 同じ質問への投票・ベストアンサー選択はこのロックで直列化される。
    async fn find_for_update(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<Option<Question>, InfraError>;

    /// 新しい順に全件取得する
    async fn find_latest(&self) -> Result<Vec<Question>, InfraError>;

    /// 指定ユーザーの質問を新しい順に取得する
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Question>, InfraError>;

    /// 指定タグを持つ質問を新しい順に取得する
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Question>, InfraError>;

    /// 閲覧数を 1 増やす
    async fn increment_view_count(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<(), InfraError>;

    /// キャッシュされたスコアに `delta` を加算する
    async fn adjust_score(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
        delta: i64,
    ) -> Result<(), InfraError>;
}

/// DB の questions テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id:         Uuid,
    user_id:    Uuid,
    title:      String,
    slug:       String,
    body:       String,
    tags:       Vec<String>,
    view_count: i64,
    score:      i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = InfraError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question::from_db(QuestionRecord {
            id:         QuestionId::from_uuid(row.id),
            user_id:    UserId::from_uuid(row.user_id),
            title:      QuestionTitle::new(row.title)?,
            slug:       Slug::from_string(row.slug),
            body:       QuestionBody::new(row.body)?,
            tags:       Tags::from_vec(row.tags),
            view_count: row.view_count,
            score:      row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

fn into_questions(rows: Vec<QuestionRow>) -> Result<Vec<Question>, InfraError> {
    rows.into_iter().map(Question::try_from).collect()
}

/// PostgreSQL 実装の QuestionRepository
#[derive(Debug, Clone)]
pub struct PostgresQuestionRepository {
    pool: PgPool,
}

impl PostgresQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionRepository for PostgresQuestionRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(question_id = %question.id()))]
    async fn insert(&self, tx: &mut TxContext, question: &Question) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO questions (
                id, user_id, title, slug, body, tags,
                view_count, score, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(question.id().as_uuid())
        .bind(question.user_id().as_uuid())
        .bind(question.title().as_str())
        .bind(question.slug().as_str())
        .bind(question.body().as_str())
        .bind(question.tags().as_slice())
        .bind(question.view_count())
        .bind(question.score())
        .bind(question.created_at())
        .bind(question.updated_at())
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_write(e, "Question", question.slug().as_str()))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(question_id = %question.id()))]
    async fn update(&self, tx: &mut TxContext, question: &Question) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE questions
            SET title = $2, slug = $3, body = $4, tags = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(question.id().as_uuid())
        .bind(question.title().as_str())
        .bind(question.slug().as_str())
        .bind(question.body().as_str())
        .bind(question.tags().as_slice())
        .bind(question.updated_at())
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_write(e, "Question", question.slug().as_str()))?;

        Ok(())
    }

    async fn delete(&self, tx: &mut TxContext, id: &QuestionId) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &QuestionId) -> Result<Option<Question>, InfraError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Question>, InfraError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            WHERE slug = $1
            "#,
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn find_for_update(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<Option<Question>, InfraError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(tx.conn())
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn find_latest(&self) -> Result<Vec<Question>, InfraError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        into_questions(rows)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Question>, InfraError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        into_questions(rows)
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Question>, InfraError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, user_id, title, slug, body, tags, view_count, score, created_at, updated_at
            FROM questions
            WHERE $1 = ANY(tags)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;

        into_questions(rows)
    }

    async fn increment_view_count(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<(), InfraError> {
        sqlx::query("UPDATE questions SET view_count = view_count + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn adjust_score(
        &self,
        tx: &mut TxContext,
        id: &QuestionId,
        delta: i64,
    ) -> Result<(), InfraError> {
        sqlx::query("UPDATE questions SET score = score + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(delta)
            .execute(tx.conn())
            .await?;

        Ok(())
    }
}
