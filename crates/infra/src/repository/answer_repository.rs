//! # AnswerRepository
//!
//! 回答の永続化を担当するリポジトリ。
//!
//! ベストアンサーは `answers_one_best_per_question` 部分一意インデックス
//! （`WHERE best_answer`）で質問ごとに 1 件に制限される。
//! フラグの付け替えは必ず「旧回答のクリア → 新回答のセット」の順で行う。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forum_domain::{
    answer::{Answer, AnswerBody, AnswerId, AnswerRecord},
    question::QuestionId,
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 回答リポジトリトレイト
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn insert(&self, tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError>;

    /// 本文を更新する
    async fn update(&self, tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError>;

    async fn delete(&self, tx: &mut TxContext, id: &AnswerId) -> Result<(), InfraError>;

    /// 質問に属する回答をすべて削除する
    async fn delete_by_question(
        &self,
        tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<(), InfraError>;

    async fn find_by_id(&self, id: &AnswerId) -> Result<Option<Answer>, InfraError>;

    /// トランザクション内で回答を行ロック付きで取得する
    async fn find_for_update(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
    ) -> Result<Option<Answer>, InfraError>;

    /// 質問の回答を投稿順に取得する
    async fn find_by_question(&self, question_id: &QuestionId)
    -> Result<Vec<Answer>, InfraError>;

    /// 複数の質問の回答を一括で取得する（投稿順）
    ///
    /// 空の配列を渡した場合は空の Vec を返す。
    async fn find_by_questions(
        &self,
        question_ids: &[QuestionId],
    ) -> Result<Vec<Answer>, InfraError>;

    /// トランザクション内で現在のベストアンサーを取得する
    async fn find_best_in_tx(
        &self,
        tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<Option<AnswerId>, InfraError>;

    /// ベストアンサーフラグを設定する
    ///
    /// 同じ質問にすでにフラグの立った別回答がある状態で `true` にすると `Conflict`。
    /// 回答が存在しない場合は `Unexpected`。
    async fn set_best_answer(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
        best: bool,
    ) -> Result<(), InfraError>;

    /// キャッシュされたスコアに `delta` を加算する
    async fn adjust_score(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
        delta: i64,
    ) -> Result<(), InfraError>;
}

/// DB の answers テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct AnswerRow {
    id:          Uuid,
    question_id: Uuid,
    user_id:     Uuid,
    body:        String,
    score:       i64,
    best_answer: bool,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl TryFrom<AnswerRow> for Answer {
    type Error = InfraError;

    fn try_from(row: AnswerRow) -> Result<Self, Self::Error> {
        Ok(Answer::from_db(AnswerRecord {
            id:          AnswerId::from_uuid(row.id),
            question_id: QuestionId::from_uuid(row.question_id),
            user_id:     UserId::from_uuid(row.user_id),
            body:        AnswerBody::new(row.body)?,
            score:       row.score,
            best_answer: row.best_answer,
            created_at:  row.created_at,
            updated_at:  row.updated_at,
        }))
    }
}

/// PostgreSQL 実装の AnswerRepository
#[derive(Debug, Clone)]
pub struct PostgresAnswerRepository {
    pool: PgPool,
}

impl PostgresAnswerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerRepository for PostgresAnswerRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(answer_id = %answer.id()))]
    async fn insert(&self, tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO answers (
                id, question_id, user_id, body, score, best_answer, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(answer.id().as_uuid())
        .bind(answer.question_id().as_uuid())
        .bind(answer.user_id().as_uuid())
        .bind(answer.body().as_str())
        .bind(answer.score())
        .bind(answer.is_best_answer())
        .bind(answer.created_at())
        .bind(answer.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn update(&self, tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError> {
        sqlx::query("UPDATE answers SET body = $2, updated_at = $3 WHERE id = $1")
            .bind(answer.id().as_uuid())
            .bind(answer.body().as_str())
            .bind(answer.updated_at())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn delete(&self, tx: &mut TxContext, id: &AnswerId) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn delete_by_question(
        &self,
        tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(question_id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AnswerId) -> Result<Option<Answer>, InfraError> {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, question_id, user_id, body, score, best_answer, created_at, updated_at
            FROM answers
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Answer::try_from).transpose()
    }

    async fn find_for_update(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
    ) -> Result<Option<Answer>, InfraError> {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, question_id, user_id, body, score, best_answer, created_at, updated_at
            FROM answers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(tx.conn())
        .await?;

        row.map(Answer::try_from).transpose()
    }

    async fn find_by_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Answer>, InfraError> {
        self.find_by_questions(std::slice::from_ref(question_id))
            .await
    }

    async fn find_by_questions(
        &self,
        question_ids: &[QuestionId],
    ) -> Result<Vec<Answer>, InfraError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = question_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, question_id, user_id, body, score, best_answer, created_at, updated_at
            FROM answers
            WHERE question_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Answer::try_from).collect()
    }

    async fn find_best_in_tx(
        &self,
        tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<Option<AnswerId>, InfraError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM answers WHERE question_id = $1 AND best_answer",
        )
        .bind(question_id.as_uuid())
        .fetch_optional(tx.conn())
        .await?;

        Ok(id.map(AnswerId::from_uuid))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(answer_id = %id, best = best))]
    async fn set_best_answer(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
        best: bool,
    ) -> Result<(), InfraError> {
        let result = sqlx::query("UPDATE answers SET best_answer = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(best)
            .execute(tx.conn())
            .await
            .map_err(|e| InfraError::from_write(e, "BestAnswer", id.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(InfraError::unexpected(format!(
                "ベストアンサーを更新する回答が存在しません: {id}"
            )));
        }

        Ok(())
    }

    async fn adjust_score(
        &self,
        tx: &mut TxContext,
        id: &AnswerId,
        delta: i64,
    ) -> Result<(), InfraError> {
        sqlx::query("UPDATE answers SET score = score + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(delta)
            .execute(tx.conn())
            .await?;

        Ok(())
    }
}
