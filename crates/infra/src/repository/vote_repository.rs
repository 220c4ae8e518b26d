//! # VoteRepository
//!
//! 投票台帳の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **1 ユーザー 1 票**: `votes_voter_votable_key`
//!   （`voter_id, votable_type, votable_id`）一意制約が最終防衛線。
//!   違反は `Conflict` として返り、ユースケース層で二重投票エラーになる
//! - **追記のみ**: 投票の更新メソッドは持たない
//! - **ポリモーフィック参照**: `votable_id` に外部キーは張れないため、
//!   投票対象の削除時は [`VoteRepository::delete_for`] で明示的に消す

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forum_domain::{
    user::UserId,
    vote::{Votable, VotableKind, Vote, VoteDirection, VoteId, VoteRecord, VoteTally},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 投票リポジトリトレイト
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// 投票を記録する（同じ投票者・対象の組が既にあれば `Conflict`）
    async fn insert(&self, tx: &mut TxContext, vote: &Vote) -> Result<(), InfraError>;

    /// トランザクション内で投票者の既存票を検索する
    async fn find_by_voter_in_tx(
        &self,
        tx: &mut TxContext,
        voter_id: &UserId,
        votable: &Votable,
    ) -> Result<Option<Vote>, InfraError>;

    /// トランザクション内で台帳から集計する
    async fn tally_in_tx(
        &self,
        tx: &mut TxContext,
        votable: &Votable,
    ) -> Result<VoteTally, InfraError>;

    /// 台帳から集計する
    async fn tally(&self, votable: &Votable) -> Result<VoteTally, InfraError>;

    /// 投票対象に紐づく投票をすべて削除する
    async fn delete_for(&self, tx: &mut TxContext, votables: &[Votable])
    -> Result<(), InfraError>;
}

/// DB の votes テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct VoteRow {
    id:           Uuid,
    voter_id:     Uuid,
    votable_type: String,
    votable_id:   Uuid,
    direction:    String,
    created_at:   DateTime<Utc>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = InfraError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let kind: VotableKind = row.votable_type.parse()?;
        let direction: VoteDirection = row.direction.parse()?;
        Ok(Vote::from_db(VoteRecord {
            id: VoteId::from_uuid(row.id),
            voter_id: UserId::from_uuid(row.voter_id),
            votable: Votable::from_parts(kind, row.votable_id),
            direction,
            created_at: row.created_at,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct TallyRow {
    up:   i64,
    down: i64,
}

impl From<TallyRow> for VoteTally {
    fn from(row: TallyRow) -> Self {
        VoteTally::new(row.up, row.down)
    }
}

const TALLY_SQL: &str = r#"
    SELECT
        COUNT(*) FILTER (WHERE direction = 'up')   AS up,
        COUNT(*) FILTER (WHERE direction = 'down') AS down
    FROM votes
    WHERE votable_type = $1 AND votable_id = $2
"#;

/// PostgreSQL 実装の VoteRepository
#[derive(Debug, Clone)]
pub struct PostgresVoteRepository {
    pool: PgPool,
}

impl PostgresVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(votable = %vote.votable()))]
    async fn insert(&self, tx: &mut TxContext, vote: &Vote) -> Result<(), InfraError> {
        let kind: &'static str = vote.votable().kind().into();
        let direction: &'static str = vote.direction().into();

        sqlx::query(
            r#"
            INSERT INTO votes (id, voter_id, votable_type, votable_id, direction, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(vote.id().as_uuid())
        .bind(vote.voter_id().as_uuid())
        .bind(kind)
        .bind(vote.votable().id())
        .bind(direction)
        .bind(vote.created_at())
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_write(e, "Vote", vote.votable().to_string()))?;

        Ok(())
    }

    async fn find_by_voter_in_tx(
        &self,
        tx: &mut TxContext,
        voter_id: &UserId,
        votable: &Votable,
    ) -> Result<Option<Vote>, InfraError> {
        let kind: &'static str = votable.kind().into();

        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_id, votable_type, votable_id, direction, created_at
            FROM votes
            WHERE voter_id = $1 AND votable_type = $2 AND votable_id = $3
            "#,
        )
        .bind(voter_id.as_uuid())
        .bind(kind)
        .bind(votable.id())
        .fetch_optional(tx.conn())
        .await?;

        row.map(Vote::try_from).transpose()
    }

    async fn tally_in_tx(
        &self,
        tx: &mut TxContext,
        votable: &Votable,
    ) -> Result<VoteTally, InfraError> {
        let kind: &'static str = votable.kind().into();

        let row = sqlx::query_as::<_, TallyRow>(TALLY_SQL)
            .bind(kind)
            .bind(votable.id())
            .fetch_one(tx.conn())
            .await?;

        Ok(row.into())
    }

    async fn tally(&self, votable: &Votable) -> Result<VoteTally, InfraError> {
        let kind: &'static str = votable.kind().into();

        let row = sqlx::query_as::<_, TallyRow>(TALLY_SQL)
            .bind(kind)
            .bind(votable.id())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn delete_for(
        &self,
        tx: &mut TxContext,
        votables: &[Votable],
    ) -> Result<(), InfraError> {
        for votable in votables {
            let kind: &'static str = votable.kind().into();
            sqlx::query("DELETE FROM votes WHERE votable_type = $1 AND votable_id = $2")
                .bind(kind)
                .bind(votable.id())
                .execute(tx.conn())
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn VoteRepository>>();
    }
}
