//! # 投票台帳ユースケース
//!
//! 質問・回答への投票を記録する。1 ユーザーは 1 対象に 1 票だけ投じられ、
//! 投票の変更や取り消しはできない。
//!
//! ## 整合性
//!
//! - 投票対象の行をロックしてから既存票を確認し、投票を挿入する
//! - `(voter_id, votable_type, votable_id)` の一意制約が最終防衛線
//! - キャッシュされた `score` は投票の挿入と同じトランザクションで ±1 する
//! - 台帳から数えた `net_votes`（up − down）が正であり、`score` と一致する

use std::sync::Arc;

use forum_domain::{
    clock::Clock,
    question::QuestionId,
    user::UserId,
    vote::{Votable, VotableKind, Vote, VoteDirection},
};
use forum_infra::{
    db::{TransactionManager, TxContext},
    repository::{AnswerRepository, QuestionRepository, VoteRepository},
};

use crate::{
    error::CoreError,
    usecase::{QuestionWithAnswers, helpers::FindResultExt, load_question_with_answers},
};

/// 投票の入力
pub struct CastVoteInput {
    pub votable:   Votable,
    /// `up` または `down`（それ以外は `InvalidVoteDirection`）
    pub direction: String,
}

/// 投票結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// 投票対象の質問（回答への投票の場合は親の質問）
    pub question:    QuestionWithAnswers,
    /// 投票対象のキャッシュ済みスコア
    pub score:       i64,
    /// 台帳から数えた純投票数（up − down）
    pub votes_count: i64,
}

/// 投票ユースケースの実装
pub struct VoteUseCaseImpl {
    question_repo: Arc<dyn QuestionRepository>,
    answer_repo:   Arc<dyn AnswerRepository>,
    vote_repo:     Arc<dyn VoteRepository>,
    tx_manager:    Arc<dyn TransactionManager>,
    clock:         Arc<dyn Clock>,
}

impl VoteUseCaseImpl {
    pub fn new(
        question_repo: Arc<dyn QuestionRepository>,
        answer_repo: Arc<dyn AnswerRepository>,
        vote_repo: Arc<dyn VoteRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            vote_repo,
            tx_manager,
            clock,
        }
    }

    /// 投票する
    ///
    /// 1. 投票方向を検証（不正なら `InvalidVoteDirection`）
    /// 2. 投票対象の行をロック（存在しなければ `NotFound`）
    /// 3. 既存票があれば `DuplicateVote`（方向は問わない）
    /// 4. 投票を挿入し、対象のスコアを ±1
    /// 5. 台帳から純投票数を数え直してコミット
    #[tracing::instrument(skip_all, fields(%user_id, votable = %input.votable))]
    pub async fn cast_vote(
        &self,
        user_id: &UserId,
        input: CastVoteInput,
    ) -> Result<VoteOutcome, CoreError> {
        let direction: VoteDirection = input.direction.parse().map_err(|_| {
            CoreError::InvalidVoteDirection(format!(
                "投票方向は up か down で指定してください: {}",
                input.direction
            ))
        })?;
        let votable = input.votable;

        let mut tx = self.tx_manager.begin().await?;
        let question_id = self.lock_votable(&mut tx, &votable).await?;

        if self
            .vote_repo
            .find_by_voter_in_tx(&mut tx, user_id, &votable)
            .await?
            .is_some()
        {
            return Err(duplicate_vote(&votable));
        }

        let vote = Vote::cast(user_id.clone(), votable.clone(), direction, self.clock.now());
        self.vote_repo
            .insert(&mut tx, &vote)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    duplicate_vote(&votable)
                } else {
                    CoreError::Database(e)
                }
            })?;

        match &votable {
            Votable::Question(id) => {
                self.question_repo
                    .adjust_score(&mut tx, id, direction.delta())
                    .await?
            }
            Votable::Answer(id) => {
                self.answer_repo
                    .adjust_score(&mut tx, id, direction.delta())
                    .await?
            }
        }

        let tally = self.vote_repo.tally_in_tx(&mut tx, &votable).await?;
        tx.commit().await?;

        let question = load_question_with_answers(
            self.question_repo.as_ref(),
            self.answer_repo.as_ref(),
            &question_id,
        )
        .await?;
        let score = score_of(&question, &votable)?;
        if score != tally.net() {
            tracing::warn!(
                score,
                net_votes = tally.net(),
                "キャッシュされたスコアが台帳と一致しません"
            );
        }

        tracing::info!(%direction, net_votes = tally.net(), "投票を記録しました");

        Ok(VoteOutcome {
            question,
            score,
            votes_count: tally.net(),
        })
    }

    /// 台帳から純投票数（up − down）を数える
    pub async fn net_votes(&self, votable: &Votable) -> Result<i64, CoreError> {
        Ok(self.vote_repo.tally(votable).await?.net())
    }

    /// 投票対象の行をロックし、親の質問 ID を返す
    async fn lock_votable(
        &self,
        tx: &mut TxContext,
        votable: &Votable,
    ) -> Result<QuestionId, CoreError> {
        match votable {
            Votable::Question(id) => {
                let question = self
                    .question_repo
                    .find_for_update(tx, id)
                    .await
                    .or_not_found("質問")?;
                Ok(question.id().clone())
            }
            Votable::Answer(id) => {
                let answer = self
                    .answer_repo
                    .find_for_update(tx, id)
                    .await
                    .or_not_found("回答")?;
                Ok(answer.question_id().clone())
            }
        }
    }
}

fn duplicate_vote(votable: &Votable) -> CoreError {
    let target = match votable.kind() {
        VotableKind::Question => "質問",
        VotableKind::Answer => "回答",
    };
    CoreError::DuplicateVote(format!("この{}には既に投票済みです", target))
}

fn score_of(question: &QuestionWithAnswers, votable: &Votable) -> Result<i64, CoreError> {
    match votable {
        Votable::Question(_) => Ok(question.question.score()),
        Votable::Answer(id) => question
            .answers
            .iter()
            .find(|a| a.id() == id)
            .map(|a| a.score())
            .ok_or_else(|| CoreError::NotFound("回答が見つかりません".to_string())),
    }
}
