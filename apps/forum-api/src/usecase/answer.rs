//! # 回答ユースケース
//!
//! 回答の閲覧・投稿・編集・削除。
//! ベストアンサーの選択は [`super::best_answer`]、投票は [`super::vote`] が担う。

use std::sync::Arc;

use forum_domain::{
    answer::{Answer, AnswerBody, AnswerId, NewAnswer},
    authorization::{Action, Policy, Resource},
    clock::Clock,
    question::{Question, QuestionId},
    user::UserId,
    vote::Votable,
};
use forum_infra::{
    db::TransactionManager,
    repository::{AnswerRepository, QuestionRepository, VoteRepository},
};

use crate::{
    error::CoreError,
    usecase::{
        QuestionWithAnswers,
        helpers::{FindResultExt, ensure_allowed},
        load_question_with_answers,
    },
};

/// 回答と、それが属する質問の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerWithQuestion {
    pub answer:   Answer,
    pub question: Question,
}

/// 回答ユースケースの実装
pub struct AnswerUseCaseImpl {
    question_repo: Arc<dyn QuestionRepository>,
    answer_repo:   Arc<dyn AnswerRepository>,
    vote_repo:     Arc<dyn VoteRepository>,
    policy:        Arc<dyn Policy>,
    tx_manager:    Arc<dyn TransactionManager>,
    clock:         Arc<dyn Clock>,
}

impl AnswerUseCaseImpl {
    pub fn new(
        question_repo: Arc<dyn QuestionRepository>,
        answer_repo: Arc<dyn AnswerRepository>,
        vote_repo: Arc<dyn VoteRepository>,
        policy: Arc<dyn Policy>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            vote_repo,
            policy,
            tx_manager,
            clock,
        }
    }

    /// 回答を、属する質問と合わせて取得する
    pub async fn show(&self, answer_id: &AnswerId) -> Result<AnswerWithQuestion, CoreError> {
        let answer = self
            .answer_repo
            .find_by_id(answer_id)
            .await
            .or_not_found("回答")?;
        let question = self
            .question_repo
            .find_by_id(answer.question_id())
            .await
            .or_not_found("質問")?;

        Ok(AnswerWithQuestion { answer, question })
    }

    /// 質問に回答を投稿し、回答付きの質問を返す
    pub async fn create(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
        body: String,
    ) -> Result<QuestionWithAnswers, CoreError> {
        let body = AnswerBody::new(body)?;

        let mut tx = self.tx_manager.begin().await?;
        // 回答の投稿中に質問が削除されないようロックする
        self.question_repo
            .find_for_update(&mut tx, question_id)
            .await
            .or_not_found("質問")?;

        let answer = Answer::new(NewAnswer {
            id: AnswerId::new(),
            question_id: question_id.clone(),
            user_id: user_id.clone(),
            body,
            now: self.clock.now(),
        });
        self.answer_repo.insert(&mut tx, &answer).await?;
        tx.commit().await?;

        tracing::info!(
            answer_id = %answer.id(),
            question_id = %question_id,
            "回答を投稿しました"
        );

        self.load(question_id).await
    }

    /// 回答の本文を編集する（回答の作成者のみ）
    pub async fn update(
        &self,
        user_id: &UserId,
        answer_id: &AnswerId,
        body: String,
    ) -> Result<QuestionWithAnswers, CoreError> {
        let body = AnswerBody::new(body)?;

        let mut tx = self.tx_manager.begin().await?;
        let (answer, question) = self.lock_with_question(&mut tx, answer_id).await?;
        ensure_allowed(
            self.policy.as_ref(),
            user_id,
            Action::Update,
            Resource::Answer {
                answer:   &answer,
                question: &question,
            },
        )?;

        let answer = answer.with_body(body, self.clock.now());
        self.answer_repo.update(&mut tx, &answer).await?;
        tx.commit().await?;

        self.load(question.id()).await
    }

    /// 回答を削除する（回答の作成者のみ）
    ///
    /// 回答への投票も削除する。ベストアンサーだった場合、質問は未選択に戻る。
    pub async fn delete(
        &self,
        user_id: &UserId,
        answer_id: &AnswerId,
    ) -> Result<QuestionWithAnswers, CoreError> {
        let mut tx = self.tx_manager.begin().await?;
        let (answer, question) = self.lock_with_question(&mut tx, answer_id).await?;
        ensure_allowed(
            self.policy.as_ref(),
            user_id,
            Action::Delete,
            Resource::Answer {
                answer:   &answer,
                question: &question,
            },
        )?;

        self.vote_repo
            .delete_for(&mut tx, &[Votable::Answer(answer_id.clone())])
            .await?;
        self.answer_repo.delete(&mut tx, answer_id).await?;
        tx.commit().await?;

        tracing::info!(answer_id = %answer_id, "回答を削除しました");

        self.load(question.id()).await
    }

    /// 親の質問 → 回答の順に行ロックを取得する
    ///
    /// ベストアンサー選択と同じ順序でロックし、デッドロックを避ける。
    async fn lock_with_question(
        &self,
        tx: &mut forum_infra::db::TxContext,
        answer_id: &AnswerId,
    ) -> Result<(Answer, Question), CoreError> {
        let answer = self
            .answer_repo
            .find_by_id(answer_id)
            .await
            .or_not_found("回答")?;
        let question = self
            .question_repo
            .find_for_update(tx, answer.question_id())
            .await
            .or_not_found("質問")?;
        let answer = self
            .answer_repo
            .find_for_update(tx, answer_id)
            .await
            .or_not_found("回答")?;

        Ok((answer, question))
    }

    async fn load(&self, question_id: &QuestionId) -> Result<QuestionWithAnswers, CoreError> {
        load_question_with_answers(
            self.question_repo.as_ref(),
            self.answer_repo.as_ref(),
            question_id,
        )
        .await
    }
}
