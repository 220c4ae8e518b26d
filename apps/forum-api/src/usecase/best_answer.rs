//! # ベストアンサー選択ユースケース
//!
//! 質問の作成者が回答の 1 つをベストアンサーに選ぶ。
//!
//! 同じ質問への選択は質問行のロックで直列化し、旧回答のフラグ解除と
//! 新回答のフラグ設定を 1 トランザクションで行う。DB 側でも
//! `answers(question_id) WHERE best_answer` の部分一意インデックスで
//! 1 質問 1 件を保証する。

use std::sync::Arc;

use forum_domain::{
    answer::AnswerId,
    authorization::{Action, Policy, Resource},
    best_answer::{BestAnswerSlot, BestAnswerTransition},
    user::UserId,
};
use forum_infra::{
    db::TransactionManager,
    repository::{AnswerRepository, QuestionRepository},
};

use crate::{
    error::CoreError,
    usecase::{
        QuestionWithAnswers,
        helpers::{FindResultExt, ensure_allowed},
        load_question_with_answers,
    },
};

/// ベストアンサー選択の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestAnswerOutcome {
    pub question:     QuestionWithAnswers,
    /// すでに同じ回答が選ばれていた（書き込みなし）
    pub already_best: bool,
}

/// ベストアンサー選択ユースケースの実装
pub struct BestAnswerUseCaseImpl {
    question_repo: Arc<dyn QuestionRepository>,
    answer_repo:   Arc<dyn AnswerRepository>,
    policy:        Arc<dyn Policy>,
    tx_manager:    Arc<dyn TransactionManager>,
}

impl BestAnswerUseCaseImpl {
    pub fn new(
        question_repo: Arc<dyn QuestionRepository>,
        answer_repo: Arc<dyn AnswerRepository>,
        policy: Arc<dyn Policy>,
        tx_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            policy,
            tx_manager,
        }
    }

    /// 回答をベストアンサーに選ぶ
    ///
    /// 1. 回答を取得（存在しなければ `NotFound`）
    /// 2. 親の質問を行ロックし、回答をロック下で再取得する
    ///    （待機中に削除されていれば `NotFound`）
    /// 3. 質問の作成者でなければ `Forbidden`（状態は変えない）
    /// 4. 現在の枠から遷移を決める
    ///    - 同じ回答: 書き込みなしで `already_best`
    ///    - それ以外: 旧回答のフラグを外し、新回答にフラグを立ててコミット
    #[tracing::instrument(skip_all, fields(%user_id, %answer_id))]
    pub async fn mark_best(
        &self,
        user_id: &UserId,
        answer_id: &AnswerId,
    ) -> Result<BestAnswerOutcome, CoreError> {
        let answer = self
            .answer_repo
            .find_by_id(answer_id)
            .await
            .or_not_found("回答")?;

        let mut tx = self.tx_manager.begin().await?;
        let question = self
            .question_repo
            .find_for_update(&mut tx, answer.question_id())
            .await
            .or_not_found("質問")?;
        let answer = self
            .answer_repo
            .find_for_update(&mut tx, answer_id)
            .await
            .or_not_found("回答")?;
        ensure_allowed(
            self.policy.as_ref(),
            user_id,
            Action::MarkAsBest,
            Resource::Answer {
                answer:   &answer,
                question: &question,
            },
        )?;

        let slot = BestAnswerSlot::from_current(
            self.answer_repo
                .find_best_in_tx(&mut tx, question.id())
                .await?,
        );
        let transition = slot.transition(answer.id());

        let already_best = match &transition {
            BestAnswerTransition::AlreadyBest => {
                // 書き込みなし（ドロップでロールバック）
                drop(tx);
                true
            }
            BestAnswerTransition::Select { clear, set } => {
                if let Some(previous) = clear {
                    self.answer_repo
                        .set_best_answer(&mut tx, previous, false)
                        .await?;
                }
                self.answer_repo
                    .set_best_answer(&mut tx, set, true)
                    .await
                    .map_err(|e| {
                        if e.is_conflict() {
                            CoreError::Conflict(
                                "この質問には既に別のベストアンサーがあります".to_string(),
                            )
                        } else {
                            CoreError::Database(e)
                        }
                    })?;
                tx.commit().await?;
                false
            }
        };

        tracing::info!(
            slot = ?slot.apply(&transition),
            already_best,
            "ベストアンサーを選択しました"
        );

        let question = load_question_with_answers(
            self.question_repo.as_ref(),
            self.answer_repo.as_ref(),
            question.id(),
        )
        .await?;

        Ok(BestAnswerOutcome {
            question,
            already_best,
        })
    }
}

#[cfg(test)]
mod tests {
    use forum_domain::answer::Answer;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::ForumTestBuilder;

    fn best_ids(question: &QuestionWithAnswers) -> Vec<AnswerId> {
        question
            .answers
            .iter()
            .filter(|a| a.is_best_answer())
            .map(|a| a.id().clone())
            .collect()
    }

    #[tokio::test]
    async fn test_質問者は回答をベストアンサーに選べる() {
        let builder = ForumTestBuilder::new();
        let setup = builder.build();
        let asker = UserId::new();
        let question = builder.build_question(&asker, "Pick one");
        let answer = builder.build_answer(&question, &UserId::new(), "回答");
        setup.question_repo.add_question(question.clone());
        setup.answer_repo.add_answer(answer.clone());

        let outcome = setup.best_answers.mark_best(&asker, answer.id()).await.unwrap();

        assert!(!outcome.already_best);
        assert_eq!(best_ids(&outcome.question), vec![answer.id().clone()]);
    }

    #[tokio::test]
    async fn test_同じ回答を2回選ぶと2回目はalready_bestで変化しない() {
        let builder = ForumTestBuilder::new();
        let setup = builder.build();
        let asker = UserId::new();
        let question = builder.build_question(&asker, "Twice");
        let answer = builder.build_answer(&question, &UserId::new(), "回答");
        setup.question_repo.add_question(question.clone());
        setup.answer_repo.add_answer(answer.clone());
        let first = setup.best_answers.mark_best(&asker, answer.id()).await.unwrap();

        let second = setup.best_answers.mark_best(&asker, answer.id()).await.unwrap();

        assert!(second.already_best);
        assert_eq!(second.question, first.question);
    }

    #[tokio::test]
    async fn test_別の回答を選ぶと旧回答のフラグが外れる() {
        let builder = ForumTestBuilder::new();
        let setup = builder.build();
        let asker = UserId::new();
        let question = builder.build_question(&asker, "Reassign");
        let first: Answer = builder.build_answer(&question, &UserId::new(), "最初の回答");
        let second: Answer = builder.build_answer(&question, &asker, "自分の回答");
        setup.question_repo.add_question(question.clone());
        setup.answer_repo.add_answer(first.clone());
        setup.answer_repo.add_answer(second.clone());
        setup.best_answers.mark_best(&asker, first.id()).await.unwrap();

        let outcome = setup.best_answers.mark_best(&asker, second.id()).await.unwrap();

        assert_eq!(best_ids(&outcome.question), vec![second.id().clone()]);
        let first_stored = setup.answer_repo.find_by_id(first.id()).await.unwrap().unwrap();
        assert!(!first_stored.is_best_answer());
    }

    #[tokio::test]
    async fn test_質問者以外はforbiddenで状態は変わらない() {
        let builder = ForumTestBuilder::new();
        let setup = builder.build();
        let question = builder.build_question(&UserId::new(), "Not yours");
        let answerer = UserId::new();
        let answer = builder.build_answer(&question, &answerer, "回答");
        setup.question_repo.add_question(question.clone());
        setup.answer_repo.add_answer(answer.clone());

        // 回答者本人でも質問者でなければ選べない
        let err = setup
            .best_answers
            .mark_best(&answerer, answer.id())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Forbidden(_)));
        let stored = setup.answer_repo.find_by_id(answer.id()).await.unwrap().unwrap();
        assert!(!stored.is_best_answer());
    }

    #[tokio::test]
    async fn test_存在しない回答はnot_found() {
        let setup = ForumTestBuilder::new().build();

        let err = setup
            .best_answers
            .mark_best(&UserId::new(), &AnswerId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
