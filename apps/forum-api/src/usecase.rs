//! # ユースケース層
//!
//! Forum API のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **明示的な操作者**: 各操作は操作者の `UserId` を引数で受け取る
//!
//! ## モジュール構成
//!
//! - `auth`: 登録・ログイン・ログアウト・プロフィール
//! - `question`: 質問の CRUD と一覧
//! - `answer`: 回答の CRUD
//! - `vote`: 投票台帳
//! - `best_answer`: ベストアンサー選択

pub(crate) mod helpers;

pub mod answer;
pub mod auth;
pub mod best_answer;
pub mod question;
pub mod vote;

use std::collections::HashMap;

pub use answer::{AnswerUseCaseImpl, AnswerWithQuestion};
pub use auth::{AuthUseCaseImpl, LoginOutput, RegisterInput, UpdatePasswordInput, UpdateProfileInput};
pub use best_answer::{BestAnswerOutcome, BestAnswerUseCaseImpl};
use forum_domain::{
    answer::Answer,
    question::{Question, QuestionId},
};
use forum_infra::repository::{AnswerRepository, QuestionRepository};
pub use question::{CreateQuestionInput, QuestionUseCaseImpl, UpdateQuestionInput};
pub use vote::{CastVoteInput, VoteOutcome, VoteUseCaseImpl};

use crate::{error::CoreError, usecase::helpers::FindResultExt};

/// 質問と、その回答（投稿順）の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWithAnswers {
    pub question: Question,
    pub answers:  Vec<Answer>,
}

impl QuestionWithAnswers {
    /// ベストアンサーに選ばれている回答を返す
    pub fn best_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_best_answer())
    }
}

/// 質問を回答付きで読み込む
pub(crate) async fn load_question_with_answers(
    question_repo: &dyn QuestionRepository,
    answer_repo: &dyn AnswerRepository,
    question_id: &QuestionId,
) -> Result<QuestionWithAnswers, CoreError> {
    let question = question_repo.find_by_id(question_id).await.or_not_found("質問")?;
    let answers = answer_repo.find_by_question(question_id).await?;

    Ok(QuestionWithAnswers { question, answers })
}

/// 質問一覧に回答を一括で付与する
///
/// 回答は 1 クエリでまとめて取得し、質問の並び順を維持する。
pub(crate) async fn attach_answers(
    answer_repo: &dyn AnswerRepository,
    questions: Vec<Question>,
) -> Result<Vec<QuestionWithAnswers>, CoreError> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<QuestionId> = questions.iter().map(|q| q.id().clone()).collect();
    let mut answers_by_question: HashMap<QuestionId, Vec<Answer>> = HashMap::new();
    for answer in answer_repo.find_by_questions(&ids).await? {
        answers_by_question
            .entry(answer.question_id().clone())
            .or_default()
            .push(answer);
    }

    Ok(questions
        .into_iter()
        .map(|question| {
            let answers = answers_by_question.remove(question.id()).unwrap_or_default();
            QuestionWithAnswers { question, answers }
        })
        .collect())
}
