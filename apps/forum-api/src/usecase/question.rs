//! # 質問ユースケース
//!
//! 質問の一覧・閲覧・作成・編集・削除。
//!
//! 一覧と閲覧は常に回答付き（[`QuestionWithAnswers`]）で返す。
//! 削除は回答と、質問・回答への投票をまとめて 1 トランザクションで消す。

use std::sync::Arc;

use forum_domain::{
    authorization::{Action, Policy, Resource},
    clock::Clock,
    question::{
        NewQuestion,
        Question,
        QuestionBody,
        QuestionId,
        QuestionRevision,
        QuestionTitle,
        Slug,
        Tags,
    },
    user::UserId,
    vote::Votable,
};
use forum_infra::{
    InfraError,
    db::TransactionManager,
    repository::{AnswerRepository, QuestionRepository, VoteRepository},
};

use crate::{
    error::CoreError,
    usecase::{
        QuestionWithAnswers,
        attach_answers,
        helpers::{FindResultExt, ensure_allowed},
        load_question_with_answers,
    },
};

/// 質問作成の入力
pub struct CreateQuestionInput {
    pub title: String,
    pub body:  String,
    /// カンマ区切りのタグ（省略可）
    pub tags:  Option<String>,
}

/// 質問編集の入力
pub struct UpdateQuestionInput {
    pub title: String,
    pub body:  String,
    /// 省略時は既存のタグを維持する
    pub tags:  Option<String>,
}

/// 質問ユースケースの実装
pub struct QuestionUseCaseImpl {
    question_repo: Arc<dyn QuestionRepository>,
    answer_repo:   Arc<dyn AnswerRepository>,
    vote_repo:     Arc<dyn VoteRepository>,
    policy:        Arc<dyn Policy>,
    tx_manager:    Arc<dyn TransactionManager>,
    clock:         Arc<dyn Clock>,
}

impl QuestionUseCaseImpl {
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

    /// 全質問を新しい順に取得する
    pub async fn list_latest(&self) -> Result<Vec<QuestionWithAnswers>, CoreError> {
        let questions = self.question_repo.find_latest().await?;
        attach_answers(self.answer_repo.as_ref(), questions).await
    }

    /// 指定ユーザーの質問を新しい順に取得する
    ///
    /// ログイン中ユーザー自身の一覧（`/me/questions`）もこれを使う。
    pub async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<QuestionWithAnswers>, CoreError> {
        let questions = self.question_repo.find_by_user(user_id).await?;
        attach_answers(self.answer_repo.as_ref(), questions).await
    }

    /// 指定タグを持つ質問を新しい順に取得する
    ///
    /// タグは保存時と同じく小文字に正規化して比較する。
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<QuestionWithAnswers>, CoreError> {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        let questions = self.question_repo.find_by_tag(&tag).await?;
        attach_answers(self.answer_repo.as_ref(), questions).await
    }

    /// スラッグで質問を閲覧する
    ///
    /// 閲覧数を 1 増やしてから、回答付きで返す。
    pub async fn show(&self, slug: &str) -> Result<QuestionWithAnswers, CoreError> {
        let question = self
            .question_repo
            .find_by_slug(&Slug::from_string(slug))
            .await
            .or_not_found("質問")?;

        let mut tx = self.tx_manager.begin().await?;
        self.question_repo
            .increment_view_count(&mut tx, question.id())
            .await?;
        tx.commit().await?;

        self.load(question.id()).await
    }

    /// 質問を作成する
    ///
    /// スラッグはタイトルから導出する。同じスラッグの質問があれば `Conflict`。
    pub async fn create(
        &self,
        user_id: &UserId,
        input: CreateQuestionInput,
    ) -> Result<QuestionWithAnswers, CoreError> {
        let title = QuestionTitle::new(input.title)?;
        let body = QuestionBody::new(input.body)?;
        let tags = match input.tags {
            Some(raw) => Tags::parse(&raw)?,
            None => Tags::default(),
        };

        let question = Question::new(NewQuestion {
            id: QuestionId::new(),
            user_id: user_id.clone(),
            title,
            body,
            tags,
            now: self.clock.now(),
        })?;

        let mut tx = self.tx_manager.begin().await?;
        self.question_repo
            .insert(&mut tx, &question)
            .await
            .map_err(|e| slug_conflict_or(e, question.slug()))?;
        tx.commit().await?;

        tracing::info!(
            question_id = %question.id(),
            slug = %question.slug(),
            "質問を作成しました"
        );

        Ok(QuestionWithAnswers {
            question,
            answers: Vec::new(),
        })
    }

    /// 質問を編集する（作成者のみ）
    pub async fn update(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
        input: UpdateQuestionInput,
    ) -> Result<QuestionWithAnswers, CoreError> {
        let revision = QuestionRevision {
            title: QuestionTitle::new(input.title)?,
            body:  QuestionBody::new(input.body)?,
            tags:  input.tags.as_deref().map(Tags::parse).transpose()?,
        };

        let mut tx = self.tx_manager.begin().await?;
        let question = self
            .question_repo
            .find_for_update(&mut tx, question_id)
            .await
            .or_not_found("質問")?;
        ensure_allowed(
            self.policy.as_ref(),
            user_id,
            Action::Update,
            Resource::Question(&question),
        )?;

        let question = question.revised(revision, self.clock.now())?;
        self.question_repo
            .update(&mut tx, &question)
            .await
            .map_err(|e| slug_conflict_or(e, question.slug()))?;
        tx.commit().await?;

        self.load(question_id).await
    }

    /// 質問を削除する（作成者のみ）
    ///
    /// 回答と、質問・回答に対する投票も削除する。
    pub async fn delete(&self, user_id: &UserId, question_id: &QuestionId) -> Result<(), CoreError> {
        let mut tx = self.tx_manager.begin().await?;
        let question = self
            .question_repo
            .find_for_update(&mut tx, question_id)
            .await
            .or_not_found("質問")?;
        ensure_allowed(
            self.policy.as_ref(),
            user_id,
            Action::Delete,
            Resource::Question(&question),
        )?;

        let answers = self.answer_repo.find_by_question(question_id).await?;
        let votables: Vec<Votable> = std::iter::once(Votable::Question(question_id.clone()))
            .chain(answers.iter().map(|a| Votable::Answer(a.id().clone())))
            .collect();

        self.vote_repo.delete_for(&mut tx, &votables).await?;
        self.answer_repo
            .delete_by_question(&mut tx, question_id)
            .await?;
        self.question_repo.delete(&mut tx, question_id).await?;
        tx.commit().await?;

        tracing::info!(
            question_id = %question_id,
            answers = answers.len(),
            "質問を削除しました"
        );
        Ok(())
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

fn slug_conflict_or(err: InfraError, slug: &Slug) -> CoreError {
    if err.is_conflict() {
        CoreError::Conflict(format!("同じタイトルの質問が既に存在します: {}", slug))
    } else {
        CoreError::Database(err)
    }
}
