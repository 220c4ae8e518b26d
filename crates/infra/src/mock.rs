//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! forum-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! DB 制約（メールアドレス・スラッグ・投票の一意性、質問ごとに 1 件の
//! ベストアンサー）は PostgreSQL 実装と同じく `Conflict` で再現する。
//! 書き込みは即時反映され、ロールバックはしない。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use forum_domain::{
    access_token::{AccessToken, AccessTokenValue},
    answer::{Answer, AnswerId, AnswerRecord},
    question::{Question, QuestionId, QuestionRecord, Slug},
    user::{Email, User, UserId},
    vote::{Votable, Vote, VoteTally},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        AccessTokenRepository,
        AnswerRepository,
        QuestionRepository,
        UserRepository,
        VoteRepository,
    },
};

// ===== MockTransactionManager =====

/// モック TransactionManager
///
/// `serialized()` で作成すると、トランザクションを 1 つずつしか開始できなくなる。
/// PostgreSQL の行ロックによる直列化を再現し、並行テストに使用する。
#[derive(Clone, Default)]
pub struct MockTransactionManager {
    lock: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl MockTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialized() -> Self {
        Self {
            lock: Some(Arc::new(tokio::sync::Mutex::new(()))),
        }
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        match &self.lock {
            Some(lock) => Ok(TxContext::mock_serialized(lock.clone().lock_owned().await)),
            None => Ok(TxContext::mock()),
        }
    }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, _tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email() == user.email()) {
            return Err(InfraError::conflict("User", user.email().as_str()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, _tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.id() != user.id() && u.email() == user.email())
        {
            return Err(InfraError::conflict("User", user.email().as_str()));
        }
        if let Some(pos) = users.iter().position(|u| u.id() == user.id()) {
            users[pos] = user.clone();
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }
}

// ===== MockAccessTokenRepository =====

#[derive(Clone, Default)]
pub struct MockAccessTokenRepository {
    tokens: Arc<Mutex<Vec<AccessToken>>>,
}

impl MockAccessTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, token: AccessToken) {
        self.tokens.lock().unwrap().push(token);
    }
}

#[async_trait]
impl AccessTokenRepository for MockAccessTokenRepository {
    async fn insert(&self, _tx: &mut TxContext, token: &AccessToken) -> Result<(), InfraError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn find(&self, token: &AccessTokenValue) -> Result<Option<AccessToken>, InfraError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token() == token)
            .cloned())
    }

    async fn delete(
        &self,
        _tx: &mut TxContext,
        token: &AccessTokenValue,
    ) -> Result<(), InfraError> {
        self.tokens.lock().unwrap().retain(|t| t.token() != token);
        Ok(())
    }
}

// ===== MockQuestionRepository =====

#[derive(Clone, Default)]
pub struct MockQuestionRepository {
    questions: Arc<Mutex<Vec<Question>>>,
}

impl MockQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_question(&self, question: Question) {
        self.questions.lock().unwrap().push(question);
    }

    fn modify(&self, id: &QuestionId, f: impl FnOnce(&mut QuestionRecord)) {
        let mut questions = self.questions.lock().unwrap();
        if let Some(pos) = questions.iter().position(|q| q.id() == id) {
            let q = &questions[pos];
            let mut record = QuestionRecord {
                id:         q.id().clone(),
                user_id:    q.user_id().clone(),
                title:      q.title().clone(),
                slug:       q.slug().clone(),
                body:       q.body().clone(),
                tags:       q.tags().clone(),
                view_count: q.view_count(),
                score:      q.score(),
                created_at: q.created_at(),
                updated_at: q.updated_at(),
            };
            f(&mut record);
            questions[pos] = Question::from_db(record);
        }
    }

    /// 新しい順（created_at DESC、同時刻は ID DESC）に並べる
    fn sorted_latest(mut questions: Vec<Question>) -> Vec<Question> {
        questions.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
        });
        questions
    }
}

#[async_trait]
impl QuestionRepository for MockQuestionRepository {
    async fn insert(&self, _tx: &mut TxContext, question: &Question) -> Result<(), InfraError> {
        let mut questions = self.questions.lock().unwrap();
        if questions.iter().any(|q| q.slug() == question.slug()) {
            return Err(InfraError::conflict("Question", question.slug().as_str()));
        }
        questions.push(question.clone());
        Ok(())
    }

    async fn update(&self, _tx: &mut TxContext, question: &Question) -> Result<(), InfraError> {
        let mut questions = self.questions.lock().unwrap();
        if questions
            .iter()
            .any(|q| q.id() != question.id() && q.slug() == question.slug())
        {
            return Err(InfraError::conflict("Question", question.slug().as_str()));
        }
        drop(questions);

        // 閲覧数とスコアは更新対象外
        self.modify(question.id(), |record| {
            record.title = question.title().clone();
            record.slug = question.slug().clone();
            record.body = question.body().clone();
            record.tags = question.tags().clone();
            record.updated_at = question.updated_at();
        });
        Ok(())
    }

    async fn delete(&self, _tx: &mut TxContext, id: &QuestionId) -> Result<(), InfraError> {
        self.questions.lock().unwrap().retain(|q| q.id() != id);
        Ok(())
    }

    async fn find_by_id(&self, id: &QuestionId) -> Result<Option<Question>, InfraError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id() == id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Question>, InfraError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.slug() == slug)
            .cloned())
    }

    async fn find_for_update(
        &self,
        _tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<Option<Question>, InfraError> {
        self.find_by_id(id).await
    }

    async fn find_latest(&self) -> Result<Vec<Question>, InfraError> {
        let questions = self.questions.lock().unwrap().clone();
        Ok(Self::sorted_latest(questions))
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Question>, InfraError> {
        let questions: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.user_id() == user_id)
            .cloned()
            .collect();
        Ok(Self::sorted_latest(questions))
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Question>, InfraError> {
        let questions: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tags().contains(tag))
            .cloned()
            .collect();
        Ok(Self::sorted_latest(questions))
    }

    async fn increment_view_count(
        &self,
        _tx: &mut TxContext,
        id: &QuestionId,
    ) -> Result<(), InfraError> {
        self.modify(id, |record| record.view_count += 1);
        Ok(())
    }

    async fn adjust_score(
        &self,
        _tx: &mut TxContext,
        id: &QuestionId,
        delta: i64,
    ) -> Result<(), InfraError> {
        self.modify(id, |record| record.score += delta);
        Ok(())
    }
}

// ===== MockAnswerRepository =====

#[derive(Clone, Default)]
pub struct MockAnswerRepository {
    answers: Arc<Mutex<Vec<Answer>>>,
}

impl MockAnswerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_answer(&self, answer: Answer) {
        self.answers.lock().unwrap().push(answer);
    }

    fn to_record(a: &Answer) -> AnswerRecord {
        AnswerRecord {
            id:          a.id().clone(),
            question_id: a.question_id().clone(),
            user_id:     a.user_id().clone(),
            body:        a.body().clone(),
            score:       a.score(),
            best_answer: a.is_best_answer(),
            created_at:  a.created_at(),
            updated_at:  a.updated_at(),
        }
    }

    fn sorted_oldest(mut answers: Vec<Answer>) -> Vec<Answer> {
        answers.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        answers
    }
}

#[async_trait]
impl AnswerRepository for MockAnswerRepository {
    async fn insert(&self, _tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError> {
        self.answers.lock().unwrap().push(answer.clone());
        Ok(())
    }

    async fn update(&self, _tx: &mut TxContext, answer: &Answer) -> Result<(), InfraError> {
        let mut answers = self.answers.lock().unwrap();
        if let Some(pos) = answers.iter().position(|a| a.id() == answer.id()) {
            let mut record = Self::to_record(&answers[pos]);
            record.body = answer.body().clone();
            record.updated_at = answer.updated_at();
            answers[pos] = Answer::from_db(record);
        }
        Ok(())
    }

    async fn delete(&self, _tx: &mut TxContext, id: &AnswerId) -> Result<(), InfraError> {
        self.answers.lock().unwrap().retain(|a| a.id() != id);
        Ok(())
    }

    async fn delete_by_question(
        &self,
        _tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<(), InfraError> {
        self.answers
            .lock()
            .unwrap()
            .retain(|a| a.question_id() != question_id);
        Ok(())
    }

    async fn find_by_id(&self, id: &AnswerId) -> Result<Option<Answer>, InfraError> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id() == id)
            .cloned())
    }

    async fn find_for_update(
        &self,
        _tx: &mut TxContext,
        id: &AnswerId,
    ) -> Result<Option<Answer>, InfraError> {
        self.find_by_id(id).await
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
        let answers: Vec<Answer> = self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| question_ids.contains(a.question_id()))
            .cloned()
            .collect();
        Ok(Self::sorted_oldest(answers))
    }

    async fn find_best_in_tx(
        &self,
        _tx: &mut TxContext,
        question_id: &QuestionId,
    ) -> Result<Option<AnswerId>, InfraError> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.question_id() == question_id && a.is_best_answer())
            .map(|a| a.id().clone()))
    }

    async fn set_best_answer(
        &self,
        _tx: &mut TxContext,
        id: &AnswerId,
        best: bool,
    ) -> Result<(), InfraError> {
        let mut answers = self.answers.lock().unwrap();
        let Some(pos) = answers.iter().position(|a| a.id() == id) else {
            return Err(InfraError::unexpected(format!(
                "ベストアンサーを更新する回答が存在しません: {id}"
            )));
        };

        // 部分一意インデックス answers(question_id) WHERE best_answer の再現
        let question_id = answers[pos].question_id().clone();
        if best
            && answers
                .iter()
                .any(|a| a.id() != id && a.question_id() == &question_id && a.is_best_answer())
        {
            return Err(InfraError::conflict("BestAnswer", id.to_string()));
        }

        let mut record = Self::to_record(&answers[pos]);
        record.best_answer = best;
        answers[pos] = Answer::from_db(record);
        Ok(())
    }

    async fn adjust_score(
        &self,
        _tx: &mut TxContext,
        id: &AnswerId,
        delta: i64,
    ) -> Result<(), InfraError> {
        let mut answers = self.answers.lock().unwrap();
        if let Some(pos) = answers.iter().position(|a| a.id() == id) {
            let mut record = Self::to_record(&answers[pos]);
            record.score += delta;
            answers[pos] = Answer::from_db(record);
        }
        Ok(())
    }
}

// ===== MockVoteRepository =====

#[derive(Clone, Default)]
pub struct MockVoteRepository {
    votes: Arc<Mutex<Vec<Vote>>>,
}

impl MockVoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みの投票をすべて返す
    pub fn votes(&self) -> Vec<Vote> {
        self.votes.lock().unwrap().clone()
    }

    fn tally_of(&self, votable: &Votable) -> VoteTally {
        VoteTally::from_directions(
            self.votes
                .lock()
                .unwrap()
                .iter()
                .filter(|v| v.votable() == votable)
                .map(|v| v.direction()),
        )
    }
}

#[async_trait]
impl VoteRepository for MockVoteRepository {
    async fn insert(&self, _tx: &mut TxContext, vote: &Vote) -> Result<(), InfraError> {
        let mut votes = self.votes.lock().unwrap();
        if votes
            .iter()
            .any(|v| v.voter_id() == vote.voter_id() && v.votable() == vote.votable())
        {
            return Err(InfraError::conflict("Vote", vote.votable().to_string()));
        }
        votes.push(vote.clone());
        Ok(())
    }

    async fn find_by_voter_in_tx(
        &self,
        _tx: &mut TxContext,
        voter_id: &UserId,
        votable: &Votable,
    ) -> Result<Option<Vote>, InfraError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.voter_id() == voter_id && v.votable() == votable)
            .cloned())
    }

    async fn tally_in_tx(
        &self,
        _tx: &mut TxContext,
        votable: &Votable,
    ) -> Result<VoteTally, InfraError> {
        Ok(self.tally_of(votable))
    }

    async fn tally(&self, votable: &Votable) -> Result<VoteTally, InfraError> {
        Ok(self.tally_of(votable))
    }

    async fn delete_for(
        &self,
        _tx: &mut TxContext,
        votables: &[Votable],
    ) -> Result<(), InfraError> {
        self.votes
            .lock()
            .unwrap()
            .retain(|v| !votables.contains(v.votable()));
        Ok(())
    }
}
