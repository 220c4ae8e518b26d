//! フォーラムテストビルダー
//!
//! テストコードの重複を削減するためのビルダーパターン実装。
//! 標準的なテストデータとモックリポジトリのセットアップを提供する。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forum_domain::{
    answer::{Answer, AnswerBody, AnswerId, NewAnswer},
    authorization::OwnershipPolicy,
    clock::FixedClock,
    question::{NewQuestion, Question, QuestionBody, QuestionId, QuestionTitle, Tags},
    user::UserId,
};
use forum_infra::{
    Argon2PasswordChecker,
    mock::{
        MockAccessTokenRepository,
        MockAnswerRepository,
        MockQuestionRepository,
        MockTransactionManager,
        MockUserRepository,
        MockVoteRepository,
    },
};

use crate::{
    app_builder::AppDependencies,
    usecase::{
        AnswerUseCaseImpl,
        AuthUseCaseImpl,
        BestAnswerUseCaseImpl,
        QuestionUseCaseImpl,
        VoteUseCaseImpl,
    },
};

/// フォーラムテストのセットアップデータ
///
/// ForumTestBuilder が生成する SUT と Mock リポジトリのセット。
/// Mock は内部で状態を共有しているため、ここから初期データを投入すると
/// SUT からも見える。
pub struct ForumTestSetup {
    pub auth:          AuthUseCaseImpl,
    pub questions:     QuestionUseCaseImpl,
    pub answers:       AnswerUseCaseImpl,
    pub votes:         VoteUseCaseImpl,
    pub best_answers:  BestAnswerUseCaseImpl,
    pub user_repo:     MockUserRepository,
    pub token_repo:    MockAccessTokenRepository,
    pub question_repo: MockQuestionRepository,
    pub answer_repo:   MockAnswerRepository,
    pub vote_repo:     MockVoteRepository,
    /// ルーター構築用の依存（同じ Mock を共有する）
    pub deps:          AppDependencies,
}

/// フォーラムテストビルダー
///
/// # 使用例
///
/// ```ignore
/// use forum_api::test_utils::ForumTestBuilder;
///
/// #[tokio::test]
/// async fn test_example() {
///     let builder = ForumTestBuilder::new();
///     let setup = builder.build();
///     let question = builder.build_question(&UserId::new(), "What is ownership?");
///     setup.question_repo.add_question(question.clone());
///
///     let result = setup.questions.show("what-is-ownership").await;
/// }
/// ```
#[derive(Clone)]
pub struct ForumTestBuilder {
    now:        DateTime<Utc>,
    serialized: bool,
}

impl ForumTestBuilder {
    /// デフォルト値で新しいビルダーを作成
    pub fn new() -> Self {
        Self {
            now:        Utc::now(),
            serialized: false,
        }
    }

    /// 現在時刻を指定
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// トランザクションを 1 つずつしか開始できないようにする
    ///
    /// PostgreSQL の行ロックによる直列化を再現し、並行テストで使用する。
    pub fn serialized(mut self) -> Self {
        self.serialized = true;
        self
    }

    /// ビルダーの now を取得
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// テスト用の質問を作成する（スラッグはタイトルから導出）
    pub fn build_question(&self, author: &UserId, title: &str) -> Question {
        Question::new(NewQuestion {
            id:      QuestionId::new(),
            user_id: author.clone(),
            title:   QuestionTitle::new(title).unwrap(),
            body:    QuestionBody::new(format!("{} の本文", title)).unwrap(),
            tags:    Tags::default(),
            now:     self.now,
        })
        .unwrap()
    }

    /// テスト用の回答を作成する
    pub fn build_answer(&self, question: &Question, author: &UserId, body: &str) -> Answer {
        Answer::new(NewAnswer {
            id:          AnswerId::new(),
            question_id: question.id().clone(),
            user_id:     author.clone(),
            body:        AnswerBody::new(body).unwrap(),
            now:         self.now,
        })
    }

    /// Mock リポジトリとユースケースを組み立てる
    pub fn build(&self) -> ForumTestSetup {
        let user_repo = MockUserRepository::new();
        let token_repo = MockAccessTokenRepository::new();
        let question_repo = MockQuestionRepository::new();
        let answer_repo = MockAnswerRepository::new();
        let vote_repo = MockVoteRepository::new();
        let tx_manager = if self.serialized {
            MockTransactionManager::serialized()
        } else {
            MockTransactionManager::new()
        };

        let deps = AppDependencies {
            user_repo:         Arc::new(user_repo.clone()),
            access_token_repo: Arc::new(token_repo.clone()),
            question_repo:     Arc::new(question_repo.clone()),
            answer_repo:       Arc::new(answer_repo.clone()),
            vote_repo:         Arc::new(vote_repo.clone()),
            password_checker:  Arc::new(Argon2PasswordChecker::new()),
            policy:            Arc::new(OwnershipPolicy),
            tx_manager:        Arc::new(tx_manager),
            clock:             Arc::new(FixedClock::new(self.now)),
        };

        ForumTestSetup {
            auth: deps.auth_usecase(),
            questions: deps.question_usecase(),
            answers: deps.answer_usecase(),
            votes: deps.vote_usecase(),
            best_answers: deps.best_answer_usecase(),
            user_repo,
            token_repo,
            question_repo,
            answer_repo,
            vote_repo,
            deps,
        }
    }
}

impl Default for ForumTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
