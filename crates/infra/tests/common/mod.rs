//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use forum_domain::{
    answer::{Answer, AnswerBody, AnswerId, NewAnswer},
    password::PasswordHash,
    question::{NewQuestion, Question, QuestionBody, QuestionId, QuestionTitle, Tags},
    user::{Email, NewUser, User, UserId, UserName},
};
use forum_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{
        AnswerRepository,
        PostgresAnswerRepository,
        PostgresQuestionRepository,
        PostgresUserRepository,
        QuestionRepository,
        UserRepository,
    },
};
use sqlx::PgPool;

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn build_user(email: &str) -> User {
    User::new(NewUser {
        id:            UserId::new(),
        name:          UserName::new("テストユーザー").unwrap(),
        email:         Email::new(email).unwrap(),
        password_hash: PasswordHash::new("$argon2id$v=19$m=65536,t=1,p=1$dGVzdA$dGVzdA"),
        now:           test_now(),
    })
}

pub fn build_question(user_id: &UserId, title: &str, tags: &str) -> Question {
    Question::new(NewQuestion {
        id:      QuestionId::new(),
        user_id: user_id.clone(),
        title:   QuestionTitle::new(title).unwrap(),
        body:    QuestionBody::new("本文").unwrap(),
        tags:    Tags::parse(tags).unwrap(),
        now:     test_now(),
    })
    .unwrap()
}

pub fn build_answer(question_id: &QuestionId, user_id: &UserId) -> Answer {
    Answer::new(NewAnswer {
        id:          AnswerId::new(),
        question_id: question_id.clone(),
        user_id:     user_id.clone(),
        body:        AnswerBody::new("回答").unwrap(),
        now:         test_now(),
    })
}

/// ユーザーを 1 件コミットして返す
pub async fn insert_user(pool: &PgPool, email: &str) -> User {
    let user = build_user(email);
    let tx_manager = PgTransactionManager::new(pool.clone());
    let mut tx = tx_manager.begin().await.unwrap();
    PostgresUserRepository::new(pool.clone())
        .insert(&mut tx, &user)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    user
}

/// 質問を 1 件コミットして返す
pub async fn insert_question(pool: &PgPool, user_id: &UserId, title: &str) -> Question {
    let question = build_question(user_id, title, "rust");
    let tx_manager = PgTransactionManager::new(pool.clone());
    let mut tx = tx_manager.begin().await.unwrap();
    PostgresQuestionRepository::new(pool.clone())
        .insert(&mut tx, &question)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    question
}

/// 回答を 1 件コミットして返す
pub async fn insert_answer(pool: &PgPool, question_id: &QuestionId, user_id: &UserId) -> Answer {
    let answer = build_answer(question_id, user_id);
    let tx_manager = PgTransactionManager::new(pool.clone());
    let mut tx = tx_manager.begin().await.unwrap();
    PostgresAnswerRepository::new(pool.clone())
        .insert(&mut tx, &answer)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    answer
}
