//! # 回答
//!
//! 質問に対する回答エンティティ。
//!
//! `best_answer` フラグの切り替えは [`crate::best_answer`] の状態遷移に従い、
//! 同じ質問の中で最大 1 件だけが `true` になる。

use chrono::{DateTime, Utc};

use crate::{question::QuestionId, user::UserId};

define_uuid_id! {
    /// 回答 ID（UUID v7）
    pub struct AnswerId;
}

define_validated_string! {
    /// 回答本文（1〜20,000 文字）
    pub struct AnswerBody {
        label: "本文",
        max_length: 20_000,
    }
}

/// 回答エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    id:          AnswerId,
    question_id: QuestionId,
    user_id:     UserId,
    body:        AnswerBody,
    score:       i64,
    best_answer: bool,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

/// 回答の新規作成パラメータ
pub struct NewAnswer {
    pub id:          AnswerId,
    pub question_id: QuestionId,
    pub user_id:     UserId,
    pub body:        AnswerBody,
    pub now:         DateTime<Utc>,
}

/// 回答の DB 復元パラメータ
pub struct AnswerRecord {
    pub id:          AnswerId,
    pub question_id: QuestionId,
    pub user_id:     UserId,
    pub body:        AnswerBody,
    pub score:       i64,
    pub best_answer: bool,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

impl Answer {
    /// 新しい回答を作成する（スコア 0、ベストアンサーではない）
    pub fn new(params: NewAnswer) -> Self {
        Self {
            id:          params.id,
            question_id: params.question_id,
            user_id:     params.user_id,
            body:        params.body,
            score:       0,
            best_answer: false,
            created_at:  params.now,
            updated_at:  params.now,
        }
    }

    pub fn from_db(record: AnswerRecord) -> Self {
        Self {
            id:          record.id,
            question_id: record.question_id,
            user_id:     record.user_id,
            body:        record.body,
            score:       record.score,
            best_answer: record.best_answer,
            created_at:  record.created_at,
            updated_at:  record.updated_at,
        }
    }

    /// 本文を差し替えた新しいインスタンスを返す
    pub fn with_body(self, body: AnswerBody, now: DateTime<Utc>) -> Self {
        Self {
            body,
            updated_at: now,
            ..self
        }
    }

    /// 指定ユーザーが作成者かどうか
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    // Getter メソッド

    pub fn id(&self) -> &AnswerId {
        &self.id
    }

    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn body(&self) -> &AnswerBody {
        &self.body
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn is_best_answer(&self) -> bool {
        self.best_answer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
