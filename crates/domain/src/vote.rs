//! # 投票台帳
//!
//! 質問・回答への up / down 投票を表現する。
//!
//! ## ルール
//!
//! - 1 ユーザーは 1 つの投票対象に対して 1 票だけ投じられる（方向を問わない）
//! - 投票は追記のみで、変更・取り消しはできない
//! - 純投票数（up 票数 − down 票数）が権威ある値で、
//!   エンティティの `score` はそのキャッシュ
//!
//! ## 使用例
//!
//! ```rust
//! use forum_domain::vote::{VoteDirection, VoteTally};
//!
//! let tally = VoteTally::from_directions([
//!     VoteDirection::Up,
//!     VoteDirection::Up,
//!     VoteDirection::Down,
//! ]);
//! assert_eq!(tally.net(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, answer::AnswerId, question::QuestionId, user::UserId};

define_uuid_id! {
    /// 投票 ID（UUID v7）
    pub struct VoteId;
}

/// 投票方向
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// スコアへの寄与（up: +1 / down: −1）
    pub fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl std::str::FromStr for VoteDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(DomainError::Validation(format!("不正な投票方向: {}", s))),
        }
    }
}

/// 投票対象の種別（DB の `votable_type` 列）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VotableKind {
    Question,
    Answer,
}

impl std::str::FromStr for VotableKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(Self::Question),
            "answer" => Ok(Self::Answer),
            _ => Err(DomainError::Validation(format!("不正な投票対象種別: {}", s))),
        }
    }
}

/// 投票対象
///
/// 質問と回答のどちらにも投票できる。種別ごとに ID 型を分けて保持するため、
/// 取り違えはコンパイル時に検出される。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Votable {
    Question(QuestionId),
    Answer(AnswerId),
}

impl Votable {
    /// DB の (`votable_type`, `votable_id`) から復元する
    pub fn from_parts(kind: VotableKind, id: uuid::Uuid) -> Self {
        match kind {
            VotableKind::Question => Self::Question(QuestionId::from_uuid(id)),
            VotableKind::Answer => Self::Answer(AnswerId::from_uuid(id)),
        }
    }

    pub fn kind(&self) -> VotableKind {
        match self {
            Self::Question(_) => VotableKind::Question,
            Self::Answer(_) => VotableKind::Answer,
        }
    }

    pub fn id(&self) -> &uuid::Uuid {
        match self {
            Self::Question(id) => id.as_uuid(),
            Self::Answer(id) => id.as_uuid(),
        }
    }
}

impl std::fmt::Display for Votable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// 投票エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    id:         VoteId,
    voter_id:   UserId,
    votable:    Votable,
    direction:  VoteDirection,
    created_at: DateTime<Utc>,
}

/// 投票の DB 復元パラメータ
pub struct VoteRecord {
    pub id:         VoteId,
    pub voter_id:   UserId,
    pub votable:    Votable,
    pub direction:  VoteDirection,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    /// 新しい投票を作成する
    pub fn cast(
        voter_id: UserId,
        votable: Votable,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VoteId::new(),
            voter_id,
            votable,
            direction,
            created_at: now,
        }
    }

    pub fn from_db(record: VoteRecord) -> Self {
        Self {
            id:         record.id,
            voter_id:   record.voter_id,
            votable:    record.votable,
            direction:  record.direction,
            created_at: record.created_at,
        }
    }

    pub fn id(&self) -> &VoteId {
        &self.id
    }

    pub fn voter_id(&self) -> &UserId {
        &self.voter_id
    }

    pub fn votable(&self) -> &Votable {
        &self.votable
    }

    pub fn direction(&self) -> VoteDirection {
        self.direction
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 投票集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub up:   i64,
    pub down: i64,
}

impl VoteTally {
    pub fn new(up: i64, down: i64) -> Self {
        Self { up, down }
    }

    pub fn from_directions(directions: impl IntoIterator<Item = VoteDirection>) -> Self {
        directions
            .into_iter()
            .fold(Self::default(), |tally, direction| match direction {
                VoteDirection::Up => Self {
                    up: tally.up + 1,
                    ..tally
                },
                VoteDirection::Down => Self {
                    down: tally.down + 1,
                    ..tally
                },
            })
    }

    /// 純投票数（up − down）
    pub fn net(&self) -> i64 {
        self.up - self.down
    }
}
