//! # ベストアンサー枠
//!
//! 質問ごとに最大 1 件のベストアンサーを保持する状態機械。
//!
//! ```text
//! NoneSelected ──select(a)──▶ Selected(a) ──select(b)──▶ Selected(b)
//!                                  │
//!                                  └──select(a)──▶ Selected(a)（変化なし）
//! ```
//!
//! `Selected` から `NoneSelected` へ戻る遷移はない。

use crate::answer::AnswerId;

/// 質問のベストアンサー枠の現在状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestAnswerSlot {
    /// まだ選ばれていない
    NoneSelected,
    /// 選択済み
    Selected(AnswerId),
}

/// ベストアンサー選択の結果として必要な書き込み
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestAnswerTransition {
    /// すでに同じ回答が選ばれている（書き込み不要）
    AlreadyBest,
    /// `clear` のフラグを外し、`set` にフラグを立てる
    Select {
        clear: Option<AnswerId>,
        set:   AnswerId,
    },
}

impl BestAnswerSlot {
    pub fn from_current(current: Option<AnswerId>) -> Self {
        match current {
            Some(id) => Self::Selected(id),
            None => Self::NoneSelected,
        }
    }

    /// `target` をベストアンサーにするための遷移を決定する
    pub fn transition(&self, target: &AnswerId) -> BestAnswerTransition {
        match self {
            Self::Selected(current) if current == target => BestAnswerTransition::AlreadyBest,
            Self::Selected(current) => BestAnswerTransition::Select {
                clear: Some(current.clone()),
                set:   target.clone(),
            },
            Self::NoneSelected => BestAnswerTransition::Select {
                clear: None,
                set:   target.clone(),
            },
        }
    }

    /// 遷移後の状態
    pub fn apply(self, transition: &BestAnswerTransition) -> Self {
        match transition {
            BestAnswerTransition::AlreadyBest => self,
            BestAnswerTransition::Select { set, .. } => Self::Selected(set.clone()),
        }
    }
}
