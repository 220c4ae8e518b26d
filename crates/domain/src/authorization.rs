//! # 認可ポリシー
//!
//! 「誰が・どのリソースに・何をできるか」を判定する。
//!
//! | アクション | 質問 | 回答 |
//! |-----------|------|------|
//! | `Update` / `Delete` | 質問の作成者 | 回答の作成者 |
//! | `MarkAsBest` | 不可 | 回答が属する質問の作成者 |
//!
//! ユースケース層はリソースを読み込んだ後、書き込みの前にポリシーを参照する。

use crate::{answer::Answer, question::Question, user::UserId};

/// 認可対象のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Update,
    Delete,
    MarkAsBest,
}

/// 認可対象のリソース
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Question(&'a Question),
    /// 回答は親の質問と組で判定する（ベストアンサーは質問の作成者が決める）
    Answer {
        answer:   &'a Answer,
        question: &'a Question,
    },
}

/// 認可ポリシー
pub trait Policy: Send + Sync {
    fn can(&self, user_id: &UserId, action: Action, resource: Resource<'_>) -> bool;
}

/// 作成者ベースのポリシー
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy;

impl Policy for OwnershipPolicy {
    fn can(&self, user_id: &UserId, action: Action, resource: Resource<'_>) -> bool {
        match (action, resource) {
            (Action::Update | Action::Delete, Resource::Question(question)) => {
                question.is_authored_by(user_id)
            }
            (Action::Update | Action::Delete, Resource::Answer { answer, .. }) => {
                answer.is_authored_by(user_id)
            }
            (Action::MarkAsBest, Resource::Answer { question, .. }) => {
                question.is_authored_by(user_id)
            }
            (Action::MarkAsBest, Resource::Question(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        answer::{AnswerBody, AnswerId, NewAnswer},
        question::{NewQuestion, QuestionBody, QuestionId, QuestionTitle, Tags},
    };

    struct Fixture {
        question_author: UserId,
        answer_author:   UserId,
        question:        Question,
        answer:          Answer,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let question_author = UserId::new();
        let answer_author = UserId::new();
        let question = Question::new(NewQuestion {
            id:      QuestionId::new(),
            user_id: question_author.clone(),
            title:   QuestionTitle::new("Title").unwrap(),
            body:    QuestionBody::new("本文").unwrap(),
            tags:    Tags::default(),
            now:     Utc::now(),
        })
        .unwrap();
        let answer = Answer::new(NewAnswer {
            id:          AnswerId::new(),
            question_id: question.id().clone(),
            user_id:     answer_author.clone(),
            body:        AnswerBody::new("回答").unwrap(),
            now:         Utc::now(),
        });
        Fixture {
            question_author,
            answer_author,
            question,
            answer,
        }
    }

    #[rstest]
    #[case(Action::Update)]
    #[case(Action::Delete)]
    fn test_質問の編集と削除は作成者のみ(fixture: Fixture, #[case] action: Action) {
        let sut = OwnershipPolicy;
        let resource = Resource::Question(&fixture.question);

        assert!(sut.can(&fixture.question_author, action, resource));
        assert!(!sut.can(&fixture.answer_author, action, resource));
    }

    #[rstest]
    #[case(Action::Update)]
    #[case(Action::Delete)]
    fn test_回答の編集と削除は回答の作成者のみ(fixture: Fixture, #[case] action: Action) {
        let sut = OwnershipPolicy;
        let resource = Resource::Answer {
            answer:   &fixture.answer,
            question: &fixture.question,
        };

        assert!(sut.can(&fixture.answer_author, action, resource));
        assert!(!sut.can(&fixture.question_author, action, resource));
    }

    #[rstest]
    fn test_ベストアンサー選択は質問の作成者のみ(fixture: Fixture) {
        let sut = OwnershipPolicy;
        let resource = Resource::Answer {
            answer:   &fixture.answer,
            question: &fixture.question,
        };

        assert!(sut.can(&fixture.question_author, Action::MarkAsBest, resource));
        assert!(!sut.can(&fixture.answer_author, Action::MarkAsBest, resource));
        assert!(!sut.can(&UserId::new(), Action::MarkAsBest, resource));
    }

    #[rstest]
    fn test_質問そのものはベストアンサーにできない(fixture: Fixture) {
        let sut = OwnershipPolicy;

        assert!(!sut.can(
            &fixture.question_author,
            Action::MarkAsBest,
            Resource::Question(&fixture.question)
        ));
    }
}
