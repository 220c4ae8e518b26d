//! 投票とベストアンサーの利用シナリオテスト
//!
//! ForumTestBuilder で Mock リポジトリを組み立て、複数ユーザーの操作を
//! 順に実行したときの状態を確認する。

use forum_api::{
    error::CoreError,
    test_utils::ForumTestBuilder,
    usecase::CastVoteInput,
};
use forum_domain::{user::UserId, vote::Votable};
use pretty_assertions::assert_eq;

fn up(votable: &Votable) -> CastVoteInput {
    CastVoteInput {
        votable:   votable.clone(),
        direction: "up".to_string(),
    }
}

fn down(votable: &Votable) -> CastVoteInput {
    CastVoteInput {
        votable:   votable.clone(),
        direction: "down".to_string(),
    }
}

#[tokio::test]
async fn test_3人の投票でスコアと純投票数が一致する() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let author = UserId::new();
    let (alice, bob, carol) = (UserId::new(), UserId::new(), UserId::new());
    let question = builder.build_question(&author, "Why does the borrow checker complain?");
    setup.question_repo.add_question(question.clone());
    let votable = Votable::Question(question.id().clone());

    // Act & Assert
    let outcome = setup.votes.cast_vote(&alice, up(&votable)).await.unwrap();
    assert_eq!(outcome.votes_count, 1);
    assert_eq!(outcome.score, 1);

    let outcome = setup.votes.cast_vote(&bob, down(&votable)).await.unwrap();
    assert_eq!(outcome.votes_count, 0);
    assert_eq!(outcome.question.question.score(), 0);

    let result = setup.votes.cast_vote(&alice, down(&votable)).await;
    assert!(matches!(result, Err(CoreError::DuplicateVote(_))));

    let outcome = setup.votes.cast_vote(&carol, up(&votable)).await.unwrap();
    assert_eq!(outcome.votes_count, 1);
    assert_eq!(outcome.score, 1);

    assert_eq!(setup.votes.net_votes(&votable).await.unwrap(), 1);
    assert_eq!(setup.vote_repo.votes().len(), 3);
}

#[tokio::test]
async fn test_回答への投票は質問のスコアに影響しない() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let author = UserId::new();
    let question = builder.build_question(&author, "How to share state between tasks?");
    let answer = builder.build_answer(&question, &UserId::new(), "Use Arc<Mutex<T>>");
    setup.question_repo.add_question(question.clone());
    setup.answer_repo.add_answer(answer.clone());
    let votable = Votable::Answer(answer.id().clone());

    // Act
    setup
        .votes
        .cast_vote(&UserId::new(), up(&votable))
        .await
        .unwrap();
    let outcome = setup
        .votes
        .cast_vote(&UserId::new(), up(&votable))
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.score, 2);
    assert_eq!(outcome.votes_count, 2);
    assert_eq!(outcome.question.question.score(), 0);
    assert_eq!(outcome.question.answers[0].score(), 2);
}

#[tokio::test]
async fn test_ベストアンサーを付け替えると旧回答のフラグが外れる() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let owner = UserId::new();
    let question = builder.build_question(&owner, "Which async runtime should I use?");
    let first = builder.build_answer(&question, &UserId::new(), "tokio");
    let second = builder.build_answer(&question, &UserId::new(), "async-std");
    setup.question_repo.add_question(question.clone());
    setup.answer_repo.add_answer(first.clone());
    setup.answer_repo.add_answer(second.clone());

    // Act
    let outcome = setup.best_answers.mark_best(&owner, first.id()).await.unwrap();
    assert!(!outcome.already_best);
    assert_eq!(outcome.question.best_answer().unwrap().id(), first.id());

    let outcome = setup
        .best_answers
        .mark_best(&owner, second.id())
        .await
        .unwrap();

    // Assert
    assert!(!outcome.already_best);
    let bests: Vec<_> = outcome
        .question
        .answers
        .iter()
        .filter(|a| a.is_best_answer())
        .collect();
    assert_eq!(bests.len(), 1);
    assert_eq!(bests[0].id(), second.id());
}

#[tokio::test]
async fn test_同じ回答を再度選ぶとalready_bestになり状態は変わらない() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let owner = UserId::new();
    let question = builder.build_question(&owner, "What is a trait object?");
    let answer = builder.build_answer(&question, &UserId::new(), "dyn Trait");
    setup.question_repo.add_question(question.clone());
    setup.answer_repo.add_answer(answer.clone());
    let before = setup.best_answers.mark_best(&owner, answer.id()).await.unwrap();

    // Act
    let after = setup.best_answers.mark_best(&owner, answer.id()).await.unwrap();

    // Assert
    assert!(after.already_best);
    assert_eq!(after.question, before.question);
}

#[tokio::test]
async fn test_質問の作成者以外はベストアンサーを選べない() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let owner = UserId::new();
    let answerer = UserId::new();
    let question = builder.build_question(&owner, "How do I read a file?");
    let answer = builder.build_answer(&question, &answerer, "std::fs::read_to_string");
    setup.question_repo.add_question(question.clone());
    setup.answer_repo.add_answer(answer.clone());

    // Act
    let result = setup.best_answers.mark_best(&answerer, answer.id()).await;

    // Assert
    assert!(matches!(result, Err(CoreError::Forbidden(_))));
    let shown = setup.answers.show(answer.id()).await.unwrap();
    assert!(!shown.answer.is_best_answer());
}

#[tokio::test]
async fn test_ベストアンサーの回答を削除すると未選択に戻る() {
    // Arrange
    let builder = ForumTestBuilder::new();
    let setup = builder.build();
    let owner = UserId::new();
    let answerer = UserId::new();
    let question = builder.build_question(&owner, "Is unsafe ever okay?");
    let answer = builder.build_answer(&question, &answerer, "Sometimes");
    setup.question_repo.add_question(question.clone());
    setup.answer_repo.add_answer(answer.clone());
    setup.best_answers.mark_best(&owner, answer.id()).await.unwrap();

    // Act
    let remaining = setup.answers.delete(&answerer, answer.id()).await.unwrap();

    // Assert
    assert!(remaining.answers.is_empty());
    assert_eq!(remaining.best_answer(), None);
}
