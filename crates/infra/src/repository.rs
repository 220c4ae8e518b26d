//! # リポジトリ実装
//!
//! エンティティの永続化を担当するリポジトリのトレイトと PostgreSQL 実装。
//!
//! ## 設計方針
//!
//! - **書き込みは `&mut TxContext` 必須**: トランザクション外の書き込みを型で防ぐ
//! - **行ロック**: `find_for_update` 系メソッドは `SELECT ... FOR UPDATE` で
//!   投票・ベストアンサー選択を対象行ごとに直列化する
//! - **一意制約は `Conflict` に変換**: 重複検出の最終防衛線は DB 制約
//! - **テスタビリティ**: トレイト経由でモック可能（[`crate::mock`]）

pub mod access_token_repository;
pub mod answer_repository;
pub mod question_repository;
pub mod user_repository;
pub mod vote_repository;

pub use access_token_repository::{AccessTokenRepository, PostgresAccessTokenRepository};
pub use answer_repository::{AnswerRepository, PostgresAnswerRepository};
pub use question_repository::{PostgresQuestionRepository, QuestionRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
pub use vote_repository::{PostgresVoteRepository, VoteRepository};
