//! # Forum ドメイン層
//!
//! Q&A フォーラムのビジネスルールを担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Question, Answer）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Slug,
//!   VoteDirection）
//! - **ドメインサービス**: 投票集計、ベストアンサーの状態遷移、認可ポリシー
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、HTTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`vote`] - 投票台帳（1 ユーザー 1 票）と集計
//! - [`best_answer`] - ベストアンサー枠の状態機械
//! - [`authorization`] - 「誰が何をできるか」の判定
//! - [`question`] / [`answer`] - 質問と回答のエンティティ
//! - [`user`] / [`password`] / [`access_token`] - ユーザーと認証情報
//!
//! ## 使用例
//!
//! ```rust
//! use forum_domain::{DomainError, vote::VoteDirection};
//!
//! let direction: VoteDirection = "up".parse().unwrap();
//! assert_eq!(direction.delta(), 1);
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Question",
//!     id:          "how-to-borrow".to_string(),
//! };
//! assert!(error.to_string().contains("Question"));
//! ```

#[macro_use]
mod macros;

pub mod access_token;
pub mod answer;
pub mod authorization;
pub mod best_answer;
pub mod clock;
pub mod error;
pub mod password;
pub mod question;
pub mod user;
pub mod vote;

pub use error::DomainError;
