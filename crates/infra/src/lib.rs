//! # Forum インフラ層
//!
//! PostgreSQL との接続・永続化とパスワードハッシュを担当する。
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、マイグレーション、トランザクション境界
//! - [`error`] - インフラ層エラー定義
//! - [`password`] - Argon2id によるハッシュ化と検証
//! - [`repository`] - リポジトリのトレイトと PostgreSQL 実装
//! - `mock` - インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use forum_infra::{db, repository::PostgresQuestionRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/forum").await?;
//!     db::run_migrations(&pool).await?;
//!     let questions = PostgresQuestionRepository::new(pool.clone());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod password;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use password::{Argon2PasswordChecker, PasswordChecker};
