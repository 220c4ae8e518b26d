//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - 操作者は認証ミドルウェアが格納した `AuthenticatedUser` から受け取る

pub mod answer;
pub mod auth;
pub mod best_answer;
pub mod health;
pub mod question;
pub mod vote;

pub use answer::{AnswerState, create_answer, delete_answer, show_answer, update_answer};
pub use auth::{
    AuthState,
    login,
    logout,
    me,
    register,
    update_password,
    update_profile,
};
pub use best_answer::{BestAnswerState, mark_best_answer};
pub use health::health_check;
pub use question::{
    QuestionState,
    create_question,
    delete_question,
    list_my_questions,
    list_questions,
    list_questions_by_tag,
    list_questions_by_user,
    show_question,
    update_question,
};
pub use vote::{VoteState, vote_answer, vote_question};
