//! # ミドルウェア
//!
//! - `auth`: Bearer トークンによる認証

pub mod auth;

pub use auth::{AuthenticatedUser, AuthnState, require_auth};
