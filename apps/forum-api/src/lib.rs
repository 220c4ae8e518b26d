//! # Forum API ライブラリ
//!
//! Q&A フォーラムのユースケース・ハンドラ・ルーターを公開する。
//! `main.rs` と統合テストの両方から利用する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
