//! テストユーティリティ
//!
//! ユースケースとルーターのテストで共有するセットアップ。

mod forum_test_builder;

pub use forum_test_builder::{ForumTestBuilder, ForumTestSetup};
