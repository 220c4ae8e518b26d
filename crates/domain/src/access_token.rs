//! # アクセストークン
//!
//! ログイン時に発行し、`Authorization: Bearer <token>` で提示される不透明なトークン。
//! トークン文字列はランダムな UUID v4 を 2 つ連結したもの（244 bit のエントロピー）。

use chrono::{DateTime, Utc};

use crate::user::UserId;

/// アクセストークン文字列
///
/// Debug 出力ではマスクする。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessTokenValue(String);

impl std::fmt::Debug for AccessTokenValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessTokenValue").field(&"[REDACTED]").finish()
    }
}

impl AccessTokenValue {
    /// 新しいトークン文字列を生成する
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// 提示された文字列からトークンを復元する
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 発行済みアクセストークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    token:      AccessTokenValue,
    user_id:    UserId,
    created_at: DateTime<Utc>,
}

impl AccessToken {
    /// ユーザーに新しいトークンを発行する
    pub fn issue(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            token: AccessTokenValue::generate(),
            user_id,
            created_at: now,
        }
    }

    pub fn from_db(token: AccessTokenValue, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            token,
            user_id,
            created_at,
        }
    }

    pub fn token(&self) -> &AccessTokenValue {
        &self.token
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
