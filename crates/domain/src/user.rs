//! # ユーザー
//!
//! フォーラム利用者のエンティティと値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: 変更は `with_*` メソッドで新しい値を返す
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use forum_domain::{
//!     password::PasswordHash,
//!     user::{Email, NewUser, User, UserId, UserName},
//! };
//!
//! let user = User::new(NewUser {
//!     id:            UserId::new(),
//!     name:          UserName::new("山田太郎")?,
//!     email:         Email::new("taro@example.com")?,
//!     password_hash: PasswordHash::new("$argon2id$..."),
//!     now:           chrono::Utc::now(),
//! });
//! assert_eq!(user.email().as_str(), "taro@example.com");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::{DomainError, password::PasswordHash};

define_uuid_id! {
    /// ユーザー ID（UUID v7）
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー表示名（1〜255 文字）
    pub struct UserName {
        label: "ユーザー名",
        max_length: 255,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
/// 比較のため小文字に正規化して保持する。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_lowercase();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `email` はシステム全体で一意（DB の一意制約で保証）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:            UserId,
    name:          UserName,
    email:         Email,
    password_hash: PasswordHash,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

/// ユーザーの新規作成パラメータ
pub struct NewUser {
    pub id:            UserId,
    pub name:          UserName,
    pub email:         Email,
    pub password_hash: PasswordHash,
    pub now:           DateTime<Utc>,
}

/// ユーザーの DB 復元パラメータ
pub struct UserRecord {
    pub id:            UserId,
    pub name:          UserName,
    pub email:         Email,
    pub password_hash: PasswordHash,
    pub created_at:    DateTime<Utc>,
    pub updated_at:    DateTime<Utc>,
}

impl User {
    pub fn new(params: NewUser) -> Self {
        Self {
            id:            params.id,
            name:          params.name,
            email:         params.email,
            password_hash: params.password_hash,
            created_at:    params.now,
            updated_at:    params.now,
        }
    }

    pub fn from_db(record: UserRecord) -> Self {
        Self {
            id:            record.id,
            name:          record.name,
            email:         record.email,
            password_hash: record.password_hash,
            created_at:    record.created_at,
            updated_at:    record.updated_at,
        }
    }

    /// 表示名とメールアドレスを更新した新しいインスタンスを返す
    pub fn with_profile(self, name: UserName, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            name,
            email,
            updated_at: now,
            ..self
        }
    }

    /// パスワードハッシュを差し替えた新しいインスタンスを返す
    pub fn with_password_hash(self, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            password_hash,
            updated_at: now,
            ..self
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[fixture]
    fn user(now: DateTime<Utc>) -> User {
        User::new(NewUser {
            id: UserId::new(),
            name: UserName::new("山田太郎").unwrap(),
            email: Email::new("taro@example.com").unwrap(),
            password_hash: PasswordHash::new("$argon2id$v=19$..."),
            now,
        })
    }

    mod email {
        use super::*;
        use pretty_assertions::assert_eq;

        #[rstest]
        fn test_大文字は小文字に正規化される() {
            let email = Email::new(" Taro@Example.COM ").unwrap();
            assert_eq!(email.as_str(), "taro@example.com");
        }

        #[rstest]
        #[case("")]
        #[case("taro")]
        #[case("@example.com")]
        #[case("taro@")]
        #[case("a@b@c")]
        fn test_不正な形式はエラー(#[case] input: &str) {
            assert!(Email::new(input).is_err());
        }
    }

    mod user_name {
        use super::*;

        #[rstest]
        fn test_空白のみはエラー() {
            assert!(UserName::new("   ").is_err());
        }

        #[rstest]
        fn test_256文字はエラー() {
            assert!(UserName::new("a".repeat(256)).is_err());
        }
    }

    #[rstest]
    fn test_with_profileは名前とメールとupdated_atを更新する(user: User, now: DateTime<Utc>) {
        let later = now + chrono::Duration::minutes(5);
        let id = user.id().clone();

        let sut = user.with_profile(
            UserName::new("山田花子").unwrap(),
            Email::new("hanako@example.com").unwrap(),
            later,
        );

        assert_eq!(sut.id(), &id);
        assert_eq!(sut.name().as_str(), "山田花子");
        assert_eq!(sut.email().as_str(), "hanako@example.com");
        assert_eq!(sut.created_at(), now);
        assert_eq!(sut.updated_at(), later);
    }

    #[rstest]
    fn test_with_password_hashはハッシュのみ差し替える(user: User, now: DateTime<Utc>) {
        let name = user.name().clone();

        let sut = user.with_password_hash(PasswordHash::new("$argon2id$new"), now);

        assert_eq!(sut.password_hash().as_str(), "$argon2id$new");
        assert_eq!(sut.name(), &name);
    }
}
