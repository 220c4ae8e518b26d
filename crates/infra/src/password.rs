//! # パスワードハッシュ
//!
//! Argon2id によるパスワードのハッシュ化と検証を提供する。
//!
//! ハッシュは PHC 文字列形式（`$argon2id$v=19$m=...`）で保存するため、
//! パラメータを変更しても既存ハッシュの検証は継続できる。

use argon2::{
    Argon2,
    Params,
    PasswordHasher as _,
    PasswordVerifier as _,
    password_hash::{PasswordHash as Argon2PasswordHash, SaltString},
};
use forum_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// パスワードのハッシュ化と検証を担当するトレイト
pub trait PasswordChecker: Send + Sync {
    /// パスワードを検証する
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;

    /// ランダムなソルトでパスワードをハッシュ化する
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError>;
}

/// Argon2id 実装
///
/// OWASP 推奨パラメータ（RFC 9106）を使用:
/// - Memory: 64 MB
/// - Iterations: 1
/// - Parallelism: 1
pub struct Argon2PasswordChecker {
    argon2: Argon2<'static>,
}

impl Argon2PasswordChecker {
    pub fn new() -> Self {
        let params = Params::new(
            65536, // memory (KB) = 64 MB
            1,     // iterations
            1,     // parallelism
            None,  // output length (default: 32)
        )
        .expect("Argon2 パラメータが不正です");

        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordChecker for Argon2PasswordChecker {
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let parsed = Argon2PasswordHash::new(hash.as_str())
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        let matched = self
            .argon2
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok();

        Ok(PasswordVerifyResult::from(matched))
    }

    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        // ソルトは UUID v4 の 16 バイト（OS の乱数源由来）
        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|e| InfraError::unexpected(format!("ソルトの生成に失敗: {e}")))?;
        let hashed = self
            .argon2
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| InfraError::unexpected(format!("パスワードのハッシュ化に失敗: {e}")))?;

        Ok(PasswordHash::new(hashed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    // password123 を同じパラメータでハッシュ化したもの
    const TEST_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

    #[fixture]
    fn checker() -> Argon2PasswordChecker {
        Argon2PasswordChecker::new()
    }

    #[rstest]
    fn test_正しいパスワードを検証できる(checker: Argon2PasswordChecker) {
        let result = checker
            .verify(&PlainPassword::new("password123"), &PasswordHash::new(TEST_HASH))
            .unwrap();

        assert!(result.is_match());
    }

    #[rstest]
    fn test_誤ったパスワードはmismatch(checker: Argon2PasswordChecker) {
        let result = checker
            .verify(&PlainPassword::new("wrongpassword"), &PasswordHash::new(TEST_HASH))
            .unwrap();

        assert!(result.is_mismatch());
    }

    #[rstest]
    fn test_不正なハッシュ形式はエラー(checker: Argon2PasswordChecker) {
        let result = checker.verify(
            &PlainPassword::new("password123"),
            &PasswordHash::new("not-a-valid-hash"),
        );

        assert!(result.is_err());
    }

    #[rstest]
    fn test_ハッシュ化したパスワードは元の平文でのみ一致する(checker: Argon2PasswordChecker) {
        let password = PlainPassword::new("correct horse");

        let hash = checker.hash(&password).unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(checker.verify(&password, &hash).unwrap().is_match());
        assert!(
            checker
                .verify(&PlainPassword::new("battery staple"), &hash)
                .unwrap()
                .is_mismatch()
        );
    }

    #[rstest]
    fn test_同じパスワードでもソルトが異なる(checker: Argon2PasswordChecker) {
        let password = PlainPassword::new("password123");

        let first = checker.hash(&password).unwrap();
        let second = checker.hash(&password).unwrap();

        assert_ne!(first, second);
    }
}
