//! # 認証ユースケース
//!
//! ユーザー登録・ログイン・ログアウトと、ログイン中ユーザーの
//! プロフィール／パスワード更新を扱う。
//!
//! ## タイミング攻撃対策
//!
//! ログイン時にユーザーが存在しない場合もダミーハッシュで検証を実行し、
//! 処理時間を均一化する。

use std::sync::Arc;

use forum_domain::{
    access_token::{AccessToken, AccessTokenValue},
    clock::Clock,
    password::{PasswordHash, PlainPassword},
    user::{Email, NewUser, User, UserId, UserName},
};
use forum_infra::{
    PasswordChecker,
    db::TransactionManager,
    repository::{AccessTokenRepository, UserRepository},
};

use crate::{error::CoreError, usecase::helpers::FindResultExt};

/// ダミーハッシュ（有効な Argon2id 形式）
const DUMMY_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// ログイン失敗時のメッセージ（メールアドレスの存在有無を区別しない）
const INVALID_CREDENTIALS: &str = "メールアドレスまたはパスワードが正しくありません";

/// ユーザー登録の入力
pub struct RegisterInput {
    pub name:     String,
    pub email:    String,
    pub password: String,
}

/// プロフィール更新の入力
pub struct UpdateProfileInput {
    pub name:  String,
    pub email: String,
}

/// パスワード変更の入力
pub struct UpdatePasswordInput {
    pub current_password: String,
    pub new_password:     String,
}

/// ログイン結果
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub user:  User,
    pub token: AccessToken,
}

/// 認証ユースケースの実装
pub struct AuthUseCaseImpl {
    user_repo:         Arc<dyn UserRepository>,
    access_token_repo: Arc<dyn AccessTokenRepository>,
    password_checker:  Arc<dyn PasswordChecker>,
    tx_manager:        Arc<dyn TransactionManager>,
    clock:             Arc<dyn Clock>,
}

impl AuthUseCaseImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        access_token_repo: Arc<dyn AccessTokenRepository>,
        password_checker: Arc<dyn PasswordChecker>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            access_token_repo,
            password_checker,
            tx_manager,
            clock,
        }
    }

    /// ユーザーを登録する
    ///
    /// 1. 表示名・メールアドレス・パスワード（6〜255 文字）を検証
    /// 2. パスワードを Argon2id でハッシュ化
    /// 3. 挿入（メールアドレス重複は DB 制約で `Conflict`）
    pub async fn register(&self, input: RegisterInput) -> Result<User, CoreError> {
        let name = UserName::new(input.name)?;
        let email = Email::new(input.email)?;
        let password = PlainPassword::new_for_registration(input.password)?;

        let password_hash = self.password_checker.hash(&password)?;
        let user = User::new(NewUser {
            id: UserId::new(),
            name,
            email,
            password_hash,
            now: self.clock.now(),
        });

        let mut tx = self.tx_manager.begin().await?;
        self.user_repo
            .insert(&mut tx, &user)
            .await
            .map_err(|e| email_conflict_or(e, user.email()))?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id(), "ユーザーを登録しました");
        Ok(user)
    }

    /// メールアドレスとパスワードで認証し、アクセストークンを発行する
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, CoreError> {
        let password = PlainPassword::new(password);

        let user = match Email::new(email) {
            Ok(email) => self.user_repo.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            self.dummy_verification(&password);
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let verified = self.password_checker.verify(&password, user.password_hash())?;
        if verified.is_mismatch() {
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = AccessToken::issue(user.id().clone(), self.clock.now());
        let mut tx = self.tx_manager.begin().await?;
        self.access_token_repo.insert(&mut tx, &token).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id(), "ログインしました");
        Ok(LoginOutput { user, token })
    }

    /// 提示されたアクセストークンを失効させる
    pub async fn logout(&self, token: &AccessTokenValue) -> Result<(), CoreError> {
        let mut tx = self.tx_manager.begin().await?;
        self.access_token_repo.delete(&mut tx, token).await?;
        tx.commit().await?;
        Ok(())
    }

    /// ログイン中のユーザーを取得する
    pub async fn me(&self, user_id: &UserId) -> Result<User, CoreError> {
        self.user_repo.find_by_id(user_id).await.or_not_found("ユーザー")
    }

    /// 表示名とメールアドレスを更新する
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        input: UpdateProfileInput,
    ) -> Result<User, CoreError> {
        let name = UserName::new(input.name)?;
        let email = Email::new(input.email)?;

        let user = self.me(user_id).await?;
        let user = user.with_profile(name, email, self.clock.now());

        let mut tx = self.tx_manager.begin().await?;
        self.user_repo
            .update(&mut tx, &user)
            .await
            .map_err(|e| email_conflict_or(e, user.email()))?;
        tx.commit().await?;

        Ok(user)
    }

    /// パスワードを変更する
    ///
    /// 現在のパスワードが一致しない場合は `UnprocessableEntity`。
    pub async fn update_password(
        &self,
        user_id: &UserId,
        input: UpdatePasswordInput,
    ) -> Result<(), CoreError> {
        let new_password = PlainPassword::new_for_registration(input.new_password)?;
        let user = self.me(user_id).await?;

        let verified = self
            .password_checker
            .verify(&PlainPassword::new(input.current_password), user.password_hash())?;
        if verified.is_mismatch() {
            return Err(CoreError::UnprocessableEntity(
                "現在のパスワードが正しくありません".to_string(),
            ));
        }

        let password_hash = self.password_checker.hash(&new_password)?;
        let user = user.with_password_hash(password_hash, self.clock.now());

        let mut tx = self.tx_manager.begin().await?;
        self.user_repo.update(&mut tx, &user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id(), "パスワードを変更しました");
        Ok(())
    }

    fn dummy_verification(&self, password: &PlainPassword) {
        // 結果は無視（エラーでも問題ない）
        let _ = self
            .password_checker
            .verify(password, &PasswordHash::new(DUMMY_HASH));
    }
}

fn email_conflict_or(err: forum_infra::InfraError, email: &Email) -> CoreError {
    if err.is_conflict() {
        CoreError::Conflict(format!("メールアドレス {} は既に使用されています", email))
    } else {
        CoreError::Database(err)
    }
}
