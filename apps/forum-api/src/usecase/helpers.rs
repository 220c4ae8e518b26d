//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換や認可チェックなど、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use forum_domain::{
    authorization::{Action, Policy, Resource},
    user::UserId,
};
use forum_infra::InfraError;

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// ```ignore
/// let question = self.question_repo.find_by_id(&id).await.or_not_found("質問")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Database` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self?.ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}

/// 認可ポリシーに問い合わせ、許可されなければ `CoreError::Forbidden` を返す
pub(crate) fn ensure_allowed(
    policy: &dyn Policy,
    user_id: &UserId,
    action: Action,
    resource: Resource<'_>,
) -> Result<(), CoreError> {
    if policy.can(user_id, action, resource) {
        return Ok(());
    }

    tracing::info!(user_id = %user_id, action = %action, "認可されませんでした");
    let target = match resource {
        Resource::Question(_) => "質問",
        Resource::Answer { .. } => "回答",
    };
    let verb = match action {
        Action::Update => "更新",
        Action::Delete => "削除",
        Action::MarkAsBest => "ベストアンサーに選択",
    };
    Err(CoreError::Forbidden(format!(
        "この{}を{}する権限がありません",
        target, verb
    )))
}
