//! # Forum API エラー定義
//!
//! ユースケース層のエラーと、HTTP レスポンス（RFC 9457 Problem Details）への
//! 変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forum_domain::DomainError;
use forum_shared::ErrorResponse;
use thiserror::Error;

/// Forum API で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 投票方向が `up` / `down` 以外
    #[error("不正な投票方向です: {0}")]
    InvalidVoteDirection(String),

    /// 同じ対象への二重投票
    #[error("既に投票済みです: {0}")]
    DuplicateVote(String),

    /// 認証されていない
    #[error("認証が必要です: {0}")]
    Unauthorized(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 一意制約の競合（スラッグ、メールアドレス）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 形式は正しいが処理できない入力（現在のパスワード不一致）
    #[error("処理できない入力です: {0}")]
    UnprocessableEntity(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] forum_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => CoreError::BadRequest(msg),
            DomainError::NotFound { .. } => CoreError::NotFound(err.to_string()),
            DomainError::Conflict(msg) => CoreError::Conflict(msg),
            DomainError::Forbidden(msg) => CoreError::Forbidden(msg),
        }
    }
}

impl CoreError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg),
            CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg),
            CoreError::InvalidVoteDirection(msg) => {
                ErrorResponse::new("invalid-vote-direction", "Invalid Vote Direction", 400, msg)
            }
            CoreError::DuplicateVote(msg) => {
                ErrorResponse::new("duplicate-vote", "Duplicate Vote", 400, msg)
            }
            CoreError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
            CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg),
            CoreError::UnprocessableEntity(msg) => ErrorResponse::unprocessable_entity(msg),
            CoreError::Database(e) => {
                tracing::error!(
                    error = %e,
                    span_trace = %e.span_trace(),
                    "データベースエラー"
                );
                ErrorResponse::internal_error()
            }
            CoreError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(body)).into_response()
    }
}
