//! # ベストアンサーハンドラ
//!
//! ```text
//! PUT /api/v1/answers/{answer_id}/best
//! ```
//!
//! 既にベストアンサーの回答を再度選んだ場合もエラーにはせず、
//! 200 とその旨のメッセージを返す。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use forum_domain::answer::AnswerId;
use forum_shared::ApiResponse;
use uuid::Uuid;

use super::question::QuestionDto;
use crate::{error::CoreError, middleware::AuthenticatedUser, usecase::BestAnswerUseCaseImpl};

/// ベストアンサー API の共有状態
pub struct BestAnswerState {
    pub usecase: BestAnswerUseCaseImpl,
}

/// PUT /api/v1/answers/{answer_id}/best
///
/// ## レスポンス
///
/// - `200 OK`: 回答付きの質問
/// - `403 Forbidden`: 質問の作成者ではない
/// - `404 Not Found`: 回答が存在しない
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %answer_id))]
pub async fn mark_best_answer(
    State(state): State<Arc<BestAnswerState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let outcome = state
        .usecase
        .mark_best(&user.user_id, &AnswerId::from_uuid(answer_id))
        .await?;

    let message = if outcome.already_best {
        "This answer is already marked as best"
    } else {
        "Answer marked as best"
    };
    let response = ApiResponse::with_message(QuestionDto::from(&outcome.question), message);
    Ok((StatusCode::OK, Json(response)))
}
