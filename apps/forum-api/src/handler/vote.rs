//! # 投票ハンドラ
//!
//! ## エンドポイント
//!
//! - `PUT /api/v1/questions/{question_id}/vote/{direction}` - 質問に投票
//! - `PUT /api/v1/answers/{answer_id}/vote/{direction}` - 回答に投票
//!
//! `direction` は `up` または `down`。それ以外は 400 を返す。
//! 同じ対象への 2 回目の投票は方向に関係なく 400 を返す。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use forum_domain::{answer::AnswerId, question::QuestionId, vote::Votable};
use forum_shared::ApiResponse;
use serde::Serialize;
use uuid::Uuid;

use super::question::QuestionDto;
use crate::{
    error::CoreError,
    middleware::AuthenticatedUser,
    usecase::{CastVoteInput, VoteUseCaseImpl},
};

/// 投票 API の共有状態
pub struct VoteState {
    pub usecase: VoteUseCaseImpl,
}

/// 投票結果レスポンス
#[derive(Debug, Serialize)]
pub struct VoteResultDto {
    pub question:    QuestionDto,
    /// 投票対象の更新後スコア
    pub score:       i64,
    /// 投票台帳から数えた純投票数（up - down）
    pub votes_count: i64,
}

/// PUT /api/v1/questions/{question_id}/vote/{direction}
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %question_id, %direction))]
pub async fn vote_question(
    State(state): State<Arc<VoteState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((question_id, direction)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, CoreError> {
    let votable = Votable::Question(QuestionId::from_uuid(question_id));
    cast(&state, &user, votable, direction).await
}

/// PUT /api/v1/answers/{answer_id}/vote/{direction}
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %answer_id, %direction))]
pub async fn vote_answer(
    State(state): State<Arc<VoteState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((answer_id, direction)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, CoreError> {
    let votable = Votable::Answer(AnswerId::from_uuid(answer_id));
    cast(&state, &user, votable, direction).await
}

async fn cast(
    state: &VoteState,
    user: &AuthenticatedUser,
    votable: Votable,
    direction: String,
) -> Result<(StatusCode, Json<ApiResponse<VoteResultDto>>), CoreError> {
    let outcome = state
        .usecase
        .cast_vote(&user.user_id, CastVoteInput { votable, direction })
        .await?;

    let response = ApiResponse::with_message(
        VoteResultDto {
            question:    QuestionDto::from(&outcome.question),
            score:       outcome.score,
            votes_count: outcome.votes_count,
        },
        "Vote added successfully",
    );
    Ok((StatusCode::OK, Json(response)))
}
