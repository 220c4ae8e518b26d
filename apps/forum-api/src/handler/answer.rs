//! # 回答ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/questions/{question_id}/answers` - 回答を投稿
//! - `GET /api/v1/answers/{answer_id}` - 回答と親の質問
//! - `PUT /api/v1/answers/{answer_id}` - 回答を編集（作成者のみ）
//! - `DELETE /api/v1/answers/{answer_id}` - 回答を削除（作成者のみ）
//!
//! 投稿・編集・削除は、変更後の回答付き質問を返す。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use forum_domain::{answer::AnswerId, question::QuestionId};
use forum_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::{AnswerDto, QuestionDto};
use crate::{
    error::CoreError,
    middleware::AuthenticatedUser,
    usecase::{AnswerUseCaseImpl, QuestionWithAnswers},
};

/// 回答 API の共有状態
pub struct AnswerState {
    pub usecase: AnswerUseCaseImpl,
}

/// 回答投稿・編集リクエスト
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub body: String,
}

/// 回答詳細レスポンス
#[derive(Debug, Serialize)]
pub struct AnswerDetailDto {
    pub answer:   AnswerDto,
    pub question: QuestionSummaryDto,
}

/// 回答詳細に添える質問の要約
#[derive(Debug, Serialize)]
pub struct QuestionSummaryDto {
    pub id:    Uuid,
    pub title: String,
    pub slug:  String,
}

/// GET /api/v1/answers/{answer_id}
pub async fn show_answer(
    State(state): State<Arc<AnswerState>>,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let found = state.usecase.show(&AnswerId::from_uuid(answer_id)).await?;

    let response = ApiResponse::new(AnswerDetailDto {
        answer:   AnswerDto::from(&found.answer),
        question: QuestionSummaryDto {
            id:    *found.question.id().as_uuid(),
            title: found.question.title().as_str().to_string(),
            slug:  found.question.slug().as_str().to_string(),
        },
    });
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/questions/{question_id}/answers
///
/// ## レスポンス
///
/// - `201 Created`: 回答付きの質問
/// - `400 Bad Request`: 本文が不正
/// - `404 Not Found`: 質問が存在しない
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %question_id))]
pub async fn create_answer(
    State(state): State<Arc<AnswerState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(question_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let question = state
        .usecase
        .create(&user.user_id, &QuestionId::from_uuid(question_id), req.body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(answered(&question, "Answer created successfully")),
    ))
}

/// PUT /api/v1/answers/{answer_id}
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %answer_id))]
pub async fn update_answer(
    State(state): State<Arc<AnswerState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(answer_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let question = state
        .usecase
        .update(&user.user_id, &AnswerId::from_uuid(answer_id), req.body)
        .await?;

    Ok((
        StatusCode::OK,
        Json(answered(&question, "Answer updated successfully")),
    ))
}

/// DELETE /api/v1/answers/{answer_id}
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %answer_id))]
pub async fn delete_answer(
    State(state): State<Arc<AnswerState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(answer_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let question = state
        .usecase
        .delete(&user.user_id, &AnswerId::from_uuid(answer_id))
        .await?;

    Ok((
        StatusCode::OK,
        Json(answered(&question, "Answer deleted successfully")),
    ))
}

fn answered(question: &QuestionWithAnswers, message: &str) -> ApiResponse<QuestionDto> {
    ApiResponse::with_message(QuestionDto::from(question), message)
}
