//! # 質問ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/questions` - 新着順の質問一覧
//! - `GET /api/v1/questions/by-slug/{slug}` - 質問詳細（閲覧数を加算）
//! - `GET /api/v1/tags/{tag}/questions` - タグ別の質問一覧
//! - `GET /api/v1/users/{user_id}/questions` - ユーザー別の質問一覧
//! - `GET /api/v1/me/questions` - 自分の質問一覧（認証必須）
//! - `POST /api/v1/questions` - 質問を投稿（認証必須）
//! - `PUT /api/v1/questions/{question_id}` - 質問を編集（作成者のみ）
//! - `DELETE /api/v1/questions/{question_id}` - 質問を削除（作成者のみ）
//!
//! 回答・投票・ベストアンサーのハンドラも、ここで定義する
//! [`QuestionDto`] で回答付きの質問を返す。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use forum_domain::{answer::Answer, question::QuestionId, user::UserId};
use forum_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::CoreError,
    middleware::AuthenticatedUser,
    usecase::{CreateQuestionInput, QuestionUseCaseImpl, QuestionWithAnswers, UpdateQuestionInput},
};

/// 質問 API の共有状態
pub struct QuestionState {
    pub usecase: QuestionUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 回答 DTO
#[derive(Debug, Serialize)]
pub struct AnswerDto {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub score: i64,
    pub best_answer: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Answer> for AnswerDto {
    fn from(answer: &Answer) -> Self {
        Self {
            id: *answer.id().as_uuid(),
            question_id: *answer.question_id().as_uuid(),
            user_id: *answer.user_id().as_uuid(),
            body: answer.body().as_str().to_string(),
            score: answer.score(),
            best_answer: answer.is_best_answer(),
            created_at: answer.created_at().to_rfc3339(),
            updated_at: answer.updated_at().to_rfc3339(),
        }
    }
}

/// 回答付きの質問 DTO
#[derive(Debug, Serialize)]
pub struct QuestionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub score: i64,
    pub best_answer_id: Option<Uuid>,
    pub answers: Vec<AnswerDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&QuestionWithAnswers> for QuestionDto {
    fn from(aggregate: &QuestionWithAnswers) -> Self {
        let question = &aggregate.question;
        Self {
            id: *question.id().as_uuid(),
            user_id: *question.user_id().as_uuid(),
            title: question.title().as_str().to_string(),
            slug: question.slug().as_str().to_string(),
            body: question.body().as_str().to_string(),
            tags: question.tags().as_slice().to_vec(),
            view_count: question.view_count(),
            score: question.score(),
            best_answer_id: aggregate.best_answer().map(|a| *a.id().as_uuid()),
            answers: aggregate.answers.iter().map(AnswerDto::from).collect(),
            created_at: question.created_at().to_rfc3339(),
            updated_at: question.updated_at().to_rfc3339(),
        }
    }
}

/// 質問投稿・編集リクエスト
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub title: String,
    pub body:  String,
    /// カンマ区切りのタグ
    #[serde(default)]
    pub tags:  Option<String>,
}

fn to_dtos(questions: &[QuestionWithAnswers]) -> Vec<QuestionDto> {
    questions.iter().map(QuestionDto::from).collect()
}

// --- ハンドラ ---

/// GET /api/v1/questions
///
/// 新着順の質問一覧を回答付きで返す。
pub async fn list_questions(
    State(state): State<Arc<QuestionState>>,
) -> Result<impl IntoResponse, CoreError> {
    let questions = state.usecase.list_latest().await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(to_dtos(&questions)))))
}

/// GET /api/v1/tags/{tag}/questions
///
/// タグは大文字小文字を区別しない。
pub async fn list_questions_by_tag(
    State(state): State<Arc<QuestionState>>,
    Path(tag): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let questions = state.usecase.list_by_tag(&tag).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(to_dtos(&questions)))))
}

/// GET /api/v1/users/{user_id}/questions
pub async fn list_questions_by_user(
    State(state): State<Arc<QuestionState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let questions = state
        .usecase
        .list_by_user(&UserId::from_uuid(user_id))
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(to_dtos(&questions)))))
}

/// GET /api/v1/me/questions
pub async fn list_my_questions(
    State(state): State<Arc<QuestionState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, CoreError> {
    let questions = state.usecase.list_by_user(&user.user_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(to_dtos(&questions)))))
}

/// GET /api/v1/questions/by-slug/{slug}
///
/// ## レスポンス
///
/// - `200 OK`: 回答付きの質問（閲覧数は加算後の値）
/// - `404 Not Found`: 質問が存在しない
pub async fn show_question(
    State(state): State<Arc<QuestionState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let question = state.usecase.show(&slug).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(QuestionDto::from(&question))),
    ))
}

/// POST /api/v1/questions
///
/// ## レスポンス
///
/// - `201 Created`: 作成された質問
/// - `400 Bad Request`: タイトル・本文・タグが不正
/// - `409 Conflict`: 同じスラッグの質問が存在する
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn create_question(
    State(state): State<Arc<QuestionState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<QuestionRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let input = CreateQuestionInput {
        title: req.title,
        body:  req.body,
        tags:  req.tags,
    };
    let question = state.usecase.create(&user.user_id, input).await?;

    let response =
        ApiResponse::with_message(QuestionDto::from(&question), "Question created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/v1/questions/{question_id}
///
/// ## レスポンス
///
/// - `200 OK`: 編集後の質問
/// - `403 Forbidden`: 作成者ではない
/// - `404 Not Found`: 質問が存在しない
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %question_id))]
pub async fn update_question(
    State(state): State<Arc<QuestionState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(question_id): Path<Uuid>,
    Json(req): Json<QuestionRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let input = UpdateQuestionInput {
        title: req.title,
        body:  req.body,
        tags:  req.tags,
    };
    let question = state
        .usecase
        .update(&user.user_id, &QuestionId::from_uuid(question_id), input)
        .await?;

    let response =
        ApiResponse::with_message(QuestionDto::from(&question), "Question updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/v1/questions/{question_id}
///
/// 回答と投票もまとめて削除する。
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, %question_id))]
pub async fn delete_question(
    State(state): State<Arc<QuestionState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .delete(&user.user_id, &QuestionId::from_uuid(question_id))
        .await?;

    let response = ApiResponse::with_message((), "Question deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use forum_domain::user::UserId;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::ForumTestBuilder;

    #[test]
    fn test_question_dtoはベストアンサーのidを含む() {
        let builder = ForumTestBuilder::new();
        let question = builder.build_question(&UserId::new(), "How do lifetimes work?");
        let plain = builder.build_answer(&question, &UserId::new(), "Read the book");
        let aggregate = QuestionWithAnswers {
            question: question.clone(),
            answers:  vec![plain.clone()],
        };

        let dto = QuestionDto::from(&aggregate);

        assert_eq!(dto.slug, "how-do-lifetimes-work");
        assert_eq!(dto.best_answer_id, None);
        assert_eq!(dto.answers.len(), 1);
        assert_eq!(dto.answers[0].id, *plain.id().as_uuid());
        assert!(!dto.answers[0].best_answer);
    }

    #[test]
    fn test_question_requestのタグは省略できる() {
        let req: QuestionRequest =
            serde_json::from_str(r#"{"title": "Title", "body": "Body"}"#).unwrap();

        assert_eq!(req.tags, None);
    }
}
