//! # 認証・アカウントハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/auth/register` - ユーザー登録
//! - `POST /api/v1/auth/login` - ログイン（アクセストークンを発行）
//! - `POST /api/v1/auth/logout` - ログアウト（提示したトークンを失効）
//! - `GET /api/v1/me` - 自分のプロフィール
//! - `PUT /api/v1/me/profile` - 名前・メールアドレスの変更
//! - `PUT /api/v1/me/password` - パスワード変更

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use forum_domain::user::User;
use forum_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::CoreError,
    middleware::AuthenticatedUser,
    usecase::{AuthUseCaseImpl, RegisterInput, UpdatePasswordInput, UpdateProfileInput},
};

/// 認証 API の共有状態
pub struct AuthState {
    pub usecase: AuthUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー登録リクエスト
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name:     String,
    pub email:    String,
    pub password: String,
}

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email:    String,
    pub password: String,
}

/// プロフィール変更リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name:  String,
    pub email: String,
}

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password:     String,
}

/// ユーザー情報レスポンス（パスワードハッシュは含めない）
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id:         Uuid,
    pub name:       String,
    pub email:      String,
    pub created_at: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id:         *user.id().as_uuid(),
            name:       user.name().as_str().to_string(),
            email:      user.email().as_str().to_string(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponseDto {
    pub token: String,
    pub user:  UserDto,
}

// --- ハンドラ ---

/// POST /api/v1/auth/register
///
/// ## レスポンス
///
/// - `201 Created`: 登録されたユーザー
/// - `400 Bad Request`: 入力値が不正
/// - `409 Conflict`: メールアドレスが登録済み
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state
        .usecase
        .register(RegisterInput {
            name:     req.name,
            email:    req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(UserDto::from(&user)))))
}

/// POST /api/v1/auth/login
///
/// ## レスポンス
///
/// - `200 OK`: アクセストークンとユーザー
/// - `401 Unauthorized`: メールアドレスまたはパスワードが違う
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let output = state.usecase.login(&req.email, &req.password).await?;

    let response = ApiResponse::new(LoginResponseDto {
        token: output.token.token().as_str().to_string(),
        user:  UserDto::from(&output.user),
    });
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/auth/logout
///
/// 提示されたトークンのみ失効させる。他の端末のトークンは有効なまま。
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn logout(
    State(state): State<Arc<AuthState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, CoreError> {
    state.usecase.logout(&user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me
pub async fn me(
    State(state): State<Arc<AuthState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state.usecase.me(&user.user_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(&user)))))
}

/// PUT /api/v1/me/profile
///
/// ## レスポンス
///
/// - `200 OK`: 変更後のユーザー
/// - `409 Conflict`: メールアドレスが他のユーザーに使われている
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn update_profile(
    State(state): State<Arc<AuthState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let updated = state
        .usecase
        .update_profile(
            &user.user_id,
            UpdateProfileInput {
                name:  req.name,
                email: req.email,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(&updated)))))
}

/// PUT /api/v1/me/password
///
/// ## レスポンス
///
/// - `204 No Content`: 変更完了
/// - `400 Bad Request`: 新しいパスワードが要件を満たさない
/// - `422 Unprocessable Entity`: 現在のパスワードが違う
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn update_password(
    State(state): State<Arc<AuthState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .update_password(
            &user.user_id,
            UpdatePasswordInput {
                current_password: req.current_password,
                new_password:     req.new_password,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
