//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` ヘッダーのアクセストークンを検証し、
//! 操作者を [`AuthenticatedUser`] としてリクエストの Extension に格納する。
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let authn_state = AuthnState {
//!     access_token_repo: access_token_repo.clone(),
//! };
//!
//! Router::new()
//!     .route("/api/v1/me", get(me))
//!     .route_layer(from_fn_with_state(authn_state, require_auth))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use forum_domain::{access_token::AccessTokenValue, user::UserId};
use forum_infra::repository::AccessTokenRepository;

use crate::error::CoreError;

/// 認証済みの操作者
///
/// ハンドラは `Extension<AuthenticatedUser>` で受け取り、
/// `user_id` をユースケースに明示的に渡す。
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// 提示されたトークン（ログアウト時に失効させる）
    pub token:   AccessTokenValue,
}

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthnState {
    pub access_token_repo: Arc<dyn AccessTokenRepository>,
}

/// 認証ミドルウェア
///
/// トークンが無い・失効している場合は 401 Unauthorized を返す。
pub async fn require_auth(
    State(state): State<AuthnState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return CoreError::Unauthorized("認証トークンがありません".to_string()).into_response();
    };
    let token = AccessTokenValue::from_string(token);

    let issued = match state.access_token_repo.find(&token).await {
        Ok(Some(issued)) => issued,
        Ok(None) => {
            return CoreError::Unauthorized("認証トークンが無効です".to_string()).into_response();
        }
        Err(e) => return CoreError::Database(e).into_response(),
    };

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: issued.user_id().clone(),
        token,
    });

    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        Router,
        http::{Method, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::Utc;
    use forum_domain::access_token::AccessToken;
    use forum_infra::mock::MockAccessTokenRepository;
    use tower::ServiceExt;

    use super::*;

    /// 操作者の ID をそのまま返すダミーハンドラ
    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        user.user_id.to_string()
    }

    fn app(repo: MockAccessTokenRepository) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(
                AuthnState {
                    access_token_repo: Arc::new(repo),
                },
                require_auth,
            ))
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_有効なトークンで操作者がextensionに入る() {
        let repo = MockAccessTokenRepository::new();
        let user_id = UserId::new();
        let token = AccessToken::issue(user_id.clone(), Utc::now());
        repo.add_token(token.clone());

        let response = app(repo)
            .oneshot(request(Some(&format!("Bearer {}", token.token().as_str()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_ヘッダーなしは401() {
        let response = app(MockAccessTokenRepository::new())
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_未発行のトークンは401() {
        let response = app(MockAccessTokenRepository::new())
            .oneshot(request(Some("Bearer not-issued")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer_token_bearer以外のスキームは無視する() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_extract_bearer_token_空のトークンはnone() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer   ".parse().unwrap());

        assert_eq!(extract_bearer_token(&headers), None);
    }
}
