//! HTTP API のテスト
//!
//! `build_app` で組み立てたルーターに Mock 依存を注入し、
//! `tower::ServiceExt::oneshot` でリクエストを送る。

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use forum_api::{app_builder::build_app, test_utils::ForumTestBuilder};
use http::Response;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let setup = ForumTestBuilder::new().build();
        Self {
            router: build_app(setup.deps),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, read_json(response).await)
    }

    /// ユーザー登録とログインを行い、アクセストークンを返す
    async fn sign_up(&self, name: &str) -> String {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, _) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({"name": name, "email": email, "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn post_question(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/questions",
                Some(token),
                Some(json!({"title": title, "body": "details", "tags": "rust, async"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[tokio::test]
async fn test_ヘルスチェックは認証なしで200() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_レスポンスにx_request_idが付与される() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "client-supplied-id")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "client-supplied-id"
    );
}

#[tokio::test]
async fn test_トークンなしの質問投稿は401() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/questions",
            None,
            Some(json!({"title": "t", "body": "b"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_質問一覧は認証なしで取得できる() {
    let app = TestApp::new();
    let token = app.sign_up("Alice").await;
    app.post_question(&token, "How do I borrow mutably twice?").await;

    let (status, body) = app.send(Method::GET, "/api/v1/questions", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["slug"], "how-do-i-borrow-mutably-twice");
    assert_eq!(body["data"][0]["tags"], json!(["rust", "async"]));
}

#[tokio::test]
async fn test_投票のレスポンスにメッセージと純投票数が含まれる() {
    let app = TestApp::new();
    let author = app.sign_up("Alice").await;
    let voter = app.sign_up("Bob").await;
    let question = app.post_question(&author, "What is Pin?").await;
    let uri = format!("/api/v1/questions/{}/vote/up", question["id"].as_str().unwrap());

    let (status, body) = app.send(Method::PUT, &uri, Some(&voter), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vote added successfully");
    assert_eq!(body["data"]["votes_count"], 1);
    assert_eq!(body["data"]["question"]["score"], 1);

    let (status, body) = app.send(Method::PUT, &uri, Some(&voter), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["type"],
        "https://forum.example.com/errors/duplicate-vote"
    );
}

#[tokio::test]
async fn test_不正な投票方向は400() {
    let app = TestApp::new();
    let token = app.sign_up("Alice").await;
    let question = app.post_question(&token, "Sideways?").await;
    let uri = format!(
        "/api/v1/questions/{}/vote/sideways",
        question["id"].as_str().unwrap()
    );

    let (status, body) = app.send(Method::PUT, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["type"],
        "https://forum.example.com/errors/invalid-vote-direction"
    );
}

#[tokio::test]
async fn test_ベストアンサー選択は作成者なら200で他人なら403() {
    let app = TestApp::new();
    let owner = app.sign_up("Alice").await;
    let answerer = app.sign_up("Bob").await;
    let question = app.post_question(&owner, "Best crate for CLIs?").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/questions/{}/answers", question["id"].as_str().unwrap()),
            Some(&answerer),
            Some(json!({"body": "clap"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let answer_id = body["data"]["answers"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/answers/{answer_id}/best");

    let (status, _) = app.send(Method::PUT, &uri, Some(&answerer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::PUT, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Answer marked as best");
    assert_eq!(body["data"]["best_answer_id"], answer_id.as_str());

    let (status, body) = app.send(Method::PUT, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This answer is already marked as best");
}

#[tokio::test]
async fn test_ログアウト後のトークンは401() {
    let app = TestApp::new();
    let token = app.sign_up("Alice").await;

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_存在しないスラッグは404() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::GET, "/api/v1/questions/by-slug/nothing-here", None, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_パスワード変更で現在のパスワードが違うと422() {
    let app = TestApp::new();
    let token = app.sign_up("Alice").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/me/password",
            Some(&token),
            Some(json!({"current_password": "wrong-password", "new_password": "newpassword1"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
