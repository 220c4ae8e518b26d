//! # Forum API アプリケーション構築
//!
//! DI（リポジトリ・ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use forum_domain::{authorization::Policy, clock::Clock};
use forum_infra::{
    PasswordChecker,
    db::TransactionManager,
    repository::{
        AccessTokenRepository,
        AnswerRepository,
        QuestionRepository,
        UserRepository,
        VoteRepository,
    },
};
use forum_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        AnswerState,
        AuthState,
        BestAnswerState,
        QuestionState,
        VoteState,
        create_answer,
        create_question,
        delete_answer,
        delete_question,
        health_check,
        list_my_questions,
        list_questions,
        list_questions_by_tag,
        list_questions_by_user,
        login,
        logout,
        mark_best_answer,
        me,
        register,
        show_answer,
        show_question,
        update_answer,
        update_password,
        update_profile,
        update_question,
        vote_answer,
        vote_question,
    },
    middleware::{AuthnState, require_auth},
    usecase::{
        AnswerUseCaseImpl,
        AuthUseCaseImpl,
        BestAnswerUseCaseImpl,
        QuestionUseCaseImpl,
        VoteUseCaseImpl,
    },
};

/// アプリケーションが依存するコンポーネント一式
///
/// 本番では PostgreSQL 実装、テストでは Mock を注入する。
#[derive(Clone)]
pub struct AppDependencies {
    pub user_repo:         Arc<dyn UserRepository>,
    pub access_token_repo: Arc<dyn AccessTokenRepository>,
    pub question_repo:     Arc<dyn QuestionRepository>,
    pub answer_repo:       Arc<dyn AnswerRepository>,
    pub vote_repo:         Arc<dyn VoteRepository>,
    pub password_checker:  Arc<dyn PasswordChecker>,
    pub policy:            Arc<dyn Policy>,
    pub tx_manager:        Arc<dyn TransactionManager>,
    pub clock:             Arc<dyn Clock>,
}

impl AppDependencies {
    pub fn auth_usecase(&self) -> AuthUseCaseImpl {
        AuthUseCaseImpl::new(
            self.user_repo.clone(),
            self.access_token_repo.clone(),
            self.password_checker.clone(),
            self.tx_manager.clone(),
            self.clock.clone(),
        )
    }

    pub fn question_usecase(&self) -> QuestionUseCaseImpl {
        QuestionUseCaseImpl::new(
            self.question_repo.clone(),
            self.answer_repo.clone(),
            self.vote_repo.clone(),
            self.policy.clone(),
            self.tx_manager.clone(),
            self.clock.clone(),
        )
    }

    pub fn answer_usecase(&self) -> AnswerUseCaseImpl {
        AnswerUseCaseImpl::new(
            self.question_repo.clone(),
            self.answer_repo.clone(),
            self.vote_repo.clone(),
            self.policy.clone(),
            self.tx_manager.clone(),
            self.clock.clone(),
        )
    }

    pub fn vote_usecase(&self) -> VoteUseCaseImpl {
        VoteUseCaseImpl::new(
            self.question_repo.clone(),
            self.answer_repo.clone(),
            self.vote_repo.clone(),
            self.tx_manager.clone(),
            self.clock.clone(),
        )
    }

    pub fn best_answer_usecase(&self) -> BestAnswerUseCaseImpl {
        BestAnswerUseCaseImpl::new(
            self.question_repo.clone(),
            self.answer_repo.clone(),
            self.policy.clone(),
            self.tx_manager.clone(),
        )
    }
}

/// DI コンテナの構築とルーター定義を行う
///
/// 認証が必要なルートは `require_auth` ミドルウェアを通し、
/// ハンドラは `Extension<AuthenticatedUser>` で操作者を受け取る。
pub fn build_app(deps: AppDependencies) -> Router {
    let authn_state = AuthnState {
        access_token_repo: deps.access_token_repo.clone(),
    };

    let auth_state = Arc::new(AuthState {
        usecase: deps.auth_usecase(),
    });
    let question_state = Arc::new(QuestionState {
        usecase: deps.question_usecase(),
    });
    let answer_state = Arc::new(AnswerState {
        usecase: deps.answer_usecase(),
    });
    let vote_state = Arc::new(VoteState {
        usecase: deps.vote_usecase(),
    });
    let best_answer_state = Arc::new(BestAnswerState {
        usecase: deps.best_answer_usecase(),
    });

    // 認証不要
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .with_state(auth_state.clone())
        .merge(
            Router::new()
                .route("/api/v1/questions", get(list_questions))
                .route("/api/v1/questions/by-slug/{slug}", get(show_question))
                .route("/api/v1/tags/{tag}/questions", get(list_questions_by_tag))
                .route(
                    "/api/v1/users/{user_id}/questions",
                    get(list_questions_by_user),
                )
                .with_state(question_state.clone()),
        );

    // 認証必須
    let protected_routes = Router::new()
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/me", get(me))
        .route("/api/v1/me/profile", put(update_profile))
        .route("/api/v1/me/password", put(update_password))
        .with_state(auth_state)
        .merge(
            Router::new()
                .route("/api/v1/me/questions", get(list_my_questions))
                .route("/api/v1/questions", post(create_question))
                .route(
                    "/api/v1/questions/{question_id}",
                    put(update_question).delete(delete_question),
                )
                .with_state(question_state),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/questions/{question_id}/answers",
                    post(create_answer),
                )
                .route(
                    "/api/v1/answers/{answer_id}",
                    get(show_answer).put(update_answer).delete(delete_answer),
                )
                .with_state(answer_state),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/questions/{question_id}/vote/{direction}",
                    put(vote_question),
                )
                .route(
                    "/api/v1/answers/{answer_id}/vote/{direction}",
                    put(vote_answer),
                )
                .with_state(vote_state),
        )
        .merge(
            Router::new()
                .route("/api/v1/answers/{answer_id}/best", put(mark_best_answer))
                .with_state(best_answer_state),
        )
        .route_layer(from_fn_with_state(authn_state, require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        // 下に書いたレイヤーほど外側で実行される
        // 1. SetRequestIdLayer: X-Request-Id を受け取るか UUID v7 で生成
        // 2. TraceLayer: request_id 付きのスパンを作成
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
