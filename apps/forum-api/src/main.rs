//! # Forum API サーバー
//!
//! Q&A フォーラムの REST API を提供する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `FORUM_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `FORUM_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `RUN_MIGRATIONS` | No | 起動時にマイグレーションを適用するか（デフォルト: `true`） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト: `pretty`） |
//! | `RUST_LOG` | No | ログフィルタ（デフォルト: `info,forum=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! FORUM_PORT=3000 DATABASE_URL=postgres://... cargo run -p forum-api
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use forum_api::{
    app_builder::{AppDependencies, build_app},
    config::ForumConfig,
};
use forum_domain::{authorization::OwnershipPolicy, clock::SystemClock};
use forum_infra::{
    Argon2PasswordChecker,
    db::{self, PgTransactionManager},
    repository::{
        PostgresAccessTokenRepository,
        PostgresAnswerRepository,
        PostgresQuestionRepository,
        PostgresUserRepository,
        PostgresVoteRepository,
    },
};
use forum_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("forum-api"));

    let config = ForumConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Forum API サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("マイグレーションの適用に失敗しました")?;
        tracing::info!("マイグレーションを適用しました");
    }

    let deps = AppDependencies {
        user_repo:         Arc::new(PostgresUserRepository::new(pool.clone())),
        access_token_repo: Arc::new(PostgresAccessTokenRepository::new(pool.clone())),
        question_repo:     Arc::new(PostgresQuestionRepository::new(pool.clone())),
        answer_repo:       Arc::new(PostgresAnswerRepository::new(pool.clone())),
        vote_repo:         Arc::new(PostgresVoteRepository::new(pool.clone())),
        password_checker:  Arc::new(Argon2PasswordChecker::new()),
        policy:            Arc::new(OwnershipPolicy),
        tx_manager:        Arc::new(PgTransactionManager::new(pool)),
        clock:             Arc::new(SystemClock),
    };
    let app = build_app(deps);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("Forum API サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーが異常終了しました")?;

    Ok(())
}

/// Ctrl+C を受け取ったら処理中のリクエストを終えてから停止する
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルハンドラの登録に失敗しました");
        std::future::pending::<()>().await;
    }
    tracing::info!("シャットダウンを開始します");
}
