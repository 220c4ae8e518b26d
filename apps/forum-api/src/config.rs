//! # Forum API 設定
//!
//! 環境変数から Forum API サーバーの設定を読み込む。

use std::env;

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Forum API サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumConfig {
    /// バインドアドレス
    pub host:           String,
    /// ポート番号
    pub port:           u16,
    /// データベース接続 URL
    pub database_url:   String,
    /// 起動時にマイグレーションを実行するか
    pub run_migrations: bool,
}

impl ForumConfig {
    /// 環境変数から設定を読み込む
    ///
    /// | 変数名 | 必須 | デフォルト |
    /// |--------|------|-----------|
    /// | `FORUM_HOST` | No | `0.0.0.0` |
    /// | `FORUM_PORT` | **Yes** | |
    /// | `DATABASE_URL` | **Yes** | |
    /// | `RUN_MIGRATIONS` | No | `true` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("FORUM_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port_raw = lookup("FORUM_PORT").ok_or(ConfigError::Missing("FORUM_PORT"))?;
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name:  "FORUM_PORT",
            value: port_raw.clone(),
        })?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            None => true,
            Some(value) => match value.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "RUN_MIGRATIONS",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            host,
            port,
            database_url,
            run_migrations,
        })
    }
}
