//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "data": T }` を提供する。
//! 投票やベストアンサー選択のように利用者向けの通知文を返す操作では
//! `{ "data": T, "message": "..." }` になる。

use serde::{Deserialize, Serialize};

/// 公開 API の統一レスポンス型
///
/// ## 使用例
///
/// ```
/// use forum_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// assert!(response.message.is_none());
///
/// let response = ApiResponse::with_message(1, "Vote added successfully");
/// assert_eq!(response.message.as_deref(), Some("Vote added successfully"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data:    T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// 通知文付きのレスポンスを作成する
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messageなしはdataのみのjsonになる() {
        let response = ApiResponse::new("hello");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": "hello" }));
    }

    #[test]
    fn test_messageありはdataと並んで出力される() {
        let response = ApiResponse::with_message(
            serde_json::json!({ "votes_count": 1 }),
            "Vote added successfully",
        );
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "data": { "votes_count": 1 },
                "message": "Vote added successfully"
            })
        );
    }

    #[test]
    fn test_messageのないjsonもデシリアライズできる() {
        let response: ApiResponse<Vec<i32>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();

        assert_eq!(response, ApiResponse::new(vec![1, 2]));
    }
}
