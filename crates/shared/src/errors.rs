use domain::{DomainError, TodoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP 境界で扱うエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // 認証・認可エラー
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ビジネスロジックエラー
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    // システムエラー
    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// クライアントエラー（4xx相当）
    Client,
    /// サーバーエラー（5xx相当）
    Server,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Store(_) | AppError::Internal(_) => ErrorCategory::Server,
            _ => ErrorCategory::Client,
        }
    }

    /// HTTPステータスコードを取得
    ///
    /// 他人の Todo への操作と存在しない Todo への操作は 422 にそろえる。
    /// 未認証は呼び出し側でログイン画面へのリダイレクトに変換される。
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Unauthenticated => 401,
            AppError::Forbidden(_) | AppError::NotFound(_) | AppError::Validation(_) => 422,
            AppError::BadRequest(_) => 400,
            AppError::Store(_) | AppError::Internal(_) => 500,
        }
    }

    /// ユーザー向けメッセージを取得
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "ログインが必要です".to_string(),
            AppError::Forbidden(_) => "この Todo を変更する権限がありません".to_string(),
            AppError::NotFound(_) => "Todo が見つかりません".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(_) => "リクエストの形式が正しくありません".to_string(),
            _ => "予期しないエラーが発生しました".to_string(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<TodoError> for AppError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::Validation(inner) => inner.into(),
            TodoError::NotFound(id) => AppError::NotFound(id.to_string()),
            TodoError::Forbidden(id) => AppError::Forbidden(id.to_string()),
            TodoError::Store(msg) => AppError::Store(msg),
        }
    }
}

/// 標準化されたエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// 詳細情報（開発環境のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub request_id: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError, request_id: String, include_details: bool) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.user_message(),
            details: include_details.then(|| error.to_string()),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
