use crate::todo::TodoId;
use thiserror::Error;

/// 入力値や不変条件に関するドメインエラー
///
/// いずれもストアへの書き込み前に検出されるため、部分的な更新は発生しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid UserId: {0}")]
    InvalidUserId(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),

    #[error("Invalid UTC offset: {0} minutes")]
    InvalidUtcOffset(i32),
}

/// ライフサイクル操作の失敗
///
/// `Forbidden` と `NotFound` は区別して扱う。削除操作ではどちらも
/// `success: false` に畳み込まれるため、このエラーとしては現れない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error("Todo {0} is owned by another user")]
    Forbidden(TodoId),

    #[error("Store error: {0}")]
    Store(String),
}
